//! Connection helpers shared by the live tests.
//!
//! Every helper returns `None` unless `DATABASE_URL` is set (a `.env` file is honored).

pub async fn connect() -> Option<tokio_postgres::Client> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let (client, connection) = tokio_postgres::connect(&database_url, tokio_postgres::NoTls)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });
    Some(client)
}

/// Recreate `schema`, point the session at it and run `ddl` there.
pub async fn connect_to_fresh_schema(schema: &str, ddl: &str) -> Option<tokio_postgres::Client> {
    let client = connect().await?;
    client
        .batch_execute(&format!(
            "DROP SCHEMA IF EXISTS {schema} CASCADE; CREATE SCHEMA {schema};"
        ))
        .await
        .expect("failed to reset test schema");
    pgswitch::set_search_path(&client, schema)
        .await
        .expect("failed to set search path");
    client
        .batch_execute(ddl)
        .await
        .expect("failed to create test tables");
    Some(client)
}

pub async fn drop_schema(client: &tokio_postgres::Client, schema: &str) {
    client
        .batch_execute(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
        .await
        .expect("failed to drop test schema");
}
