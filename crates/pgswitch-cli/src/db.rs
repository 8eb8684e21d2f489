use crate::cli::CommonArgs;
use crate::config::{ProjectConfig, SyncConfig};
use tokio_postgres::NoTls;

/// Connection settings after merging the config file with command-line overrides.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub source_url: String,
    pub schema: String,
    pub target_url: Option<String>,
    /// `[target] schema`, or the source schema when there is no `[target]` table.
    pub target_schema: String,
    pub sync: SyncConfig,
}

pub fn resolve(common: &CommonArgs, target_override: Option<&str>) -> anyhow::Result<Resolved> {
    let config_path = common.config_path();
    if let Some(explicit) = &common.config
        && !explicit.exists()
    {
        anyhow::bail!("config file {} not found", explicit.display());
    }

    if config_path.exists() {
        let project = ProjectConfig::load(config_path)?;
        tracing::debug!(config = %project.config_path.display(), "loaded config");

        let file = project.file;
        let schema = common.schema.clone().unwrap_or(file.source.schema);
        let (target_url, target_schema) = match file.target {
            Some(t) => (Some(t.url), t.schema),
            None => (None, schema.clone()),
        };
        return Ok(Resolved {
            source_url: common.source.clone().unwrap_or(file.source.url),
            target_url: target_override.map(str::to_string).or(target_url),
            target_schema,
            schema,
            sync: file.sync,
        });
    }

    let Some(source_url) = common.source.clone() else {
        anyhow::bail!(
            "failed to load config {}; provide --source or create the file",
            config_path.display()
        );
    };
    let schema = common.schema.clone().unwrap_or_else(|| "public".to_string());
    Ok(Resolved {
        source_url,
        target_url: target_override.map(str::to_string),
        target_schema: schema.clone(),
        schema,
        sync: SyncConfig::default(),
    })
}

/// Connect and point the session's search path at `schema`.
pub async fn connect_db(database_url: &str, schema: &str) -> anyhow::Result<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("postgres connection error: {e}");
        }
    });
    pgswitch::set_search_path(&client, schema).await?;
    Ok(client)
}

pub fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .without_time()
        .finish();
    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
