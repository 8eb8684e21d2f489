//! Connections used by scanning and syncing.
//!
//! A copy reads from one database and writes to another, often inside a
//! transaction on each side. [`SyncClient`] covers the three calls a copy needs,
//! so the same code runs against a plain client, a pooled client, or a
//! transaction.
//!
//! Generated statements name tables without a schema. Call [`set_search_path`]
//! on both connections before syncing a schema other than `public`.

use crate::error::{SwitchError, SwitchResult};
use tokio_postgres::types::ToSql;
use tokio_postgres::{IsolationLevel, Row, Transaction};

/// The connection surface needed to scan tables and move JSON row sets.
#[async_trait::async_trait]
pub trait SyncClient: Sync {
    /// Run a catalog or export query and return its rows.
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SwitchResult<Vec<Row>>;

    /// Run a query that yields exactly one row, such as a `json_agg` export.
    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SwitchResult<Row>;

    /// Run an insert, update or delete and return the affected row count.
    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SwitchResult<u64>;
}

#[async_trait::async_trait]
impl SyncClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SwitchResult<Vec<Row>> {
        Ok(self.query(sql, params).await?)
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SwitchResult<Row> {
        Ok(self.query_one(sql, params).await?)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SwitchResult<u64> {
        Ok(self.execute(sql, params).await?)
    }
}

#[async_trait::async_trait]
impl SyncClient for Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SwitchResult<Vec<Row>> {
        Ok(self.query(sql, params).await?)
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SwitchResult<Row> {
        Ok(self.query_one(sql, params).await?)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SwitchResult<u64> {
        Ok(self.execute(sql, params).await?)
    }
}

// Pooled clients deref to `tokio_postgres::Client`.
#[cfg(feature = "pool")]
#[async_trait::async_trait]
impl SyncClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SwitchResult<Vec<Row>> {
        let client: &tokio_postgres::Client = self;
        SyncClient::query(client, sql, params).await
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SwitchResult<Row> {
        let client: &tokio_postgres::Client = self;
        SyncClient::query_one(client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> SwitchResult<u64> {
        let client: &tokio_postgres::Client = self;
        SyncClient::execute(client, sql, params).await
    }
}

/// `SET search_path TO "<schema>"`, with embedded quotes doubled.
pub fn search_path_sql(schema: &str) -> String {
    format!("SET search_path TO \"{}\"", schema.replace('"', "\"\""))
}

/// Point unqualified table names on this connection at `schema`.
pub async fn set_search_path<C: SyncClient + ?Sized>(client: &C, schema: &str) -> SwitchResult<()> {
    let sql = search_path_sql(schema);
    #[cfg(feature = "tracing")]
    tracing::debug!(target: "pgswitch.sql", sql = %sql, "setting search path");
    client.execute(&sql, &[]).await?;
    Ok(())
}

/// Open a `REPEATABLE READ READ ONLY` transaction for reading a source.
///
/// Every export run inside it sees the same snapshot, so rows referenced by a
/// later table cannot appear after an earlier table was read.
pub async fn begin_snapshot(client: &mut tokio_postgres::Client) -> SwitchResult<Transaction<'_>> {
    Ok(client
        .build_transaction()
        .isolation_level(IsolationLevel::RepeatableRead)
        .read_only(true)
        .start()
        .await?)
}

/// Typed column access that reports the column name on failure.
pub trait RowExt {
    /// Get a column value by name, returning a [`SwitchError::Decode`] on failure.
    fn try_get_column<'a, T>(&'a self, column: &str) -> SwitchResult<T>
    where
        T: tokio_postgres::types::FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<'a, T>(&'a self, column: &str) -> SwitchResult<T>
    where
        T: tokio_postgres::types::FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| SwitchError::decode(column, e.to_string()))
    }
}
