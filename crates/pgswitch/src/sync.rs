//! Apply JSON row sets to a database using the statements from [`crate::table`].
//!
//! Unlike the statement builders, these functions check their inputs before
//! touching the database: `rows` must be a JSON array, and statements that
//! need a key column refuse tables without one or with a multi-column primary key.
//!
//! # Example
//! ```ignore
//! use pgswitch::{begin_snapshot, copy_tables, scan_tables, sort_by_dependencies, CopyOptions, ScanOptions};
//!
//! let tables = sort_by_dependencies(scan_tables(&source, &ScanOptions::default()).await?)?;
//! let snapshot = begin_snapshot(&mut source).await?;
//! let tx = target.transaction().await?;
//! let report = copy_tables(&snapshot, &tx, &tables, &CopyOptions::default()).await?;
//! tx.commit().await?;
//! snapshot.commit().await?;
//! println!("copied {} rows", report.total_rows());
//! ```

use crate::client::SyncClient;
use crate::error::{SwitchError, SwitchResult};
use crate::table::{ConflictKeyStyle, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(any(feature = "tracing", test))]
const MAX_LOGGED_SQL: usize = 200;

/// Options for writing rows into a target table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOptions {
    /// Update existing rows on key conflicts instead of failing.
    pub upsert: bool,
    pub conflict_key: ConflictKeyStyle,
}

/// Rows written for one table by [`copy_tables`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCopy {
    pub table: String,
    pub rows: u64,
}

/// Summary of a [`copy_tables`] run, in copy order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyReport {
    pub tables: Vec<TableCopy>,
}

impl CopyReport {
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

#[cfg(any(feature = "tracing", test))]
fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(feature = "tracing")]
fn log_statement(op: &'static str, table: &Table, rows: usize, sql: &str) {
    let shown = truncate_sql_bytes(sql, MAX_LOGGED_SQL);
    tracing::debug!(
        target: "pgswitch.sql",
        table = table.name(),
        op,
        rows,
        truncated = shown.len() < sql.len(),
        sql = %shown,
    );
}

#[cfg(not(feature = "tracing"))]
fn log_statement(_op: &'static str, _table: &Table, _rows: usize, _sql: &str) {}

/// Number of rows in `rows`, or a validation error if it is not a JSON array.
fn row_count(table: &Table, rows: &Value) -> SwitchResult<usize> {
    match rows {
        Value::Array(items) => Ok(items.len()),
        other => Err(SwitchError::validation(format!(
            "rows for table '{}' must be a JSON array, got {}",
            table.name(),
            json_kind(other)
        ))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn require_key(table: &Table, op: &str) -> SwitchResult<()> {
    if table.key_column().is_none() {
        return Err(SwitchError::validation(format!(
            "{op} on table '{}' requires at least one column",
            table.name()
        )));
    }
    // Statements match on the first column only.
    let pk_columns = table.columns().iter().filter(|c| c.primary_key).count();
    if pk_columns > 1 {
        return Err(SwitchError::validation(format!(
            "{op} on table '{}' is not supported: primary key spans {pk_columns} columns",
            table.name()
        )));
    }
    Ok(())
}

fn require_non_key_columns(table: &Table, op: &str) -> SwitchResult<()> {
    require_key(table, op)?;
    if table.columns().len() < 2 {
        return Err(SwitchError::validation(format!(
            "{op} on table '{}' requires a column besides the key",
            table.name()
        )));
    }
    Ok(())
}

async fn execute_json<C: SyncClient + ?Sized>(
    client: &C,
    op: &'static str,
    table: &Table,
    sql: &str,
    rows: &Value,
    count: usize,
) -> SwitchResult<u64> {
    log_statement(op, table, count, sql);
    client.execute(sql, &[rows]).await
}

/// Insert a JSON array of rows, optionally upserting on the key column.
///
/// An empty array returns `Ok(0)` without a round trip.
pub async fn insert_rows<C: SyncClient + ?Sized>(
    client: &C,
    table: &Table,
    rows: &Value,
    opts: &CopyOptions,
) -> SwitchResult<u64> {
    let count = row_count(table, rows)?;
    if opts.upsert {
        require_non_key_columns(table, "upsert")?;
    }
    if count == 0 {
        return Ok(0);
    }
    let sql = table.insert_json_rows_query_with(opts.upsert, opts.conflict_key);
    execute_json(client, "insert", table, &sql, rows, count).await
}

/// Update existing rows, matched on the key column, from a JSON array.
pub async fn update_rows<C: SyncClient + ?Sized>(
    client: &C,
    table: &Table,
    rows: &Value,
    conflict_key: ConflictKeyStyle,
) -> SwitchResult<u64> {
    let count = row_count(table, rows)?;
    require_non_key_columns(table, "update")?;
    if count == 0 {
        return Ok(0);
    }
    let sql = table.update_json_rows_query(conflict_key);
    execute_json(client, "update", table, &sql, rows, count).await
}

/// Delete the rows whose key appears in a JSON array of row objects.
pub async fn delete_rows<C: SyncClient + ?Sized>(
    client: &C,
    table: &Table,
    rows: &Value,
    conflict_key: ConflictKeyStyle,
) -> SwitchResult<u64> {
    let count = row_count(table, rows)?;
    require_key(table, "delete")?;
    if count == 0 {
        return Ok(0);
    }
    let sql = table.delete_json_rows_query(conflict_key);
    execute_json(client, "delete", table, &sql, rows, count).await
}

/// Read every row of `table` as one JSON array.
pub async fn fetch_rows<C: SyncClient + ?Sized>(client: &C, table: &Table) -> SwitchResult<Value> {
    let sql = table.select_json_rows_query();
    log_statement("select", table, 0, &sql);
    let row = client.query_one(&sql, &[]).await?;
    row.try_get::<_, Value>(0)
        .map_err(|e| SwitchError::decode(table.name(), e.to_string()))
}

/// Copy every row of each table from `source` to `target`, in the given order.
///
/// Pass tables through [`crate::sort_by_dependencies`] first so foreign keys are
/// satisfied. Read `source` through [`crate::begin_snapshot`] so every table comes
/// from one snapshot, and write through a transaction on `target` to make the copy
/// atomic.
pub async fn copy_tables<S, T>(
    source: &S,
    target: &T,
    tables: &[Table],
    opts: &CopyOptions,
) -> SwitchResult<CopyReport>
where
    S: SyncClient + ?Sized,
    T: SyncClient + ?Sized,
{
    let mut report = CopyReport::default();
    for table in tables {
        let rows = fetch_rows(source, table).await?;
        let written = insert_rows(target, table, &rows, opts).await?;

        #[cfg(feature = "tracing")]
        tracing::info!(table = table.name(), rows = written, "copied table");

        report.tables.push(TableCopy {
            table: table.name().to_string(),
            rows: written,
        });
    }
    Ok(report)
}
