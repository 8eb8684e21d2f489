//! Read table metadata from a live database.

use crate::client::{RowExt, SyncClient};
use crate::error::{SwitchError, SwitchResult};
use crate::table::{Column, Table};
use std::collections::{BTreeMap, BTreeSet};

/// Options for [`scan_tables`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Schema to read tables from.
    pub schema: String,
    /// Tables left out of the result entirely.
    pub skip_tables: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            skip_tables: Vec::new(),
        }
    }
}

impl ScanOptions {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            skip_tables: Vec::new(),
        }
    }

    pub fn skip(mut self, table: impl Into<String>) -> Self {
        self.skip_tables.push(table.into());
        self
    }

    fn is_skipped(&self, table: &str) -> bool {
        self.skip_tables.iter().any(|t| t == table)
    }

    /// Skip entries that name no table in `found`.
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    fn missing_skips<'a>(&'a self, found: &BTreeSet<String>) -> Vec<&'a str> {
        self.skip_tables
            .iter()
            .filter(|t| !found.contains(t.as_str()))
            .map(String::as_str)
            .collect()
    }
}

// Primary key columns sort first so the key column lands at index 0.
// Partitions are read through their parent, so they are not listed themselves.
const COLUMNS_SQL: &str = r#"
SELECT
  c.relname AS table_name,
  a.attname AS column_name,
  a.attnum::int4 AS ordinal,
  pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type,
  NOT a.attnotnull AS nullable,
  EXISTS (
    SELECT 1 FROM pg_catalog.pg_index i
    WHERE i.indrelid = c.oid AND i.indisprimary AND a.attnum = ANY(i.indkey)
  ) AS primary_key
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
WHERE c.relkind IN ('r', 'p')
  AND NOT c.relispartition
  AND a.attnum > 0
  AND NOT a.attisdropped
  AND n.nspname = $1
ORDER BY c.relname, primary_key DESC, a.attnum
"#;

const FOREIGN_KEYS_SQL: &str = r#"
SELECT DISTINCT
  src.relname AS table_name,
  dst.relname AS ref_table
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class src ON src.oid = con.conrelid
JOIN pg_catalog.pg_class dst ON dst.oid = con.confrelid
JOIN pg_catalog.pg_namespace n ON n.oid = src.relnamespace
WHERE con.contype = 'f'
  AND NOT src.relispartition
  AND n.nspname = $1
ORDER BY 1, 2
"#;

/// Load every table of `opts.schema` with its columns and foreign-key dependencies.
///
/// Tables are returned sorted by name; use [`crate::sort_by_dependencies`] to get
/// a write order.
pub async fn scan_tables<C: SyncClient + ?Sized>(
    client: &C,
    opts: &ScanOptions,
) -> SwitchResult<Vec<Table>> {
    let rows = client.query(COLUMNS_SQL, &[&opts.schema]).await?;

    let mut found: BTreeSet<String> = BTreeSet::new();
    let mut tables: BTreeMap<String, Table> = BTreeMap::new();
    for row in rows {
        let table_name: String = row.try_get_column("table_name")?;
        found.insert(table_name.clone());
        if opts.is_skipped(&table_name) {
            continue;
        }

        let column = Column::new(row.try_get_column::<String>("column_name")?)
            .with_ordinal(row.try_get_column("ordinal")?)
            .with_data_type(row.try_get_column::<String>("data_type")?)
            .nullable(row.try_get_column("nullable")?)
            .primary_key(row.try_get_column("primary_key")?);

        tables
            .entry(table_name.clone())
            .or_insert_with(|| Table::new(table_name, Vec::<Column>::new()))
            .columns_mut()
            .push(column);
    }

    #[cfg(feature = "tracing")]
    for name in opts.missing_skips(&found) {
        tracing::warn!(schema = %opts.schema, table = %name, "skipped table not found");
    }

    if tables.is_empty() {
        return Err(SwitchError::validation(format!(
            "No tables found in schema '{}'",
            opts.schema
        )));
    }

    let fk_rows = client.query(FOREIGN_KEYS_SQL, &[&opts.schema]).await?;
    for row in fk_rows {
        let table_name: String = row.try_get_column("table_name")?;
        let ref_table: String = row.try_get_column("ref_table")?;
        if let Some(table) = tables.get_mut(&table_name) {
            table.add_dependency(ref_table);
        }
    }

    Ok(tables.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_is_public() {
        let opts = ScanOptions::default();
        assert_eq!(opts.schema, "public");
        assert!(opts.skip_tables.is_empty());
    }

    #[test]
    fn skip_matches_exact_names() {
        let opts = ScanOptions::new("app").skip("switchover_log");
        assert!(opts.is_skipped("switchover_log"));
        assert!(!opts.is_skipped("switchover"));
    }

    #[test]
    fn missing_skips_only_reports_absent_tables() {
        let opts = ScanOptions::default().skip("skip_me").skip("not_there");
        let found: BTreeSet<String> = ["skip_me", "users"].iter().map(|s| s.to_string()).collect();
        assert_eq!(opts.missing_skips(&found), vec!["not_there"]);
    }

    #[test]
    fn queries_leave_out_partitions() {
        assert!(COLUMNS_SQL.contains("NOT c.relispartition"));
        assert!(FOREIGN_KEYS_SQL.contains("NOT src.relispartition"));
    }
}
