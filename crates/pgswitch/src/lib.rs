//! # pgswitch
//!
//! Table metadata and bulk JSON row statements for moving data between two
//! Postgres databases.
//!
//! ## Features
//!
//! - **One statement shape per operation**: rows travel as a single JSON array
//!   bound to `$1` and are expanded with `json_populate_recordset`
//! - **Schema scan**: read tables, columns and foreign keys from `pg_catalog`
//! - **Write order**: sort tables so referenced rows are written first
//! - **Sync helpers**: insert/upsert, update, delete and export rows through any
//!   [`SyncClient`]
//!
//! ## Statements
//!
//! ```
//! use pgswitch::Table;
//!
//! let t = Table::new("test", ["id", "foo", "bar"]);
//! assert_eq!(
//!     t.insert_json_rows_query(true),
//!     r#"insert into "test" select * from json_populate_recordset(null::"test", $1) on conflict (id) do update set "foo" = excluded."foo", "bar" = excluded."bar" where "test".id = excluded.id"#,
//! );
//! ```
//!
//! ## Copying a schema
//!
//! ```ignore
//! use pgswitch::{copy_tables, scan_tables, sort_by_dependencies, CopyOptions, ScanOptions};
//!
//! let tables = scan_tables(&source, &ScanOptions::new("public")).await?;
//! let tables = sort_by_dependencies(tables)?;
//! let tx = target.transaction().await?;
//! copy_tables(&source, &tx, &tables, &CopyOptions::default()).await?;
//! tx.commit().await?;
//! ```

pub mod client;
pub mod error;
pub mod order;
pub mod scan;
pub mod sync;
pub mod table;

#[cfg(feature = "pool")]
pub mod pool;

pub use client::{RowExt, SyncClient, begin_snapshot, search_path_sql, set_search_path};
pub use error::{SwitchError, SwitchResult};
pub use order::{delete_order, sort_by_dependencies};
pub use scan::{ScanOptions, scan_tables};
pub use sync::{
    CopyOptions, CopyReport, TableCopy, copy_tables, delete_rows, fetch_rows, insert_rows,
    update_rows,
};
pub use table::{Column, ConflictKeyStyle, Table};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};
