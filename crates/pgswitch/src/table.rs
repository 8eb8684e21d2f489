//! Table metadata and the bulk JSON row statements derived from it.
//!
//! Every statement produced here takes exactly one bind parameter, `$1`, holding a
//! JSON array of row objects. Postgres expands the array server-side with
//! `json_populate_recordset(null::"table", $1)`, so the statement text is the same
//! no matter how many rows are sent.
//!
//! Names are wrapped in double quotes verbatim; nothing is escaped. The first
//! column is the key column and is rendered unquoted by default (see
//! [`ConflictKeyStyle`]).
//!
//! # Example
//! ```
//! use pgswitch::{Column, Table};
//!
//! let t = Table::new("test", [Column::new("id"), Column::new("foo")]);
//! assert_eq!(
//!     t.insert_json_rows_query(false),
//!     r#"insert into "test" select * from json_populate_recordset(null::"test", $1)"#,
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single column of a [`Table`].
///
/// Only [`Column::name`] affects generated SQL. The remaining fields are filled
/// in by [`crate::scan_tables`] and are informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub ordinal: i32,
}

impl Column {
    /// Create a column that only carries a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: String::new(),
            nullable: true,
            primary_key: false,
            ordinal: 0,
        }
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }

    pub fn with_ordinal(mut self, ordinal: i32) -> Self {
        self.ordinal = ordinal;
        self
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// How the key column is written in the statements that reference it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKeyStyle {
    /// `on conflict (id) ... where "t".id = excluded.id`
    ///
    /// Existing consumers match on this exact text.
    #[default]
    Bare,
    /// `on conflict ("id") ... where "t"."id" = excluded."id"`
    Quoted,
}

impl ConflictKeyStyle {
    fn push_key(self, out: &mut String, name: &str) {
        match self {
            Self::Bare => out.push_str(name),
            Self::Quoted => push_quoted(out, name),
        }
    }
}

fn push_quoted(out: &mut String, name: &str) {
    out.push('"');
    out.push_str(name);
    out.push('"');
}

/// A table: a name, an ordered list of columns, and the tables it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    cols: Vec<Column>,
    #[serde(default)]
    deps: BTreeSet<String>,
}

impl Table {
    /// Create a table. Column order is preserved; the first column is the key.
    pub fn new<C: Into<Column>>(name: impl Into<String>, cols: impl IntoIterator<Item = C>) -> Self {
        Self {
            name: name.into(),
            cols: cols.into_iter().map(Into::into).collect(),
            deps: BTreeSet::new(),
        }
    }

    /// Record that this table has a foreign key to `table`.
    ///
    /// Self references are ignored.
    pub fn with_dependency(mut self, table: impl Into<String>) -> Self {
        self.add_dependency(table);
        self
    }

    pub(crate) fn add_dependency(&mut self, table: impl Into<String>) {
        let table = table.into();
        if table != self.name {
            self.deps.insert(table);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.cols
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<Column> {
        &mut self.cols
    }

    /// The first column, used as the conflict target and join key.
    pub fn key_column(&self) -> Option<&Column> {
        self.cols.first()
    }

    /// Tables this table references, in name order.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.deps.iter().map(String::as_str)
    }

    pub fn depends_on(&self, table: &str) -> bool {
        self.deps.contains(table)
    }

    fn key_name(&self) -> &str {
        self.cols.first().map(|c| c.name.as_str()).unwrap_or("")
    }

    fn non_key_columns(&self) -> &[Column] {
        self.cols.get(1..).unwrap_or(&[])
    }

    fn push_recordset(&self, out: &mut String) {
        out.push_str("json_populate_recordset(null::");
        push_quoted(out, &self.name);
        out.push_str(", $1)");
    }

    /// Bulk insert of a JSON array of rows, optionally turning conflicts on the
    /// key column into updates of every other column.
    ///
    /// The key column is unquoted. With `upsert` and a single column the
    /// assignment list is empty, which leaves `set  where` (two spaces) in the
    /// output. Neither case is validated.
    pub fn insert_json_rows_query(&self, upsert: bool) -> String {
        self.insert_json_rows_query_with(upsert, ConflictKeyStyle::Bare)
    }

    /// Same as [`Table::insert_json_rows_query`] with an explicit key style.
    pub fn insert_json_rows_query_with(&self, upsert: bool, style: ConflictKeyStyle) -> String {
        let mut out = String::with_capacity(96 + self.name.len() * 3 + self.cols.len() * 32);
        out.push_str("insert into ");
        push_quoted(&mut out, &self.name);
        out.push_str(" select * from ");
        self.push_recordset(&mut out);

        if !upsert {
            return out;
        }

        let key = self.key_name();
        out.push_str(" on conflict (");
        style.push_key(&mut out, key);
        out.push_str(") do update set ");
        for (i, col) in self.non_key_columns().iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            push_quoted(&mut out, &col.name);
            out.push_str(" = excluded.");
            push_quoted(&mut out, &col.name);
        }
        out.push_str(" where ");
        push_quoted(&mut out, &self.name);
        out.push('.');
        style.push_key(&mut out, key);
        out.push_str(" = excluded.");
        style.push_key(&mut out, key);
        out
    }

    /// Bulk update of existing rows, matched on the key column, from a JSON array.
    pub fn update_json_rows_query(&self, style: ConflictKeyStyle) -> String {
        let mut out = String::from("update ");
        push_quoted(&mut out, &self.name);
        out.push_str(" dst set ");
        for (i, col) in self.non_key_columns().iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            push_quoted(&mut out, &col.name);
            out.push_str(" = data.");
            push_quoted(&mut out, &col.name);
        }
        out.push_str(" from ");
        self.push_recordset(&mut out);
        out.push_str(" as data where ");
        self.push_key_join(&mut out, style);
        out
    }

    /// Bulk delete of the rows whose key appears in a JSON array.
    ///
    /// Only the key field of each JSON object is read.
    pub fn delete_json_rows_query(&self, style: ConflictKeyStyle) -> String {
        let mut out = String::from("delete from ");
        push_quoted(&mut out, &self.name);
        out.push_str(" dst using ");
        self.push_recordset(&mut out);
        out.push_str(" as data where ");
        self.push_key_join(&mut out, style);
        out
    }

    /// Export every row as a single JSON array, the shape the other statements take.
    pub fn select_json_rows_query(&self) -> String {
        let mut out = String::from("select coalesce(json_agg(src.*), '[]'::json) from ");
        push_quoted(&mut out, &self.name);
        out.push_str(" src");
        out
    }

    fn push_key_join(&self, out: &mut String, style: ConflictKeyStyle) {
        let key = self.key_name();
        out.push_str("dst.");
        style.push_key(out, key);
        out.push_str(" = data.");
        style.push_key(out, key);
    }
}
