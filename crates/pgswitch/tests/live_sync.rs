//! End-to-end copy between two schemas of a live database.
//!
//! Skipped unless `DATABASE_URL` is set (a `.env` file is honored).

use pgswitch::{
    ConflictKeyStyle, CopyOptions, ScanOptions, SwitchError, copy_tables, delete_rows, fetch_rows,
    insert_rows, scan_tables, sort_by_dependencies,
};
use serde_json::json;

mod common;

use common::{connect_to_fresh_schema, drop_schema};

const SOURCE_SCHEMA: &str = "pgswitch_test_src";
const TARGET_SCHEMA: &str = "pgswitch_test_dst";

const TABLES_DDL: &str = r#"
CREATE TABLE parents (
    id int PRIMARY KEY,
    name text NOT NULL
);
CREATE TABLE children (
    note text,
    id int PRIMARY KEY,
    parent_id int NOT NULL REFERENCES parents(id)
);
"#;

#[tokio::test]
async fn scan_sort_and_copy() -> Result<(), SwitchError> {
    let Some(source) = connect_to_fresh_schema(SOURCE_SCHEMA, TABLES_DDL).await else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };
    let Some(mut target) = connect_to_fresh_schema(TARGET_SCHEMA, TABLES_DDL).await else {
        return Ok(());
    };

    source
        .batch_execute(
            "INSERT INTO parents VALUES (1, 'one'), (2, 'two');
             INSERT INTO children VALUES ('a', 10, 1), ('b', 11, 1), (NULL, 12, 2);",
        )
        .await?;

    let tables = scan_tables(&source, &ScanOptions::new(SOURCE_SCHEMA)).await?;
    let children = tables
        .iter()
        .find(|t| t.name() == "children")
        .expect("children scanned");
    // Primary key moves to the front regardless of declaration order.
    assert_eq!(
        children
            .columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>(),
        vec!["id", "note", "parent_id"]
    );
    assert!(children.columns()[0].primary_key);
    assert!(children.depends_on("parents"));

    let tables = sort_by_dependencies(tables)?;
    assert_eq!(
        tables.iter().map(|t| t.name()).collect::<Vec<_>>(),
        vec!["parents", "children"]
    );

    let tx = target.transaction().await?;
    let report = copy_tables(&source, &tx, &tables, &CopyOptions::default()).await?;
    tx.commit().await?;
    assert_eq!(report.total_rows(), 5);

    source
        .execute("UPDATE parents SET name = 'uno' WHERE id = 1", &[])
        .await?;
    let parents = &tables[0];
    let rows = fetch_rows(&source, parents).await?;
    let upsert = CopyOptions {
        upsert: true,
        conflict_key: ConflictKeyStyle::Bare,
    };
    assert_eq!(insert_rows(&target, parents, &rows, &upsert).await?, 2);

    let name: String = target
        .query_one("SELECT name FROM parents WHERE id = 1", &[])
        .await?
        .get(0);
    assert_eq!(name, "uno");

    let removed = delete_rows(
        &target,
        &tables[1],
        &json!([{"id": 10}, {"id": 12}]),
        ConflictKeyStyle::Bare,
    )
    .await?;
    assert_eq!(removed, 2);

    drop_schema(&source, SOURCE_SCHEMA).await;
    drop_schema(&target, TARGET_SCHEMA).await;
    Ok(())
}
