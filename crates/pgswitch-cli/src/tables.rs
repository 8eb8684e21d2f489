use crate::cli::TablesArgs;
use crate::db::{connect_db, resolve};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table as TextTable};
use pgswitch::{Table, scan_tables, sort_by_dependencies};

pub async fn run(args: TablesArgs) -> anyhow::Result<()> {
    let resolved = resolve(&args.common, None)?;
    let client = connect_db(&resolved.source_url, &resolved.schema).await?;
    let tables = scan_tables(&client, &resolved.sync.scan_options(&resolved.schema)).await?;
    let tables = sort_by_dependencies(tables)?;

    println!("{}", render(&tables));
    println!("{} tables in schema {}", tables.len(), resolved.schema);
    Ok(())
}

fn render(tables: &[Table]) -> TextTable {
    let mut out = TextTable::new();
    out.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Table").add_attribute(Attribute::Bold),
            Cell::new("Key").add_attribute(Attribute::Bold),
            Cell::new("Columns").add_attribute(Attribute::Bold),
            Cell::new("Depends on").add_attribute(Attribute::Bold),
        ]);

    for (i, t) in tables.iter().enumerate() {
        let key = match t.key_column() {
            Some(col) if col.primary_key => Cell::new(&col.name).fg(Color::Green),
            Some(col) => Cell::new(&col.name).fg(Color::Yellow),
            None => Cell::new("-").fg(Color::Red),
        };
        out.add_row(vec![
            Cell::new(i + 1),
            Cell::new(t.name()),
            key,
            Cell::new(t.columns().len()),
            Cell::new(t.dependencies().collect::<Vec<_>>().join(", ")),
        ]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgswitch::Column;

    #[test]
    fn renders_one_row_per_table() {
        let tables = vec![
            Table::new("users", [Column::new("id").primary_key(true), Column::new("name")]),
            Table::new("user_contacts", ["id", "user_id"]).with_dependency("users"),
        ];
        let rendered = render(&tables).to_string();
        assert!(rendered.contains("users"));
        assert!(rendered.contains("user_contacts"));
        assert_eq!(render(&tables).row_iter().count(), 2);
    }
}
