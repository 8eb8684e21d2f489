use crate::cli::SqlArgs;
use crate::db::{connect_db, resolve};
use pgswitch::{ConflictKeyStyle, Table, scan_tables, sort_by_dependencies};

pub async fn run(args: SqlArgs) -> anyhow::Result<()> {
    let resolved = resolve(&args.common, None)?;
    let client = connect_db(&resolved.source_url, &resolved.schema).await?;
    let tables = scan_tables(&client, &resolved.sync.scan_options(&resolved.schema)).await?;
    let tables = sort_by_dependencies(tables)?;

    let style = if args.quoted_key {
        ConflictKeyStyle::Quoted
    } else {
        resolved.sync.conflict_key
    };
    let upsert = args.upsert || resolved.sync.upsert;

    let selected: Vec<&Table> = match &args.table {
        Some(name) => {
            let Some(t) = tables.iter().find(|t| t.name() == name) else {
                anyhow::bail!("table not found in schema {}: {name}", resolved.schema);
            };
            vec![t]
        }
        None => tables.iter().collect(),
    };

    for (i, t) in selected.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print!("{}", render(t, upsert, style));
    }
    Ok(())
}

fn render(table: &Table, upsert: bool, style: ConflictKeyStyle) -> String {
    format!(
        "-- {name}\n{insert}\n{update}\n{delete}\n{select}\n",
        name = table.name(),
        insert = table.insert_json_rows_query_with(upsert, style),
        update = table.update_json_rows_query(style),
        delete = table.delete_json_rows_query(style),
        select = table.select_json_rows_query(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_all_statements() {
        let out = render(&Table::new("test", ["id", "foo"]), true, ConflictKeyStyle::Bare);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "-- test");
        assert!(lines[1].ends_with(r#"where "test".id = excluded.id"#));
        assert!(lines[2].starts_with(r#"update "test" dst set "foo" = data."foo""#));
        assert!(lines[3].starts_with(r#"delete from "test" dst"#));
        assert!(lines[4].starts_with("select coalesce(json_agg(src.*)"));
    }
}
