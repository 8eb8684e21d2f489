use crate::cli::CopyArgs;
use crate::db::{connect_db, resolve};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table as TextTable};
use pgswitch::{
    ConflictKeyStyle, CopyReport, begin_snapshot, copy_tables, scan_tables, sort_by_dependencies,
};

pub async fn run(args: CopyArgs) -> anyhow::Result<()> {
    let resolved = resolve(&args.common, args.target.as_deref())?;
    let Some(target_url) = resolved.target_url.clone() else {
        anyhow::bail!("copy requires a target; set [target] url in config or pass --target");
    };

    let mut source = connect_db(&resolved.source_url, &resolved.schema).await?;
    // Scan and export from one snapshot so rows added mid-copy cannot break references.
    let snapshot = begin_snapshot(&mut source).await?;
    let tables = scan_tables(&snapshot, &resolved.sync.scan_options(&resolved.schema)).await?;
    let tables = sort_by_dependencies(tables)?;

    if args.dry_run {
        for (i, t) in tables.iter().enumerate() {
            println!("{:>3}. {}", i + 1, t.name());
        }
        println!("dry run: {} tables would be copied", tables.len());
        snapshot.rollback().await?;
        return Ok(());
    }

    let mut opts = resolved.sync.copy_options();
    opts.upsert |= args.upsert;
    if args.quoted_key {
        opts.conflict_key = ConflictKeyStyle::Quoted;
    }

    let mut target = connect_db(&target_url, &resolved.target_schema).await?;
    let tx = target.transaction().await?;
    let report = copy_tables(&snapshot, &tx, &tables, &opts).await?;
    tx.commit().await?;
    snapshot.commit().await?;

    println!("{}", render(&report));
    println!(
        "copied {} rows across {} tables",
        report.total_rows(),
        report.tables.len()
    );
    Ok(())
}

fn render(report: &CopyReport) -> TextTable {
    let mut out = TextTable::new();
    out.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Table").add_attribute(Attribute::Bold),
            Cell::new("Rows").add_attribute(Attribute::Bold),
        ]);
    for t in &report.tables {
        out.add_row(vec![Cell::new(&t.table), Cell::new(t.rows)]);
    }
    out
}
