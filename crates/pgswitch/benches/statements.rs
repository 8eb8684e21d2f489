use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgswitch::{ConflictKeyStyle, Table};

/// A table with `n` columns: id, col1, col2, ...
fn wide_table(n: usize) -> Table {
    let cols = std::iter::once("id".to_string()).chain((1..n).map(|i| format!("col{i}")));
    Table::new("bench_table", cols)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("statements/insert_json_rows");

    for n in [1, 5, 10, 50, 100] {
        let table = wide_table(n);
        group.bench_with_input(BenchmarkId::new("plain", n), &table, |b, t| {
            b.iter(|| black_box(t.insert_json_rows_query(false)));
        });
        group.bench_with_input(BenchmarkId::new("upsert", n), &table, |b, t| {
            b.iter(|| black_box(t.insert_json_rows_query(true)));
        });
    }

    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("statements/update_json_rows");

    for n in [5, 50] {
        let table = wide_table(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &table, |b, t| {
            b.iter(|| black_box(t.update_json_rows_query(ConflictKeyStyle::Bare)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_update);
criterion_main!(benches);
