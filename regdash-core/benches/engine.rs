use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use regdash_core::{Collection, ListEngine, PageSize, Record};

fn students(n: usize) -> Collection {
    let records = (0..n)
        .map(|i| {
            Record::new()
                .with("cedula_estudiantes", format!("{}", 1_000_000 + i))
                .with("nombre1", format!("Nombre{}", i % 977))
                .with("apellido1", format!("Apellido{}", i % 353))
                .with("programa_id", (i % 12) as i64)
                .with("fecha", format!("20{:02}-{:02}-{:02}", i % 24, i % 12 + 1, i % 28 + 1))
        })
        .collect();
    Collection::new("cedula_estudiantes", records).unwrap()
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for n in [1_000usize, 10_000] {
        let engine = ListEngine::new(students(n));
        group.bench_with_input(BenchmarkId::new("set_search_term", n), &engine, |b, engine| {
            b.iter(|| {
                let mut engine = engine.clone();
                engine.set_search_term(black_box("apellido35"));
                black_box(engine.filtered_len())
            });
        });
    }

    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    for column in ["programa_id", "fecha", "nombre1"] {
        let engine = ListEngine::new(students(10_000));
        group.bench_with_input(BenchmarkId::new("set_sort", column), &engine, |b, engine| {
            b.iter(|| {
                let mut engine = engine.clone();
                engine.set_sort(black_box(column));
                black_box(engine.filtered_len())
            });
        });
    }

    group.finish();
}

fn bench_page(c: &mut Criterion) {
    let mut engine = ListEngine::with_page_size(students(10_000), PageSize::Fifty);
    engine.set_sort("nombre1");

    c.bench_function("visible_slice::middle_page", |b| {
        b.iter(|| {
            engine.go_to_page(black_box(100));
            black_box(engine.visible_slice().count())
        });
    });
}

criterion_group!(benches, bench_search, bench_sort, bench_page);

criterion_main!(benches);
