//! Benchmarks for ladder operations.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use bookwire::book::{Ladder, Side};

fn populated(side: Side, size: usize) -> Ladder {
    let mut ladder = Ladder::new(side);
    for i in 0..size {
        ladder.upsert_by_price(100.0 + i as f64 * 0.5, 1.0 + i as f64, None);
    }
    ladder
}

fn bench_upsert_by_price(c: &mut Criterion) {
    let mut group = c.benchmark_group("ladder_upsert_by_price");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut ladder = populated(Side::Ask, size);
            b.iter(|| {
                // Overwrite somewhere mid-book, the common case
                ladder.upsert_by_price(black_box(100.0 + size as f64 / 4.0), black_box(2.0), None);
            });
        });
    }

    group.finish();
}

fn bench_upsert_by_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("ladder_upsert_by_id");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut ladder = Ladder::new(Side::Bid);
            for i in 0..size {
                ladder.upsert_by_id(i as u64, 100.0 - i as f64 * 0.5, 1.0);
            }
            b.iter(|| {
                ladder.upsert_by_id(black_box(size as u64 / 2), black_box(75.25), black_box(3.0));
            });
        });
    }

    group.finish();
}

fn bench_best(c: &mut Criterion) {
    let mut group = c.benchmark_group("ladder_best");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let ladder = populated(Side::Bid, size);
            b.iter(|| {
                black_box(ladder.best());
            });
        });
    }

    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let ladder = populated(Side::Ask, 500);

    c.bench_function("ladder_fingerprint_top10", |b| {
        b.iter(|| {
            black_box(ladder.fingerprint(black_box(10)));
        });
    });
}

criterion_group!(
    benches,
    bench_upsert_by_price,
    bench_upsert_by_id,
    bench_best,
    bench_fingerprint
);
criterion_main!(benches);
