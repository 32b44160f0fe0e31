//! Criterion benchmarks for collision matrix construction.
//! Focus sizes: N targets in {100, 300, 600} against a 48-fiber sector.
//! Results: by default under target/criterion.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fiberplace::collision::{FootprintTable, MatrixBuilder};
use fiberplace::prelude::*;
use nalgebra::Vector2;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn sector_fibers(cfg: &InstrumentCfg) -> Vec<Fiber> {
    (0..48)
        .map(|k| {
            let id = (288 + k - 24) % 288;
            let cable = if k % 12 == 0 { Cable::Guide } else { Cable::Red };
            Fiber::new(id, cable, cfg)
        })
        .collect()
}

fn random_targets(n: usize, seed: u64) -> Vec<Target> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let r = rng.gen_range(20.0..280.0);
            let a: f64 = rng.gen_range(-0.5..0.5);
            let kind = if i % 20 == 0 {
                TargetKind::Guide
            } else {
                TargetKind::Science
            };
            Target::new(i, i as u64, Vector2::new(r * a.cos(), r * a.sin()), rng.gen_range(1..100), kind)
        })
        .collect()
}

fn bench_matrix(c: &mut Criterion) {
    let cfg = InstrumentCfg::default();
    let fibers = sector_fibers(&cfg);
    let mut group = c.benchmark_group("collision_matrix");
    group.sample_size(10);
    for &n in &[100usize, 300, 600] {
        let table = FootprintTable::prepare(&cfg, &fibers, &random_targets(n, 41));
        group.bench_with_input(BenchmarkId::new("build", n), &table, |b, table| {
            let builder = MatrixBuilder::default();
            b.iter(|| builder.build(table, &mut NoopObserver))
        });
        group.bench_with_input(BenchmarkId::new("footprints", n), &n, |b, &n| {
            let targets = random_targets(n, 42);
            b.iter(|| FootprintTable::prepare(&cfg, &fibers, &targets))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_matrix);
criterion_main!(benches);
