//! Criterion benchmarks for the annealing optimizer.
//! Steps M in {1_000, 10_000} on a 300-target sector; the field is built
//! once outside the timed loop.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use fiberplace::prelude::*;
use nalgebra::Vector2;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn sector_field() -> Field {
    let cfg = InstrumentCfg::default();
    let fibers: Vec<Fiber> = (0..48)
        .map(|k| {
            let cable = if k % 12 == 0 { Cable::Guide } else { Cable::Red };
            Fiber::new((288 + k - 24) % 288, cable, &cfg)
        })
        .collect();
    let mut rng = StdRng::seed_from_u64(7);
    let targets = (0..300)
        .map(|i| {
            let r = rng.gen_range(20.0..280.0);
            let a: f64 = rng.gen_range(-0.5..0.5);
            let kind = if i % 15 == 0 {
                TargetKind::Guide
            } else {
                TargetKind::Science
            };
            Target::new(i, i as u64, Vector2::new(r * a.cos(), r * a.sin()), rng.gen_range(1..100), kind)
        })
        .collect();
    Field::build(&cfg, &fibers, targets, &MatrixBuilder::default(), &mut NoopObserver)
}

fn bench_anneal(c: &mut Criterion) {
    let field = sector_field();
    let mut group = c.benchmark_group("anneal");
    group.sample_size(10);
    for &steps in &[1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::new("optimize", steps), &steps, |b, &steps| {
            b.iter_batched(
                || field.new_configuration(),
                |mut config| {
                    optimize(&field, &mut config, 3, steps, StdRng::seed_from_u64(1), &mut NoopObserver)
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_anneal);
criterion_main!(benches);
