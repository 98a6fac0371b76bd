//! Simulation benchmarks for tron_core.
//!
//! Run with: `cargo bench -p tron_core`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use tron_core::agent::Heading;
use tron_core::grid::CellPos;
use tron_core::simulation::{IntentMap, Simulation};

/// A 64x64 arena with four cycles circling inward from the corners.
fn four_cycle_arena() -> Simulation {
    let mut sim = Simulation::new(64, 64).with_max_ticks(10_000);
    sim.spawn_agent(CellPos::new(1, 1), Heading::East).unwrap();
    sim.spawn_agent(CellPos::new(62, 1), Heading::South).unwrap();
    sim.spawn_agent(CellPos::new(62, 62), Heading::West).unwrap();
    sim.spawn_agent(CellPos::new(1, 62), Heading::North).unwrap();
    sim
}

pub fn step_benchmark(c: &mut Criterion) {
    c.bench_function("step_4_agents", |b| {
        b.iter_batched(
            four_cycle_arena,
            |mut sim| {
                // 40 straight steps before anyone reaches a wall
                let intents = IntentMap::new();
                for _ in 0..40 {
                    black_box(sim.step(&intents).unwrap());
                }
                sim
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("snapshot_64x64", |b| {
        let sim = four_cycle_arena();
        b.iter(|| black_box(sim.snapshot()));
    });

    c.bench_function("state_hash_64x64", |b| {
        let sim = four_cycle_arena();
        b.iter(|| black_box(sim.state_hash()));
    });
}

criterion_group!(benches, step_benchmark);
criterion_main!(benches);
