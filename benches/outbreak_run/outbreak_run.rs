use criterion::{criterion_group, criterion_main, Criterion};
use outbreak::{Parameters, Simulation, SimulationOptions};

static POPULATION: usize = 4500;
static SEED: u64 = 123;
static HORIZON: u32 = 365;

fn full_run() -> Simulation {
    let mut simulation = Simulation::new(
        Parameters::covid19(),
        SimulationOptions {
            population_size: POPULATION,
            horizon: HORIZON,
            random_seed: SEED,
        },
    )
    .expect("failed to initialize simulation");
    simulation
        .run_to_horizon()
        .expect("failed to run simulation");
    simulation
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("outbreak full run", |bencher| {
        bencher.iter_with_large_drop(full_run)
    });
}

criterion_group!(outbreak_benches, criterion_benchmark);
criterion_main!(outbreak_benches);
