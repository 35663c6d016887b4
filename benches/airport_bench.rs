//! Performance benchmarks for the tarmac kernel.
//!
//! Run with: `cargo bench`
//! Or for specific bench: `cargo bench --bench airport_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tarmac::airport::{airport_top, AirportParams, IN_LANDING};
use tarmac::models::Queue;
use tarmac::{Coupled, Message, Simulation, SimTime};

// ============================================================================
// Airport Benchmarks
// ============================================================================

fn airport_with_arrivals(planes: usize, gap: SimTime) -> Simulation {
    let top = airport_top(&AirportParams::default()).expect("airport builds");
    let mut sim = Simulation::new(top);
    for i in 0..planes {
        let id = (i % 1000) as i64;
        sim.inject(i as SimTime * gap, IN_LANDING, Message::Plane(id))
            .expect("valid arrival");
    }
    sim
}

fn bench_airport_planes(c: &mut Criterion) {
    let mut group = c.benchmark_group("airport");

    for planes in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*planes as u64));
        group.bench_with_input(BenchmarkId::new("planes", planes), planes, |b, &planes| {
            b.iter(|| {
                // Spaced arrivals: one plane in the system at a time
                let mut sim = airport_with_arrivals(planes, 200.0);
                black_box(sim.run().expect("run completes"));
            });
        });
    }

    group.finish();
}

fn bench_airport_congested(c: &mut Criterion) {
    let mut group = c.benchmark_group("airport_congested");

    for planes in [10, 100, 500].iter() {
        group.throughput(Throughput::Elements(*planes as u64));
        group.bench_with_input(BenchmarkId::new("planes", planes), planes, |b, &planes| {
            b.iter(|| {
                // Arrivals faster than the runway: queues and tower buffers fill
                let mut sim = airport_with_arrivals(planes, 5.0);
                black_box(sim.run().expect("run completes"));
            });
        });
    }

    group.finish();
}

// ============================================================================
// Construction Benchmarks
// ============================================================================

fn bench_flatten(c: &mut Criterion) {
    c.bench_function("airport_flatten", |b| {
        b.iter(|| {
            let top = airport_top(&AirportParams::default()).expect("airport builds");
            black_box(Simulation::new(top));
        });
    });
}

fn bench_queue_harness(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_harness");

    for planes in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*planes as u64));
        group.bench_with_input(BenchmarkId::new("planes", planes), planes, |b, &planes| {
            b.iter(|| {
                let harness = Coupled::harness("Queue", Box::new(Queue::new())).expect("harness");
                let mut sim = Simulation::new(harness);
                for i in 0..planes {
                    sim.inject(0.0, "in", Message::Plane(i as i64)).expect("valid input");
                    sim.inject(i as SimTime + 1.0, "done", Message::Signal)
                        .expect("valid input");
                }
                black_box(sim.run().expect("run completes"));
            });
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(
    benches,
    bench_airport_planes,
    bench_airport_congested,
    bench_flatten,
    bench_queue_harness,
);

criterion_main!(benches);
