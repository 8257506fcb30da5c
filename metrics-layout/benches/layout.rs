use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use metrics_layout::{ExponentialLayout, Layout, MAX_PRECISION};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

const SAMPLES: usize = 1024;

fn random_values() -> Vec<f64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0x5eed);
    (0..SAMPLES)
        .map(|_| loop {
            let value = f64::from_bits(rng.random::<u64>());
            if value.is_finite() {
                break value;
            }
        })
        .collect()
}

fn latency_values() -> Vec<f64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0x5eed);
    (0..SAMPLES).map(|_| rng.random_range(0.0001..2.5)).collect()
}

fn layout_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    group.throughput(Throughput::Elements(SAMPLES as u64));

    let inputs = [("random_bits", random_values()), ("latencies", latency_values())];
    for precision in [0, 4, 7, MAX_PRECISION] {
        let layout = ExponentialLayout::create(precision).expect("precision is valid");

        for (name, values) in &inputs {
            group.bench_with_input(
                BenchmarkId::new(format!("map_to_bin_index/{}", name), precision),
                values,
                |b, values| {
                    b.iter(|| {
                        for value in values {
                            black_box(layout.map_to_bin_index(black_box(*value)));
                        }
                    })
                },
            );
        }

        let indices = latency_values()
            .into_iter()
            .map(|value| layout.map_to_bin_index(value))
            .collect::<Vec<_>>();
        group.bench_with_input(
            BenchmarkId::new("bin_lower_bound_approximation", precision),
            &indices,
            |b, indices| {
                b.iter(|| {
                    for index in indices {
                        black_box(layout.bin_lower_bound_approximation(black_box(*index)));
                    }
                })
            },
        );
        group.bench_with_input(BenchmarkId::new("bin_lower_bound", precision), &indices, |b, indices| {
            b.iter(|| {
                for index in indices {
                    black_box(layout.bin_lower_bound(black_box(*index)));
                }
            })
        });
    }

    group.finish();
}

fn registry_benchmark(c: &mut Criterion) {
    c.bench_function("registry/create_cached", |b| {
        b.iter(|| ExponentialLayout::create(black_box(7)).expect("precision is valid"))
    });
}

criterion_group!(benches, layout_benchmark, registry_benchmark);
criterion_main!(benches);
