use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use voxen_algorithms::smoothing::{smooth_points, smooth_points_par};

const NUM_POINTS: usize = 50_000;

fn random_positions(num_points: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(4711);
    (0..num_points * 3)
        .map(|_| rng.gen_range(-100.0_f32..100.0))
        .collect()
}

fn bench(c: &mut Criterion) {
    let positions = random_positions(NUM_POINTS);

    c.bench_function("smooth_points_50k_1iter", |b| {
        b.iter(|| smooth_points(&positions, 2.0, 1).unwrap())
    });
    c.bench_function("smooth_points_50k_3iter", |b| {
        b.iter(|| smooth_points(&positions, 2.0, 3).unwrap())
    });
    c.bench_function("smooth_points_par_50k_3iter", |b| {
        b.iter(|| smooth_points_par(&positions, 2.0, 3).unwrap())
    });
}

criterion_group!(benches, bench);
criterion_main!(benches);
