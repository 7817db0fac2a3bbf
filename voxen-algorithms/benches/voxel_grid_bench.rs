use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use voxen_algorithms::voxel_grid::{voxel_downsample, voxel_downsample_par};
use voxen_core::PointCloudView;

const NUM_POINTS_SMALL: usize = 10_000;
const NUM_POINTS_BIG: usize = 500_000;

fn random_positions(num_points: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(815);
    (0..num_points * 3)
        .map(|_| rng.gen_range(-100.0_f32..100.0))
        .collect()
}

fn bench(c: &mut Criterion) {
    let positions_small = random_positions(NUM_POINTS_SMALL);
    let positions_big = random_positions(NUM_POINTS_BIG);
    let cloud_small = PointCloudView::new(&positions_small).unwrap();
    let cloud_big = PointCloudView::new(&positions_big).unwrap();

    c.bench_function("voxel_downsample_10k", |b| {
        b.iter(|| voxel_downsample(&cloud_small, 2.0, None).unwrap())
    });
    c.bench_function("voxel_downsample_500k", |b| {
        b.iter(|| voxel_downsample(&cloud_big, 2.0, None).unwrap())
    });
    c.bench_function("voxel_downsample_par_500k", |b| {
        b.iter(|| voxel_downsample_par(&cloud_big, 2.0, None).unwrap())
    });
}

criterion_group!(benches, bench);
criterion_main!(benches);
