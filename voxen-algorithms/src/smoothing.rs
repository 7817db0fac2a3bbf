use rayon::prelude::*;
use rustc_hash::FxHashMap;
use voxen_core::{
    nalgebra::{Point3, Vector3},
    Error, Result,
};

use crate::voxel_grid::VoxelIndex;

/// Spatial bucketing of a position snapshot, keyed by grid cells of edge
/// length equal to the smoothing radius. With that cell size every neighbor
/// within the radius lies in the 3x3x3 block of cells around a point, which
/// brings one smoothing pass from O(n^2) toward O(n*k) for average
/// neighborhood size k. The hash-map grid handles negative cell coordinates
/// exactly, points with non-finite coordinates are left out.
struct SmoothingGrid {
    cells: FxHashMap<VoxelIndex, Vec<u32>>,
    inv_radius: f64,
}

impl SmoothingGrid {
    fn new(inv_radius: f64) -> Self {
        Self {
            cells: FxHashMap::default(),
            inv_radius,
        }
    }

    fn rebuild(&mut self, snapshot: &[f32]) {
        self.cells.clear();
        for (index, position) in positions(snapshot).enumerate() {
            if !is_finite(&position) {
                continue;
            }
            let cell = VoxelIndex::of_position(&position, &Point3::origin(), self.inv_radius);
            self.cells.entry(cell).or_default().push(index as u32);
        }
    }

    /// Mean position of all points of `snapshot` within `radius_sq` of point
    /// `index`, the point itself included. Returns the unchanged position for
    /// non-finite points, which are not part of the grid.
    fn smoothed_position(&self, snapshot: &[f32], index: usize, radius_sq: f64) -> [f32; 3] {
        let i = index * 3;
        let original = [snapshot[i], snapshot[i + 1], snapshot[i + 2]];
        let position = Vector3::new(
            original[0] as f64,
            original[1] as f64,
            original[2] as f64,
        );
        if !is_finite(&position) {
            return original;
        }
        let center = VoxelIndex::of_position(&position, &Point3::origin(), self.inv_radius);

        let mut sum = Vector3::zeros();
        let mut count = 0_u32;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    // saturating: the float-to-int cast in of_position pins
                    // extreme coordinates to i32::MIN/MAX, the offset must
                    // not wrap past them
                    let cell = VoxelIndex {
                        x: center.x.saturating_add(dx),
                        y: center.y.saturating_add(dy),
                        z: center.z.saturating_add(dz),
                    };
                    let indices = match self.cells.get(&cell) {
                        Some(indices) => indices,
                        None => continue,
                    };
                    for &j in indices {
                        let j3 = j as usize * 3;
                        let neighbor = Vector3::new(
                            snapshot[j3] as f64,
                            snapshot[j3 + 1] as f64,
                            snapshot[j3 + 2] as f64,
                        );
                        if (neighbor - position).norm_squared() <= radius_sq {
                            sum += neighbor;
                            count += 1;
                        }
                    }
                }
            }
        }

        // the point's own cell always contains the point itself, so count >= 1
        // and a point without neighbors is unchanged
        let mean = sum / count as f64;
        [mean.x as f32, mean.y as f32, mean.z as f32]
    }
}

fn positions(buffer: &[f32]) -> impl Iterator<Item = Vector3<f64>> + '_ {
    buffer
        .chunks_exact(3)
        .map(|chunk| Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64))
}

fn is_finite(position: &Vector3<f64>) -> bool {
    position.x.is_finite() && position.y.is_finite() && position.z.is_finite()
}

fn validate(buffer: &[f32], radius: f64, iterations: u32) -> Result<()> {
    if buffer.len() % 3 != 0 {
        return Err(Error::InvalidInput(format!(
            "position buffer length {} is not divisible by 3",
            buffer.len()
        )));
    }
    if !radius.is_finite() || radius <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "smoothing radius must be positive and finite, got {}",
            radius
        )));
    }
    if iterations == 0 {
        return Err(Error::InvalidInput(
            "iteration count must be positive".into(),
        ));
    }
    Ok(())
}

/// Smooths point positions by iteratively replacing each point with the mean
/// position of all points within `radius` of it, itself included. Each
/// iteration reads a snapshot of the previous iteration's positions and writes
/// a fresh buffer, so neighbor lookups never observe partially updated
/// positions. The input buffer is not mutated.
///
/// Smoothing never adds or removes points and output order matches input
/// order: index i in maps to index i out. A point with no other point within
/// the radius is unchanged. Points with non-finite coordinates pass through
/// untouched and are invisible to their neighbors.
///
/// Fails with [Error::InvalidInput] for a misaligned buffer, a non-positive or
/// non-finite radius, or zero iterations. An empty buffer yields an empty
/// result.
///
/// # Examples
/// ```
/// # use voxen_algorithms::smoothing::smooth_points;
/// // two points within radius of each other collapse onto their midpoint
/// let positions = [0.0_f32, 0.0, 0.0, 1.0, 0.0, 0.0];
/// let smoothed = smooth_points(&positions, 1.5, 1).unwrap();
/// assert_eq!(smoothed, vec![0.5, 0.0, 0.0, 0.5, 0.0, 0.0]);
///
/// // too far apart: both are unchanged
/// let positions = [0.0_f32, 0.0, 0.0, 2.0, 0.0, 0.0];
/// let smoothed = smooth_points(&positions, 1.0, 1).unwrap();
/// assert_eq!(smoothed, positions.to_vec());
/// ```
pub fn smooth_points(buffer: &[f32], radius: f64, iterations: u32) -> Result<Vec<f32>> {
    validate(buffer, radius, iterations)?;
    let radius_sq = radius * radius;
    let mut grid = SmoothingGrid::new(1.0 / radius);

    let mut current = buffer.to_vec();
    let mut next = vec![0.0_f32; buffer.len()];
    for _ in 0..iterations {
        grid.rebuild(&current);
        for (index, output) in next.chunks_exact_mut(3).enumerate() {
            let smoothed = grid.smoothed_position(&current, index, radius_sq);
            output.copy_from_slice(&smoothed);
        }
        std::mem::swap(&mut current, &mut next);
    }
    Ok(current)
}

/// Parallel version of [smooth_points] with the identical contract. Within one
/// iteration every point reads the same snapshot and writes a disjoint output
/// slot, so points are processed in parallel; iterations themselves stay
/// strictly sequential.
pub fn smooth_points_par(buffer: &[f32], radius: f64, iterations: u32) -> Result<Vec<f32>> {
    validate(buffer, radius, iterations)?;
    let radius_sq = radius * radius;
    let mut grid = SmoothingGrid::new(1.0 / radius);

    let mut current = buffer.to_vec();
    let mut next = vec![0.0_f32; buffer.len()];
    for _ in 0..iterations {
        grid.rebuild(&current);
        let snapshot = &current;
        let grid_ref = &grid;
        next.par_chunks_mut(3)
            .enumerate()
            .for_each(|(index, output)| {
                let smoothed = grid_ref.smoothed_position(snapshot, index, radius_sq);
                output.copy_from_slice(&smoothed);
            });
        std::mem::swap(&mut current, &mut next);
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn random_positions(count: usize, seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count * 3)
            .map(|_| rng.gen_range(-10.0_f32..10.0))
            .collect()
    }

    #[test]
    fn points_outside_radius_are_unchanged() {
        let positions = [0.0_f32, 0.0, 0.0, 2.0, 0.0, 0.0];
        let smoothed = smooth_points(&positions, 1.0, 1).unwrap();
        assert_eq!(smoothed, positions.to_vec());
    }

    #[test]
    fn points_within_radius_move_to_their_mean() {
        let positions = [0.0_f32, 0.0, 0.0, 1.0, 0.0, 0.0];
        let smoothed = smooth_points(&positions, 1.5, 1).unwrap();
        assert_eq!(smoothed, vec![0.5, 0.0, 0.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn single_point_is_unchanged_for_any_radius_and_iterations() {
        let positions = [3.0_f32, -2.0, 7.5];
        let smoothed = smooth_points(&positions, 100.0, 10).unwrap();
        assert_eq!(smoothed, positions.to_vec());
    }

    #[test]
    fn count_and_order_are_preserved() {
        // points spaced further apart than the radius keep their positions,
        // which pins down the index mapping
        let positions: Vec<f32> = (0..100)
            .flat_map(|i| vec![i as f32 * 10.0, 0.0, 0.0])
            .collect();
        let smoothed = smooth_points(&positions, 1.0, 3).unwrap();
        assert_eq!(smoothed.len(), positions.len());
        assert_eq!(smoothed, positions);
    }

    #[test]
    fn iteration_reads_previous_snapshot_only() {
        // three collinear points, radius covers direct neighbors only.
        // reading the snapshot gives (0.5, 1.0, 1.5) after one pass; an
        // in-place update would pull the middle point toward the already
        // moved first point instead
        let positions = [0.0_f32, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0];
        let smoothed = smooth_points(&positions, 1.2, 1).unwrap();
        assert_approx_eq!(smoothed[0], 0.5, 1e-6);
        assert_approx_eq!(smoothed[3], 1.0, 1e-6);
        assert_approx_eq!(smoothed[6], 1.5, 1e-6);
    }

    #[test]
    fn clustered_points_converge_to_their_centroid() {
        let positions = [0.0_f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let smoothed = smooth_points(&positions, 10.0, 5).unwrap();
        for point in smoothed.chunks_exact(3) {
            assert_approx_eq!(point[0], 1.0 / 3.0, 1e-5);
            assert_approx_eq!(point[1], 1.0 / 3.0, 1e-5);
            assert_approx_eq!(point[2], 0.0, 1e-5);
        }
    }

    #[test]
    fn neighbors_across_negative_cells_are_found() {
        // the two points straddle the origin and land in different cells with
        // negative and non-negative coordinates
        let positions = [-0.4_f32, 0.0, 0.0, 0.4, 0.0, 0.0];
        let smoothed = smooth_points(&positions, 1.0, 1).unwrap();
        assert_approx_eq!(smoothed[0], 0.0, 1e-6);
        assert_approx_eq!(smoothed[3], 0.0, 1e-6);
    }

    #[test]
    fn non_finite_points_pass_through_and_are_invisible() {
        let positions = [0.0_f32, 0.0, 0.0, f32::NAN, 0.0, 0.0, 0.5, 0.0, 0.0];
        let smoothed = smooth_points(&positions, 1.0, 1).unwrap();
        // the NaN point is untouched
        assert!(smoothed[3].is_nan());
        // the finite points average only with each other
        assert_approx_eq!(smoothed[0], 0.25, 1e-6);
        assert_approx_eq!(smoothed[6], 0.25, 1e-6);
    }

    #[test]
    fn extreme_coordinates_do_not_overflow_cell_math() {
        // the first point's cell coordinate pins to i32::MAX, scanning its
        // neighborhood must not wrap
        let positions = [1.0e30_f32, 0.0, 0.0, 0.0, 0.0, 0.0];
        let smoothed = smooth_points(&positions, 1.0, 2).unwrap();
        assert_eq!(smoothed, positions.to_vec());
    }

    #[test]
    fn empty_buffer_yields_empty_result() {
        let smoothed = smooth_points(&[], 1.0, 1).unwrap();
        assert!(smoothed.is_empty());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let positions = [0.0_f32, 0.0, 0.0];
        assert!(matches!(
            smooth_points(&positions, 0.0, 1),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            smooth_points(&positions, -2.0, 1),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            smooth_points(&positions, f64::NAN, 1),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            smooth_points(&positions, 1.0, 0),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            smooth_points(&[1.0, 2.0], 1.0, 1),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn smoothing_keeps_finite_points_finite() {
        let positions = random_positions(500, 7);
        let smoothed = smooth_points(&positions, 2.0, 4).unwrap();
        assert_eq!(smoothed.len(), positions.len());
        assert!(smoothed.iter().all(|coordinate| coordinate.is_finite()));
    }

    #[test]
    fn parallel_matches_serial() {
        let positions = random_positions(2000, 8);
        let serial = smooth_points(&positions, 1.5, 3).unwrap();
        let parallel = smooth_points_par(&positions, 1.5, 3).unwrap();
        assert_eq!(serial.len(), parallel.len());
        for (a, b) in serial.iter().zip(parallel.iter()) {
            assert_approx_eq!(*a, *b, 1e-5);
        }
    }
}
