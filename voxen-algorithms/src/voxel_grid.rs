use std::collections::hash_map::Entry;

use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use voxen_core::{
    math::Aabb,
    nalgebra::{Point3, Vector3},
    Error, PointCloud, PointCloudView, Result,
};

use crate::bounds::calculate_bounds;

/// Points per work unit for the parallel accumulation pass
const CHUNK_SIZE: usize = 4096;

/// Integer coordinates of a cell in a voxel grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoxelIndex {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelIndex {
    /// Computes the cell containing `position` in a grid anchored at `min`
    /// with cells of edge length `1.0 / inv_voxel_size`. Flooring is toward
    /// negative infinity, not toward zero, so points left of the anchor land
    /// in negative cells instead of being folded into cell zero. A point
    /// exactly on a cell boundary belongs to the cell whose minimum corner is
    /// that boundary, i.e. every cell covers the half-open volume
    /// `[cell_min, cell_min + voxel_size)` per axis.
    pub fn of_position(position: &Vector3<f64>, min: &Point3<f64>, inv_voxel_size: f64) -> Self {
        Self {
            x: ((position.x - min.x) * inv_voxel_size).floor() as i32,
            y: ((position.y - min.y) * inv_voxel_size).floor() as i32,
            z: ((position.z - min.z) * inv_voxel_size).floor() as i32,
        }
    }
}

/// Transient per-cell aggregation record. Sums are kept in double precision
/// and only narrowed to `f32` at centroid emission.
#[derive(Debug, Clone)]
struct VoxelAccumulator {
    count: u32,
    sum: Vector3<f64>,
    color_sum: Vector3<f64>,
    intensity_sum: f64,
    // classification is categorical, the cell keeps the value of its
    // first-seen point in input order
    classification: u8,
    first_index: u32,
}

impl VoxelAccumulator {
    fn new(first_index: u32, classification: u8) -> Self {
        Self {
            count: 0,
            sum: Vector3::zeros(),
            color_sum: Vector3::zeros(),
            intensity_sum: 0.0,
            classification,
            first_index,
        }
    }

    /// Merges the counts and sums of two accumulators for the same cell.
    /// Merging is commutative up to floating-point rounding order, the
    /// first-seen classification is resolved via the lower input index.
    fn merge(&mut self, other: VoxelAccumulator) {
        if other.first_index < self.first_index {
            self.first_index = other.first_index;
            self.classification = other.classification;
        }
        self.count += other.count;
        self.sum += other.sum;
        self.color_sum += other.color_sum;
        self.intensity_sum += other.intensity_sum;
    }
}

/// Result of a voxel-grid downsampling pass
#[derive(Debug, Clone)]
pub struct DownsampleResult {
    /// One centroid point per occupied cell, with averaged color/intensity
    /// and first-seen classification when the input carried those attributes
    pub cloud: PointCloud,
    /// Number of occupied cells, always equal to `cloud.len()`
    pub voxel_count: usize,
}

fn validate_voxel_size(voxel_size: f64) -> Result<f64> {
    if !voxel_size.is_finite() || voxel_size <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "voxel size must be positive and finite, got {}",
            voxel_size
        )));
    }
    Ok(1.0 / voxel_size)
}

fn empty_result(cloud: &PointCloudView) -> DownsampleResult {
    DownsampleResult {
        cloud: PointCloud {
            positions: Vec::new(),
            colors: cloud.colors().map(|_| Vec::new()),
            intensities: cloud.intensities().map(|_| Vec::new()),
            classifications: cloud.classifications().map(|_| Vec::new()),
        },
        voxel_count: 0,
    }
}

/// Adds point `index` of `cloud` to its cell, skipping points with non-finite
/// coordinates
fn accumulate_point(
    cells: &mut FxHashMap<VoxelIndex, VoxelAccumulator>,
    cloud: &PointCloudView,
    index: usize,
    grid_min: &Point3<f64>,
    inv_voxel_size: f64,
    skipped: &mut usize,
) {
    let position = cloud.position(index);
    if !(position.x.is_finite() && position.y.is_finite() && position.z.is_finite()) {
        *skipped += 1;
        return;
    }
    let cell = VoxelIndex::of_position(&position, grid_min, inv_voxel_size);
    let accumulator = cells.entry(cell).or_insert_with(|| {
        let classification = cloud.classifications().map_or(0, |c| c[index]);
        VoxelAccumulator::new(index as u32, classification)
    });
    accumulator.count += 1;
    accumulator.sum += position;
    if let Some(colors) = cloud.colors() {
        let c = index * 3;
        accumulator.color_sum.x += colors[c] as f64;
        accumulator.color_sum.y += colors[c + 1] as f64;
        accumulator.color_sum.z += colors[c + 2] as f64;
    }
    if let Some(intensities) = cloud.intensities() {
        accumulator.intensity_sum += intensities[index] as f64;
    }
}

/// Emits one centroid per occupied cell. Cell iteration order is
/// implementation-defined, the reduction is a set-reduction and not a stable
/// transform.
fn emit_centroids(
    cells: FxHashMap<VoxelIndex, VoxelAccumulator>,
    cloud: &PointCloudView,
) -> DownsampleResult {
    let voxel_count = cells.len();
    let mut positions = Vec::with_capacity(voxel_count * 3);
    let mut centroid_colors = cloud.colors().map(|_| Vec::with_capacity(voxel_count * 3));
    let mut centroid_intensities = cloud.intensities().map(|_| Vec::with_capacity(voxel_count));
    let mut centroid_classifications = cloud
        .classifications()
        .map(|_| Vec::with_capacity(voxel_count));

    for accumulator in cells.into_values() {
        let inv_count = 1.0 / accumulator.count as f64;
        positions.push((accumulator.sum.x * inv_count) as f32);
        positions.push((accumulator.sum.y * inv_count) as f32);
        positions.push((accumulator.sum.z * inv_count) as f32);
        if let Some(colors) = centroid_colors.as_mut() {
            colors.push((accumulator.color_sum.x * inv_count) as f32);
            colors.push((accumulator.color_sum.y * inv_count) as f32);
            colors.push((accumulator.color_sum.z * inv_count) as f32);
        }
        if let Some(intensities) = centroid_intensities.as_mut() {
            intensities.push((accumulator.intensity_sum * inv_count) as f32);
        }
        if let Some(classifications) = centroid_classifications.as_mut() {
            classifications.push(accumulator.classification);
        }
    }

    DownsampleResult {
        cloud: PointCloud {
            positions,
            colors: centroid_colors,
            intensities: centroid_intensities,
            classifications: centroid_classifications,
        },
        voxel_count,
    }
}

/// Downsamples `cloud` by partitioning its points into a regular 3D grid with
/// cells of edge length `voxel_size` and replacing the points of each occupied
/// cell with their centroid. Attached color and intensity buffers are averaged
/// per cell, classifications keep the value of the cell's first point in input
/// order.
///
/// The grid is anchored at the minimum corner of `bounds`. Passing caller
/// bounds lets distributed callers agree on a shared grid; with `None` the
/// bounds are computed in one linear scan over the cloud. Points with
/// non-finite coordinates are skipped, an empty cloud yields an empty result.
///
/// Downsampling is idempotent: re-running it on its own output with the same
/// voxel size and bounds reproduces the same point set, since every centroid
/// is alone in its cell.
///
/// # Examples
/// ```
/// # use voxen_core::PointCloudView;
/// # use voxen_algorithms::voxel_grid::voxel_downsample;
/// let positions = [0.0_f32, 0.0, 0.0, 0.1, 0.1, 0.1, 5.0, 5.0, 5.0];
/// let cloud = PointCloudView::new(&positions).unwrap();
/// let result = voxel_downsample(&cloud, 1.0, None).unwrap();
/// // the first two points share a cell, the third is alone in its own
/// assert_eq!(result.voxel_count, 2);
/// assert_eq!(result.cloud.len(), 2);
/// ```
pub fn voxel_downsample(
    cloud: &PointCloudView,
    voxel_size: f64,
    bounds: Option<&Aabb>,
) -> Result<DownsampleResult> {
    let inv_voxel_size = validate_voxel_size(voxel_size)?;
    let bounds = match bounds.copied().or_else(|| calculate_bounds(cloud)) {
        Some(bounds) => bounds,
        None => return Ok(empty_result(cloud)),
    };
    let grid_min = *bounds.min();

    let estimated_cells = (cloud.len() / 100).max(16).min(100_000);
    let mut cells: FxHashMap<VoxelIndex, VoxelAccumulator> =
        FxHashMap::with_capacity_and_hasher(estimated_cells, Default::default());
    let mut skipped = 0_usize;
    for index in 0..cloud.len() {
        accumulate_point(&mut cells, cloud, index, &grid_min, inv_voxel_size, &mut skipped);
    }
    if skipped > 0 {
        debug!("skipped {} points with non-finite coordinates", skipped);
    }
    Ok(emit_centroids(cells, cloud))
}

/// Parallel version of [voxel_downsample] with the identical contract. Points
/// are partitioned across threads, accumulated into thread-local cell maps and
/// merged by adding counts and sums, which is exact up to floating-point
/// summation order.
pub fn voxel_downsample_par(
    cloud: &PointCloudView,
    voxel_size: f64,
    bounds: Option<&Aabb>,
) -> Result<DownsampleResult> {
    let inv_voxel_size = validate_voxel_size(voxel_size)?;
    let bounds = match bounds.copied().or_else(|| calculate_bounds(cloud)) {
        Some(bounds) => bounds,
        None => return Ok(empty_result(cloud)),
    };
    let grid_min = *bounds.min();

    let point_count = cloud.len();
    let chunk_count = (point_count + CHUNK_SIZE - 1) / CHUNK_SIZE;
    let (cells, skipped) = (0..chunk_count)
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * CHUNK_SIZE;
            let end = ((chunk + 1) * CHUNK_SIZE).min(point_count);
            let mut local: FxHashMap<VoxelIndex, VoxelAccumulator> = FxHashMap::default();
            let mut skipped = 0_usize;
            for index in start..end {
                accumulate_point(&mut local, cloud, index, &grid_min, inv_voxel_size, &mut skipped);
            }
            (local, skipped)
        })
        .reduce(
            || (FxHashMap::default(), 0),
            |(mut merged, merged_skipped), (local, local_skipped)| {
                for (cell, accumulator) in local {
                    match merged.entry(cell) {
                        Entry::Occupied(mut entry) => entry.get_mut().merge(accumulator),
                        Entry::Vacant(entry) => {
                            entry.insert(accumulator);
                        }
                    }
                }
                (merged, merged_skipped + local_skipped)
            },
        );
    if skipped > 0 {
        debug!("skipped {} points with non-finite coordinates", skipped);
    }
    Ok(emit_centroids(cells, cloud))
}
