#![warn(clippy::all)]
//! Algorithms that operate on flat point cloud buffers.
//!
//! The two core algorithms are voxel-grid downsampling, which replaces each
//! occupied cell of a regular 3D grid with the centroid of its points, and
//! radius smoothing, which iteratively replaces each point with the mean of
//! all points within a fixed radius. Both are pure functions over a
//! caller-supplied buffer and both come in serial and parallel flavors.

// Single-pass bounding box computation over a point cloud view.
pub mod bounds;
// Iterative radius-based mean filtering of point positions.
pub mod smoothing;
// Voxel-grid downsampling of a point cloud to per-cell centroids.
pub mod voxel_grid;
