#![warn(clippy::all)]

//! Core data structures for the voxen point cloud toolkit
//!
//! Voxen works on flat coordinate buffers: an ordered sequence of points, each
//! stored as three consecutive `f32` scalars. This crate provides the validated
//! view types over such buffers ([PointCloudView](crate::PointCloudView)), the
//! owned output type ([PointCloud](crate::PointCloud)), axis-aligned bounding
//! boxes ([Aabb](crate::math::Aabb)) and the error taxonomy shared by all
//! algorithms.

pub extern crate nalgebra;

/// Mathematical tools for working with point cloud data
pub mod math;

mod cloud;
pub use self::cloud::*;

mod error;
pub use self::error::*;
