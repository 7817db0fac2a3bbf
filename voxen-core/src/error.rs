use std::fmt;

use thiserror::Error;

/// The per-point attributes that can travel alongside positions through the
/// voxen algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// RGB color, three scalars per point
    Color,
    /// Intensity, one scalar per point
    Intensity,
    /// Classification, one small categorical integer per point
    Classification,
}

impl AttributeKind {
    /// Number of scalars that each point contributes to a buffer of this
    /// attribute
    pub fn components_per_point(&self) -> usize {
        match self {
            AttributeKind::Color => 3,
            AttributeKind::Intensity => 1,
            AttributeKind::Classification => 1,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Color => write!(f, "color"),
            AttributeKind::Intensity => write!(f, "intensity"),
            AttributeKind::Classification => write!(f, "classification"),
        }
    }
}

/// Errors reported by the voxen core types and algorithms. All failures are
/// synchronous return-path failures, no operation panics on malformed but
/// well-typed input.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed primary input: a position buffer whose length is not
    /// divisible by 3, a non-positive voxel size or smoothing radius, a zero
    /// iteration count, or bounds with min > max on some axis
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// An attribute buffer whose element count does not correspond to the
    /// point count of its cloud
    #[error("{kind} buffer has {actual} elements but {expected} were expected")]
    AttributeMismatch {
        kind: AttributeKind,
        expected: usize,
        actual: usize,
    },
    /// A coordinate is NaN or infinite. Only returned by the opt-in strict
    /// validation, the algorithms themselves skip non-finite points
    #[error("non-finite coordinate in point {index}")]
    NonFiniteValue { index: usize },
}

/// Result type used throughout the voxen crates
pub type Result<T> = std::result::Result<T, Error>;
