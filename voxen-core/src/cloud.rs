use log::warn;
use nalgebra::Vector3;

use crate::{AttributeKind, Error, Result};

/// A borrowed, validated view over a flat point cloud. Positions are stored as
/// three consecutive `f32` scalars per point; optional attribute buffers run
/// parallel to the positions and stay index-aligned with them.
///
/// A view never owns memory and algorithms never retain one after returning,
/// so callers are free to reuse the underlying buffers immediately.
///
/// # Attribute policy
///
/// Attaching an attribute buffer whose length does not correspond to the point
/// count follows the lenient canonical policy: the buffer is dropped and a
/// warning is logged, so that primary geometry processing stays robust to
/// partial data. The `try_with_*` variants fail with
/// [Error::AttributeMismatch] instead, for callers that prefer fail-loud
/// behavior. The policy is the same for all three attribute kinds.
///
/// # Examples
/// ```
/// # use voxen_core::PointCloudView;
/// let positions = [0.0_f32, 0.0, 0.0, 1.0, 2.0, 3.0];
/// let colors = [255.0_f32, 0.0, 0.0, 0.0, 255.0, 0.0];
/// let cloud = PointCloudView::new(&positions).unwrap().with_colors(&colors);
/// assert_eq!(cloud.len(), 2);
/// assert!(cloud.colors().is_some());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PointCloudView<'a> {
    positions: &'a [f32],
    colors: Option<&'a [f32]>,
    intensities: Option<&'a [f32]>,
    classifications: Option<&'a [u8]>,
}

impl<'a> PointCloudView<'a> {
    /// Creates a view over the given flat position buffer. Fails with
    /// [Error::InvalidInput] if the buffer length is not divisible by 3. An
    /// empty buffer is a valid view of zero points.
    pub fn new(positions: &'a [f32]) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(Error::InvalidInput(format!(
                "position buffer length {} is not divisible by 3",
                positions.len()
            )));
        }
        Ok(Self {
            positions,
            colors: None,
            intensities: None,
            classifications: None,
        })
    }

    fn check_attribute(&self, kind: AttributeKind, actual: usize) -> Result<()> {
        let expected = self.len() * kind.components_per_point();
        if actual != expected {
            return Err(Error::AttributeMismatch {
                kind,
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Attaches a color buffer (three scalars per point). Fails with
    /// [Error::AttributeMismatch] if the length disagrees with the point count.
    pub fn try_with_colors(mut self, colors: &'a [f32]) -> Result<Self> {
        self.check_attribute(AttributeKind::Color, colors.len())?;
        self.colors = Some(colors);
        Ok(self)
    }

    /// Attaches a color buffer, dropping it with a warning if the length
    /// disagrees with the point count
    pub fn with_colors(self, colors: &'a [f32]) -> Self {
        match self.try_with_colors(colors) {
            Ok(view) => view,
            Err(err) => {
                warn!("dropping attribute buffer: {}", err);
                self
            }
        }
    }

    /// Attaches an intensity buffer (one scalar per point). Fails with
    /// [Error::AttributeMismatch] if the length disagrees with the point count.
    pub fn try_with_intensities(mut self, intensities: &'a [f32]) -> Result<Self> {
        self.check_attribute(AttributeKind::Intensity, intensities.len())?;
        self.intensities = Some(intensities);
        Ok(self)
    }

    /// Attaches an intensity buffer, dropping it with a warning if the length
    /// disagrees with the point count
    pub fn with_intensities(self, intensities: &'a [f32]) -> Self {
        match self.try_with_intensities(intensities) {
            Ok(view) => view,
            Err(err) => {
                warn!("dropping attribute buffer: {}", err);
                self
            }
        }
    }

    /// Attaches a classification buffer (one integer per point). Fails with
    /// [Error::AttributeMismatch] if the length disagrees with the point count.
    pub fn try_with_classifications(mut self, classifications: &'a [u8]) -> Result<Self> {
        self.check_attribute(AttributeKind::Classification, classifications.len())?;
        self.classifications = Some(classifications);
        Ok(self)
    }

    /// Attaches a classification buffer, dropping it with a warning if the
    /// length disagrees with the point count
    pub fn with_classifications(self, classifications: &'a [u8]) -> Self {
        match self.try_with_classifications(classifications) {
            Ok(view) => view,
            Err(err) => {
                warn!("dropping attribute buffer: {}", err);
                self
            }
        }
    }

    /// Number of points in this view
    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    /// Returns true if this view contains zero points
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the position of the point at `index`, widened to double
    /// precision
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds.
    pub fn position(&self, index: usize) -> Vector3<f64> {
        let i = index * 3;
        Vector3::new(
            self.positions[i] as f64,
            self.positions[i + 1] as f64,
            self.positions[i + 2] as f64,
        )
    }

    /// Iterates over all positions in input order, widened to double precision
    pub fn positions(&self) -> impl Iterator<Item = Vector3<f64>> + 'a {
        self.positions
            .chunks_exact(3)
            .map(|chunk| Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64))
    }

    /// The raw flat position buffer
    pub fn raw_positions(&self) -> &'a [f32] {
        self.positions
    }

    /// The attached color buffer, if any
    pub fn colors(&self) -> Option<&'a [f32]> {
        self.colors
    }

    /// The attached intensity buffer, if any
    pub fn intensities(&self) -> Option<&'a [f32]> {
        self.intensities
    }

    /// The attached classification buffer, if any
    pub fn classifications(&self) -> Option<&'a [u8]> {
        self.classifications
    }

    /// Opt-in strict validation: fails with [Error::NonFiniteValue] for the
    /// first point with a NaN or infinite coordinate. The algorithms
    /// themselves skip non-finite points instead of failing, callers that
    /// prefer to reject such input can run this check up front.
    pub fn ensure_finite(&self) -> Result<()> {
        for (index, chunk) in self.positions.chunks_exact(3).enumerate() {
            if chunk.iter().any(|coordinate| !coordinate.is_finite()) {
                return Err(Error::NonFiniteValue { index });
            }
        }
        Ok(())
    }
}

/// An owned point cloud, the output of the voxen algorithms. Attribute buffers
/// are present exactly when the corresponding input attribute was present and
/// stay index-aligned with the positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    /// Flat position buffer, three scalars per point
    pub positions: Vec<f32>,
    /// Color buffer, three scalars per point
    pub colors: Option<Vec<f32>>,
    /// Intensity buffer, one scalar per point
    pub intensities: Option<Vec<f32>>,
    /// Classification buffer, one integer per point
    pub classifications: Option<Vec<u8>>,
}

impl PointCloud {
    /// Number of points in this cloud
    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    /// Returns true if this cloud contains zero points
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Borrows this cloud as a [PointCloudView], e.g. to feed it back into an
    /// algorithm
    pub fn view(&self) -> PointCloudView<'_> {
        PointCloudView {
            positions: &self.positions,
            colors: self.colors.as_deref(),
            intensities: self.intensities.as_deref(),
            classifications: self.classifications.as_deref(),
        }
    }
}
