use nalgebra::{Point3, Vector3};

use crate::{Error, Result};

/// 3D axis-aligned bounding box with double-precision corners. Used to anchor
/// the origin of a voxel grid, so that distributed callers that agree on the
/// same bounds also agree on the same grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl Aabb {
    /// Creates a new `Aabb` from the given minimum and maximum coordinates.
    /// Fails with [Error::InvalidInput] if any scalar is non-finite or if the
    /// minimum position is not less than or equal to the maximum position on
    /// every axis.
    /// ```
    /// # use voxen_core::math::Aabb;
    /// # use voxen_core::nalgebra::Point3;
    /// let bounds = Aabb::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    /// assert!(bounds.is_ok());
    /// let degenerate = Aabb::from_min_max(Point3::new(2.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    /// assert!(degenerate.is_err());
    /// ```
    pub fn from_min_max(min: Point3<f64>, max: Point3<f64>) -> Result<Self> {
        let scalars = [min.x, min.y, min.z, max.x, max.y, max.z];
        if scalars.iter().any(|scalar| !scalar.is_finite()) {
            return Err(Error::InvalidInput(
                "bounds must consist of finite coordinates".into(),
            ));
        }
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(Error::InvalidInput(format!(
                "bounds minimum {} must be <= maximum {} on every axis",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Creates a new `Aabb` from the given minimum and maximum coordinates
    /// without validation. Prefer this over [from_min_max](Aabb::from_min_max)
    /// when min <= max is already established.
    pub fn from_min_max_unchecked(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Returns the minimum point of this `Aabb`
    pub fn min(&self) -> &Point3<f64> {
        &self.min
    }

    /// Returns the maximum point of this `Aabb`
    pub fn max(&self) -> &Point3<f64> {
        &self.max
    }

    /// Returns the extent of this `Aabb`, i.e. the size between its minimum
    /// and maximum position
    /// ```
    /// # use voxen_core::math::Aabb;
    /// # use voxen_core::nalgebra::{Point3, Vector3};
    /// let bounds = Aabb::from_min_max_unchecked(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
    /// assert_eq!(bounds.extent(), Vector3::new(2.0, 1.0, 1.0));
    /// ```
    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Returns true if the given point is contained within this `Aabb`. Points
    /// right on the boundary count as contained.
    /// ```
    /// # use voxen_core::math::Aabb;
    /// # use voxen_core::nalgebra::Point3;
    /// let bounds = Aabb::from_min_max_unchecked(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    /// assert!(bounds.contains(&Point3::new(0.5, 0.5, 1.0)));
    /// assert!(!bounds.contains(&Point3::new(1.5, 0.5, 0.5)));
    /// ```
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Computes the union of the given bounding boxes, i.e. the smallest
    /// `Aabb` that fully contains both `a` and `b`
    /// ```
    /// # use voxen_core::math::Aabb;
    /// # use voxen_core::nalgebra::Point3;
    /// let bounds_a = Aabb::from_min_max_unchecked(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    /// let bounds_b = Aabb::from_min_max_unchecked(Point3::new(2.0, -1.0, 0.5), Point3::new(3.0, 3.0, 3.0));
    /// let merged = Aabb::union(&bounds_a, &bounds_b);
    /// assert_eq!(*merged.min(), Point3::new(0.0, -1.0, 0.0));
    /// assert_eq!(*merged.max(), Point3::new(3.0, 3.0, 3.0));
    /// ```
    pub fn union(a: &Aabb, b: &Aabb) -> Aabb {
        Self {
            min: Point3::new(
                a.min.x.min(b.min.x),
                a.min.y.min(b.min.y),
                a.min.z.min(b.min.z),
            ),
            max: Point3::new(
                a.max.x.max(b.max.x),
                a.max.y.max(b.max.y),
                a.max.z.max(b.max.z),
            ),
        }
    }

    /// Extends the given `Aabb` so that it contains the given point
    /// ```
    /// # use voxen_core::math::Aabb;
    /// # use voxen_core::nalgebra::Point3;
    /// let bounds = Aabb::from_min_max_unchecked(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    /// let extended = Aabb::extend_with_point(&bounds, &Point3::new(2.0, -1.0, 0.5));
    /// assert_eq!(*extended.min(), Point3::new(0.0, -1.0, 0.0));
    /// assert_eq!(*extended.max(), Point3::new(2.0, 1.0, 1.0));
    /// ```
    pub fn extend_with_point(bounds: &Aabb, point: &Point3<f64>) -> Aabb {
        Self {
            min: Point3::new(
                bounds.min.x.min(point.x),
                bounds.min.y.min(point.y),
                bounds.min.z.min(point.z),
            ),
            max: Point3::new(
                bounds.max.x.max(point.x),
                bounds.max.y.max(point.y),
                bounds.max.z.max(point.z),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_min_max_rejects_non_finite() {
        let result = Aabb::from_min_max(
            Point3::new(0.0, f64::NAN, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let result = Aabb::from_min_max(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, f64::INFINITY, 1.0),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn from_min_max_rejects_inverted_axis() {
        let result = Aabb::from_min_max(
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn union_contains_both_boxes() {
        let a = Aabb::from_min_max_unchecked(Point3::new(-2.0, 0.0, 1.0), Point3::new(0.0, 1.0, 4.0));
        let b = Aabb::from_min_max_unchecked(Point3::new(-1.0, -3.0, 2.0), Point3::new(5.0, 0.5, 3.0));
        let merged = Aabb::union(&a, &b);
        assert_eq!(*merged.min(), Point3::new(-2.0, -3.0, 1.0));
        assert_eq!(*merged.max(), Point3::new(5.0, 1.0, 4.0));
        for bounds in [&a, &b] {
            assert!(merged.contains(bounds.min()));
            assert!(merged.contains(bounds.max()));
        }
    }

    #[test]
    fn from_min_max_accepts_degenerate_box() {
        // a single-point cloud has min == max, which is a valid anchor
        let point = Point3::new(3.0, -1.0, 2.5);
        let bounds = Aabb::from_min_max(point, point).unwrap();
        assert_eq!(bounds.extent(), Vector3::new(0.0, 0.0, 0.0));
        assert!(bounds.contains(&point));
    }
}
