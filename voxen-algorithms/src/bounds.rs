use voxen_core::{math::Aabb, nalgebra::Point3, PointCloudView};

/// Calculates the bounding box of the points in the given `cloud` in a single
/// linear scan. Points with non-finite coordinates are skipped, consistent
/// with the skip policy of the algorithms. Returns `None` if the cloud
/// contains no point with finite coordinates.
/// ```
/// # use voxen_core::{nalgebra::Point3, PointCloudView};
/// # use voxen_algorithms::bounds::calculate_bounds;
/// let positions = [0.0_f32, 0.0, 0.0, 5.0, -1.0, 2.0];
/// let cloud = PointCloudView::new(&positions).unwrap();
/// let bounds = calculate_bounds(&cloud).unwrap();
/// assert_eq!(*bounds.min(), Point3::new(0.0, -1.0, 0.0));
/// assert_eq!(*bounds.max(), Point3::new(5.0, 0.0, 2.0));
/// ```
pub fn calculate_bounds(cloud: &PointCloudView) -> Option<Aabb> {
    let mut bounds: Option<Aabb> = None;
    for position in cloud.positions() {
        if !(position.x.is_finite() && position.y.is_finite() && position.z.is_finite()) {
            continue;
        }
        let point = Point3::from(position);
        bounds = Some(match bounds {
            Some(current) => Aabb::extend_with_point(&current, &point),
            None => Aabb::from_min_max_unchecked(point, point),
        });
    }
    bounds
}
