use glam::Mat4;

use super::geometry::Geometry;
use super::ray::{Ray, RayHit};

/// Intersects a ray with a geometry placed by `model`. The returned hit is in
/// the ray's space with `t` measured along the ray.
pub fn intersect_transformed(geometry: &dyn Geometry, model: Mat4, ray: &Ray) -> Option<RayHit> {
    if model.determinant().abs() < 1e-12 {
        return None;
    }
    let inverse = model.inverse();
    let local_hit = geometry.ray_intersect(&ray.transformed(inverse))?;

    let point = model.transform_point3(local_hit.point);
    let t = (point - ray.origin).dot(ray.direction);
    if !ray.contains(t) {
        return None;
    }
    let normal = inverse
        .transpose()
        .transform_vector3(local_hit.normal)
        .normalize_or_zero();

    Some(RayHit { t, point, normal })
}
