use glam::Vec3;
use std::fmt::Debug;

use super::ray::{Ray, RayHit};

/// Mesh a geometry is drawn with, in the object's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeshShape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Horizontal wire grid on the local x/z plane.
    Plane { half_width: f32, half_depth: f32 },
    /// Segment from the origin along -z.
    Line { length: f32 },
    /// Filled disc on the local x/z plane.
    Disc { radius: f32 },
    /// Flat ring on the local x/z plane.
    Ring { radius: f32, tube: f32 },
    Controller,
}

/// Local-space shape of a scene object.
pub trait Geometry: Send + Sync + Debug {
    /// Intersection with a ray in the object's local space.
    fn ray_intersect(&self, ray: &Ray) -> Option<RayHit>;
    fn clone_box(&self) -> Box<dyn Geometry>;
    fn render_shape(&self) -> MeshShape;
}

impl Clone for Box<dyn Geometry> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SphereGeometry {
    pub radius: f32,
}

impl SphereGeometry {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl Geometry for SphereGeometry {
    fn ray_intersect(&self, ray: &Ray) -> Option<RayHit> {
        let oc = ray.origin;
        let a = ray.direction.dot(ray.direction);
        let b = 2.0 * oc.dot(ray.direction);
        let c = oc.dot(oc) - self.radius * self.radius;
        let discriminant = b * b - 4.0 * a * c;

        if discriminant < 0.0 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        for t in [(-b - sqrt_d) / (2.0 * a), (-b + sqrt_d) / (2.0 * a)] {
            if ray.contains(t) {
                let point = ray.at(t);
                return Some(RayHit {
                    t,
                    point,
                    normal: point.normalize_or_zero(),
                });
            }
        }

        None
    }

    fn clone_box(&self) -> Box<dyn Geometry> {
        Box::new(*self)
    }

    fn render_shape(&self) -> MeshShape {
        MeshShape::Sphere {
            radius: self.radius,
        }
    }
}

/// Axis-aligned box centred on the local origin.
#[derive(Debug, Clone, Copy)]
pub struct BoxGeometry {
    pub half_extents: Vec3,
}

impl BoxGeometry {
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            half_extents: Vec3::new(width, height, depth) * 0.5,
        }
    }

    pub fn cube(size: f32) -> Self {
        Self::new(size, size, size)
    }

    fn surface_normal(&self, point: Vec3) -> Vec3 {
        let p = point / self.half_extents.max(Vec3::splat(0.0001));
        let abs_p = p.abs();
        if abs_p.x > abs_p.y && abs_p.x > abs_p.z {
            Vec3::X * p.x.signum()
        } else if abs_p.y > abs_p.z {
            Vec3::Y * p.y.signum()
        } else {
            Vec3::Z * p.z.signum()
        }
    }
}

impl Geometry for BoxGeometry {
    fn ray_intersect(&self, ray: &Ray) -> Option<RayHit> {
        let inv = |d: f32| if d.abs() > 0.0001 { 1.0 / d } else { f32::MAX };
        let inv_dir = Vec3::new(inv(ray.direction.x), inv(ray.direction.y), inv(ray.direction.z));

        let t1 = (-self.half_extents - ray.origin) * inv_dir;
        let t2 = (self.half_extents - ray.origin) * inv_dir;

        let t_min_v = t1.min(t2);
        let t_max_v = t1.max(t2);

        let t_near = t_min_v.x.max(t_min_v.y.max(t_min_v.z));
        let t_far = t_max_v.x.min(t_max_v.y.min(t_max_v.z));

        if t_near > t_far || t_far < ray.t_min {
            return None;
        }

        let t = if t_near > ray.t_min { t_near } else { t_far };
        if t > ray.t_max {
            return None;
        }

        let point = ray.at(t);
        Some(RayHit {
            t,
            point,
            normal: self.surface_normal(point),
        })
    }

    fn clone_box(&self) -> Box<dyn Geometry> {
        Box::new(*self)
    }

    fn render_shape(&self) -> MeshShape {
        MeshShape::Box {
            half_extents: self.half_extents,
        }
    }
}

/// Finite horizontal plane at local y = 0, hit from either side.
#[derive(Debug, Clone, Copy)]
pub struct PlaneGeometry {
    pub half_width: f32,
    pub half_depth: f32,
}

impl PlaneGeometry {
    pub fn new(width: f32, depth: f32) -> Self {
        Self {
            half_width: width * 0.5,
            half_depth: depth * 0.5,
        }
    }
}

impl Geometry for PlaneGeometry {
    fn ray_intersect(&self, ray: &Ray) -> Option<RayHit> {
        if ray.direction.y.abs() < 1e-6 {
            return None;
        }
        let t = -ray.origin.y / ray.direction.y;
        if !ray.contains(t) {
            return None;
        }
        let point = ray.at(t);
        if point.x.abs() > self.half_width || point.z.abs() > self.half_depth {
            return None;
        }
        let normal = if ray.direction.y < 0.0 { Vec3::Y } else { Vec3::NEG_Y };
        Some(RayHit { t, point, normal })
    }

    fn clone_box(&self) -> Box<dyn Geometry> {
        Box::new(*self)
    }

    fn render_shape(&self) -> MeshShape {
        MeshShape::Plane {
            half_width: self.half_width,
            half_depth: self.half_depth,
        }
    }
}

/// Shapes that are drawn but never picked.
#[derive(Debug, Clone, Copy)]
pub struct VisualGeometry(pub MeshShape);

impl Geometry for VisualGeometry {
    fn ray_intersect(&self, _ray: &Ray) -> Option<RayHit> {
        None
    }

    fn clone_box(&self) -> Box<dyn Geometry> {
        Box::new(*self)
    }

    fn render_shape(&self) -> MeshShape {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_hit_inside_extent() {
        let floor = PlaneGeometry::new(10.0, 10.0);
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let hit = floor.ray_intersect(&ray).expect("hit");
        assert!(hit.point.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
        assert_eq!(hit.normal, Vec3::Y);
    }

    #[test]
    fn plane_misses_outside_extent_and_when_parallel() {
        let floor = PlaneGeometry::new(2.0, 2.0);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(5.0, -1.0, 0.0));
        assert!(floor.ray_intersect(&ray).is_none());

        let flat = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert!(floor.ray_intersect(&flat).is_none());

        let away = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        assert!(floor.ray_intersect(&away).is_none());
    }

    #[test]
    fn box_front_face() {
        let cube = BoxGeometry::cube(2.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let hit = cube.ray_intersect(&ray).expect("hit");
        assert!((hit.t - 4.0).abs() < 1e-5);
        assert_eq!(hit.normal, Vec3::Z);
    }

    #[test]
    fn sphere_from_outside() {
        let sphere = SphereGeometry::new(1.0);
        let ray = Ray::new(Vec3::new(-3.0, 0.0, 0.0), Vec3::X);
        let hit = sphere.ray_intersect(&ray).expect("hit");
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!(hit.normal.abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn visuals_are_not_pickable() {
        let laser = VisualGeometry(MeshShape::Line { length: 1.0 });
        assert!(laser.ray_intersect(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).is_none());
    }
}
