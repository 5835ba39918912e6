use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub t_min: f32,
    pub t_max: f32,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            t_min: 0.0001,
            t_max: f32::MAX,
        }
    }

    pub fn with_range(origin: Vec3, direction: Vec3, t_min: f32, t_max: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            t_min,
            t_max,
        }
    }

    /// Ray along the -z axis of a pose matrix.
    pub fn from_pose(pose: Mat4) -> Self {
        Self::new(
            pose.transform_point3(Vec3::ZERO),
            pose.transform_vector3(Vec3::NEG_Z),
        )
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Same ray expressed in the space `matrix` maps into. The direction is
    /// renormalized, so distances are not preserved under scaling.
    pub fn transformed(&self, matrix: Mat4) -> Self {
        Self {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction).normalize_or_zero(),
            t_min: self.t_min,
            t_max: f32::MAX,
        }
    }

    pub fn contains(&self, t: f32) -> bool {
        t > self.t_min && t < self.t_max
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub t: f32,
    pub point: Vec3,
    pub normal: Vec3,
}
