use glam::{Mat3, Mat4, Quat, Vec3};

use super::view::yaw_only;

/// Rigid pose with a scale, used for scene objects and for device poses
/// (grips, target rays, heads) once decomposed from their matrices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY, Vec3::ONE)
    }

    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self::new(position, rotation, Vec3::ONE)
    }

    /// Decomposes an affine matrix, e.g. a grip or target-ray pose.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self::new(position, rotation, scale)
    }

    /// Pose at `position` whose -z axis points at `target`.
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let forward = (target - position).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);
        let rotation = Quat::from_mat3(&Mat3::from_cols(right, up, -forward));
        Self::from_position_rotation(position, rotation)
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Pointing direction: -z, as for cameras and target rays.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Same transform, moved by `offset` in world space.
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            position: self.position + offset,
            ..*self
        }
    }

    /// Keeps only the heading of the rotation.
    pub fn heading(&self) -> Self {
        Self {
            rotation: yaw_only(self.rotation),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_matrix_recovers_components() {
        let original = Transform::new(
            Vec3::new(1.0, 2.0, -3.0),
            Quat::from_rotation_y(0.7),
            Vec3::splat(2.0),
        );
        let decomposed = Transform::from_matrix(original.to_matrix());

        assert!(decomposed.position.abs_diff_eq(original.position, 1e-5));
        assert!(decomposed.rotation.abs_diff_eq(original.rotation, 1e-5));
        assert!(decomposed.scale.abs_diff_eq(original.scale, 1e-5));
    }

    #[test]
    fn heading_drops_pitch() {
        let t = Transform::from_position_rotation(
            Vec3::ZERO,
            Quat::from_rotation_y(0.5) * Quat::from_rotation_x(0.3),
        );
        let forward = t.heading().forward();
        assert!(forward.y.abs() < 1e-5);
    }

    #[test]
    fn look_at_faces_the_target() {
        let t = Transform::look_at(Vec3::new(0.0, 1.0, 0.0), Vec3::new(3.0, 1.0, 0.0), Vec3::Y);
        assert!(t.forward().abs_diff_eq(Vec3::X, 1e-5));
        assert!(t.translated(Vec3::Z).position.abs_diff_eq(Vec3::new(0.0, 1.0, 1.0), 1e-6));
    }
}
