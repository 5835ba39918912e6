use glam::{Mat4, Quat, Vec3};

use super::pointer::pointer_ray;
use crate::math::{yaw_only, Transform};
use crate::render::Scene;
use crate::xr::InputSource;

/// Grip orientation captured when a grab started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabState {
    start_inverse: Quat,
}

impl GrabState {
    pub fn new(grip: Mat4) -> Self {
        Self {
            start_inverse: Transform::from_matrix(grip).rotation.inverse(),
        }
    }

    /// Rotation for the grabbed object given the current grip: only the yaw
    /// travelled since the grab started, inverted.
    pub fn rotation(&self, grip: Mat4) -> Quat {
        let travelled = Transform::from_matrix(grip).rotation * self.start_inverse;
        yaw_only(travelled).inverse()
    }
}

/// Starts a grab when the input's pointer ray hits the object called `target`.
pub fn begin_grab(scene: &Scene, offset: Vec3, input: &InputSource, target: &str) -> Option<GrabState> {
    let ray = pointer_ray(input.target_ray?, offset);
    scene.raycast_named(&ray, target)?;
    let grip = input.grip.or(input.target_ray)?;
    Some(GrabState::new(grip))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_yaw_travel_is_kept() {
        let start = Mat4::from_quat(Quat::from_rotation_y(0.3));
        let grab = GrabState::new(start);
        let now = Mat4::from_quat(Quat::from_rotation_y(0.8) * Quat::from_rotation_x(0.4));
        let rotation = grab.rotation(now);
        assert_eq!(rotation.x, 0.0);
        assert_eq!(rotation.z, 0.0);
        assert!(rotation.abs_diff_eq(Quat::from_rotation_y(-0.5), 0.05));
    }

    #[test]
    fn unchanged_grip_gives_identity() {
        let grip = Mat4::from_rotation_translation(Quat::from_rotation_y(1.2), Vec3::new(0.2, 1.0, -0.3));
        let grab = GrabState::new(grip);
        assert!(grab.rotation(grip).abs_diff_eq(Quat::IDENTITY, 1e-5));
    }
}
