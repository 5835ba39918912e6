use glam::{Mat4, Quat, Vec3};

use super::{Direction, RoomBounds};
use crate::config::LocomotionConfig;
use crate::math::{view_rotation, yaw_only};

/// Accumulated user displacement plus the state that drives it.
#[derive(Debug, Clone)]
pub struct Locomotion {
    offset: Vec3,
    velocity: Vec3,
    direction: Direction,
    bounds: RoomBounds,
    config: LocomotionConfig,
}

impl Default for Locomotion {
    fn default() -> Self {
        Self::new(RoomBounds::default(), LocomotionConfig::default())
    }
}

impl Locomotion {
    pub fn new(bounds: RoomBounds, config: LocomotionConfig) -> Self {
        Self {
            offset: bounds.clamp(Vec3::ZERO),
            velocity: Vec3::ZERO,
            direction: Direction::STOPPED,
            bounds,
            config,
        }
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn bounds(&self) -> RoomBounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: RoomBounds) {
        self.bounds = bounds;
        self.offset = bounds.clamp(self.offset);
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn press(&mut self, direction: Direction) {
        self.direction.insert(direction);
    }

    pub fn release(&mut self, direction: Direction) {
        self.direction.remove(direction);
    }

    /// Back to the origin, or the nearest point of a room that excludes it.
    pub fn reset(&mut self) {
        self.offset = self.bounds.clamp(Vec3::ZERO);
        self.velocity = Vec3::ZERO;
    }

    /// Replaces the offset, clamped to the room. Returns the stored value.
    pub fn set_offset(&mut self, offset: Vec3) -> Vec3 {
        self.offset = self.bounds.clamp(offset);
        self.offset
    }

    pub fn translate(&mut self, delta: Vec3) -> Vec3 {
        self.set_offset(self.offset + delta)
    }

    /// Moves the user onto a floor point picked by a pointer ray.
    pub fn teleport_to(&mut self, point: Vec3) -> Vec3 {
        self.set_offset(Vec3::new(point.x, 0.0, point.z))
    }

    fn clamp_dt(&self, dt: f32) -> f32 {
        dt.clamp(0.0, self.config.max_frame_delta)
    }

    /// Flat view walking: damped velocity along the camera heading.
    pub fn step_flat(&mut self, dt: f32, heading: Quat) -> Vec3 {
        let dt = self.clamp_dt(dt);

        self.velocity.x -= self.velocity.x * self.config.damping * dt;
        self.velocity.z -= self.velocity.z * self.config.damping * dt;

        let distance = self.config.walk_acceleration * dt;
        if self.direction.contains(Direction::FORWARD) {
            self.velocity.z -= distance;
        }
        if self.direction.contains(Direction::BACKWARD) {
            self.velocity.z += distance;
        }
        if self.direction.contains(Direction::LEFT) {
            self.velocity.x -= distance;
        }
        if self.direction.contains(Direction::RIGHT) {
            self.velocity.x += distance;
        }

        let step = yaw_only(heading) * Vec3::new(self.velocity.x * dt, 0.0, self.velocity.z * dt);
        self.translate(step)
    }

    /// Magic-window movement: steps along the heading of the current eye.
    ///
    /// Opposing directions do not cancel; backward wins over forward and
    /// right wins over left.
    pub fn step_magic_window(&mut self, view: Mat4, dt: f32) -> Vec3 {
        let dt = self.clamp_dt(dt);
        let heading = yaw_only(view_rotation(view).inverse());

        let distance = self.config.magic_window_speed * dt * dt;
        let mut local = Vec3::ZERO;
        if self.direction.contains(Direction::FORWARD) {
            local.z = -distance;
        }
        if self.direction.contains(Direction::BACKWARD) {
            local.z = distance;
        }
        if self.direction.contains(Direction::LEFT) {
            local.x = -distance;
        }
        if self.direction.contains(Direction::RIGHT) {
            local.x = distance;
        }

        self.translate(heading * local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn view_facing(yaw: f32) -> Mat4 {
        Mat4::from_rotation_translation(Quat::from_rotation_y(yaw), Vec3::new(0.0, 1.6, 0.0)).inverse()
    }

    #[test]
    fn flat_walk_moves_along_heading() {
        let mut loco = Locomotion::default();
        loco.press(Direction::FORWARD);
        for _ in 0..5 {
            loco.step_flat(1.0 / 60.0, Quat::IDENTITY);
        }
        assert!(loco.offset().z < 0.0);
        assert!(loco.offset().x.abs() < 1e-6);

        let mut turned = Locomotion::default();
        turned.press(Direction::FORWARD);
        for _ in 0..5 {
            turned.step_flat(1.0 / 60.0, Quat::from_rotation_y(FRAC_PI_2));
        }
        // Facing -x after a quarter turn to the left.
        assert!(turned.offset().x < 0.0);
        assert!(turned.offset().z.abs() < 1e-5);
    }

    #[test]
    fn flat_walk_decays_after_release() {
        let mut loco = Locomotion::default();
        loco.press(Direction::RIGHT);
        for _ in 0..10 {
            loco.step_flat(1.0 / 60.0, Quat::IDENTITY);
        }
        loco.release(Direction::RIGHT);
        let before = loco.velocity().x;
        for _ in 0..30 {
            loco.step_flat(1.0 / 60.0, Quat::IDENTITY);
        }
        assert!(loco.velocity().x.abs() < before.abs() * 0.1);
    }

    #[test]
    fn magic_window_follows_eye_heading() {
        let mut loco = Locomotion::default();
        loco.press(Direction::FORWARD);
        let step = loco.step_magic_window(view_facing(0.0), 0.05);
        let expected = 70.0 * 0.05 * 0.05;
        assert!(step.abs_diff_eq(Vec3::new(0.0, 0.0, -expected), 1e-6));

        loco.reset();
        let step = loco.step_magic_window(view_facing(-FRAC_PI_2), 0.05);
        // Facing +x after a quarter turn to the right.
        assert!(step.abs_diff_eq(Vec3::new(expected, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn magic_window_ignores_head_pitch() {
        let pitched = Mat4::from_quat(Quat::from_rotation_x(-0.8)).inverse();
        let mut loco = Locomotion::default();
        loco.press(Direction::FORWARD);
        let step = loco.step_magic_window(pitched, 0.05);
        assert_eq!(step.y, 0.0);
        assert!(step.z < 0.0);
    }

    #[test]
    fn backward_overrides_forward() {
        let mut loco = Locomotion::default();
        loco.set_direction(Direction::FORWARD | Direction::BACKWARD);
        let step = loco.step_magic_window(Mat4::IDENTITY, 0.05);
        assert!(step.z > 0.0);
    }

    #[test]
    fn accumulation_is_pinned_at_bounds() {
        let bounds = RoomBounds::new((-1.0, 1.0), (-1.0, 1.0));
        let mut loco = Locomotion::new(bounds, LocomotionConfig::default());
        loco.press(Direction::FORWARD | Direction::LEFT);
        for _ in 0..2000 {
            loco.step_magic_window(Mat4::IDENTITY, 0.1);
            loco.step_flat(0.1, Quat::IDENTITY);
        }
        assert_eq!(loco.offset(), Vec3::new(-1.0, 0.0, -1.0));

        loco.translate(Vec3::new(50.0, 0.0, 50.0));
        assert_eq!(loco.offset(), Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn teleport_drops_height_and_clamps() {
        let mut loco = Locomotion::default();
        assert_eq!(loco.teleport_to(Vec3::new(2.0, -0.5, -3.0)), Vec3::new(2.0, 0.0, -3.0));
        assert_eq!(loco.teleport_to(Vec3::new(7.0, 0.0, 5.0)), Vec3::new(4.0, 0.0, 2.0));
    }

    #[test]
    fn oversized_frame_delta_is_capped() {
        let mut loco = Locomotion::default();
        loco.press(Direction::BACKWARD);
        let step = loco.step_magic_window(Mat4::IDENTITY, 5.0);
        assert!((step.z - 70.0 * 0.01).abs() < 1e-5);
    }
}
