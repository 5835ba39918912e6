//! Simulated headset
//!
//! Deterministic stand-in for a platform immersive API. Produces stereo or
//! mono poses from a head transform and lays eyes out side by side in one
//! framebuffer. AR poses hit-test against a flat floor at y = 0. Used by the
//! native viewer, the headless demos and tests.

use glam::{Mat4, Vec3};

use super::input::{Handedness, InputSource};
use super::pose::{Eye, HasProjectionMatrix, HasViewTransform, HasViewport, ViewerPose, Viewport, XrView};
use super::session::{Capabilities, ReferenceSpaceKind, SessionHandle, SessionMode, SessionOutcome};
use crate::error::XrError;
use crate::math::Transform;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimView {
    pub eye: Eye,
    pub view: Mat4,
    pub projection: Mat4,
}

impl HasProjectionMatrix for SimView {
    fn projection_matrix(&self) -> Mat4 {
        self.projection
    }
}

impl HasViewTransform for SimView {
    fn view_matrix(&self) -> Mat4 {
        self.view
    }
}

impl XrView for SimView {
    fn eye(&self) -> Eye {
        self.eye
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimPose {
    views: Vec<SimView>,
    hit: Option<Mat4>,
}

impl SimPose {
    pub fn new(views: Vec<SimView>) -> Self {
        Self { views, hit: None }
    }

    pub fn with_hit(mut self, hit: Option<Mat4>) -> Self {
        self.hit = hit;
        self
    }
}

impl ViewerPose for SimPose {
    type View = SimView;

    fn views(&self) -> &[SimView] {
        &self.views
    }

    fn hit_test(&self) -> Option<Mat4> {
        self.hit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideBySideLayer {
    pub width: u32,
    pub height: u32,
}

impl SideBySideLayer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl HasViewport<SimView> for SideBySideLayer {
    fn viewport(&self, view: &SimView) -> Option<Viewport> {
        let half = self.width / 2;
        let viewport = match view.eye {
            Eye::Left => Viewport::new(0, 0, half, self.height),
            Eye::Right => Viewport::new(half, 0, self.width - half, self.height),
            Eye::None => Viewport::full(self.width, self.height),
        };
        (!viewport.is_empty()).then_some(viewport)
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimSession {
    mode: SessionMode,
    layer: SideBySideLayer,
}

impl SessionHandle for SimSession {
    type View = SimView;
    type Layer = SideBySideLayer;

    fn mode(&self) -> SessionMode {
        self.mode
    }

    fn reference_space(&self) -> ReferenceSpaceKind {
        self.mode.reference_space()
    }

    fn layer(&self) -> &SideBySideLayer {
        &self.layer
    }

    fn supports_hit_test(&self) -> bool {
        self.mode == SessionMode::ImmersiveAr
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedHeadset {
    pub capabilities: Capabilities,
    /// Another application holds the device; every request is rejected.
    pub busy: bool,
    pub eye_resolution: (u32, u32),
    pub ipd: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub head_height: f32,
}

impl Default for SimulatedHeadset {
    fn default() -> Self {
        Self {
            capabilities: Capabilities {
                immersive: true,
                magic_window: true,
                immersive_ar: true,
            },
            busy: false,
            eye_resolution: (960, 1080),
            ipd: 0.064,
            fov_y: 90.0_f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            head_height: 1.6,
        }
    }
}

impl SimulatedHeadset {
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_eye_resolution(mut self, width: u32, height: u32) -> Self {
        self.eye_resolution = (width, height);
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn request(&self, mode: SessionMode) -> SessionOutcome<SimSession> {
        if !self.capabilities.supports(mode) {
            return SessionOutcome::Rejected(XrError::Unsupported(mode));
        }
        if self.busy {
            return SessionOutcome::Rejected(XrError::Rejected(
                "the headset is in use by another application".into(),
            ));
        }
        let (w, h) = self.eye_resolution;
        let layer = match mode {
            SessionMode::Immersive => SideBySideLayer::new(w * 2, h),
            SessionMode::MagicWindow | SessionMode::ImmersiveAr => SideBySideLayer::new(w, h),
        };
        SessionOutcome::Granted(SimSession { mode, layer })
    }

    fn projection(&self) -> Mat4 {
        let (w, h) = self.eye_resolution;
        Mat4::perspective_rh(self.fov_y, w as f32 / h.max(1) as f32, self.near, self.far)
    }

    /// Pose for `head`, stereo for immersive sessions and mono otherwise.
    /// AR poses carry the point where the head's forward ray meets the floor.
    pub fn pose(&self, mode: SessionMode, head: Transform) -> SimPose {
        let projection = self.projection();
        let hit = floor_hit(head.position, head.forward());
        let head = head.to_matrix();
        match mode {
            SessionMode::Immersive => {
                let half_ipd = self.ipd * 0.5;
                let eye = |eye, x: f32| SimView {
                    eye,
                    view: (head * Mat4::from_translation(Vec3::new(x, 0.0, 0.0))).inverse(),
                    projection,
                };
                SimPose::new(vec![eye(Eye::Left, -half_ipd), eye(Eye::Right, half_ipd)])
            }
            SessionMode::MagicWindow => SimPose::new(vec![SimView {
                eye: Eye::None,
                view: head.inverse(),
                projection,
            }]),
            SessionMode::ImmersiveAr => SimPose::new(vec![SimView {
                eye: Eye::None,
                view: head.inverse(),
                projection,
            }])
            .with_hit(hit),
        }
    }

    /// Head looking around slowly, `time` in seconds.
    pub fn head_at(&self, time: f32) -> Transform {
        let yaw = (time * 0.5).sin() * 0.6;
        let pitch = (time * 0.3).sin() * 0.1;
        Transform::from_position_rotation(
            Vec3::new(0.0, self.head_height, 0.0),
            glam::Quat::from_rotation_y(yaw) * glam::Quat::from_rotation_x(pitch),
        )
    }

    /// Tracked controller held at `origin` and aimed at `target`, both in
    /// reference space.
    pub fn controller(&self, handedness: Handedness, origin: Vec3, target: Vec3) -> InputSource {
        InputSource::tracked_pointer(handedness, aim(origin, target))
    }
}

fn floor_hit(origin: Vec3, direction: Vec3) -> Option<Mat4> {
    if direction.y > -1e-4 || origin.y < 0.0 {
        return None;
    }
    let t = -origin.y / direction.y;
    Some(Mat4::from_translation(origin + direction * t))
}

/// Pose matrix at `origin` whose -z axis points at `target`.
pub fn aim(origin: Vec3, target: Vec3) -> Mat4 {
    let direction = target - origin;
    let up = if direction.normalize_or_zero().y.abs() > 0.999 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    Transform::look_at(origin, target, up).to_matrix()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eyes_are_split_side_by_side() {
        let headset = SimulatedHeadset::default().with_eye_resolution(100, 80);
        let SessionOutcome::Granted(session) = headset.request(SessionMode::Immersive) else {
            panic!("expected a session");
        };
        let pose = headset.pose(SessionMode::Immersive, headset.head_at(0.0));
        let layer = session.layer();
        let left = layer.viewport(&pose.views()[0]);
        let right = layer.viewport(&pose.views()[1]);
        assert_eq!(left, Some(Viewport::new(0, 0, 100, 80)));
        assert_eq!(right, Some(Viewport::new(100, 0, 100, 80)));
        assert_eq!(layer.framebuffer_size(), (200, 80));
    }

    #[test]
    fn eyes_are_separated_by_ipd() {
        let headset = SimulatedHeadset::default();
        let pose = headset.pose(SessionMode::Immersive, Transform::IDENTITY);
        let left = pose.views()[0].view.inverse().transform_point3(Vec3::ZERO);
        let right = pose.views()[1].view.inverse().transform_point3(Vec3::ZERO);
        assert!(((right - left).length() - headset.ipd).abs() < 1e-5);
    }

    #[test]
    fn busy_headset_rejects() {
        let headset = SimulatedHeadset {
            busy: true,
            ..Default::default()
        };
        assert!(matches!(
            headset.request(SessionMode::Immersive),
            SessionOutcome::Rejected(XrError::Rejected(_))
        ));
    }

    #[test]
    fn ar_pose_hits_the_floor_ahead() {
        let headset = SimulatedHeadset::default();
        let head = Transform::from_position_rotation(
            Vec3::new(0.0, 1.5, 0.0),
            glam::Quat::from_rotation_x(-std::f32::consts::FRAC_PI_4),
        );
        let pose = headset.pose(SessionMode::ImmersiveAr, head);
        assert_eq!(pose.views().len(), 1);
        let hit = pose.hit_test().expect("looking down at the floor");
        assert!(hit.transform_point3(Vec3::ZERO).abs_diff_eq(Vec3::new(0.0, 0.0, -1.5), 1e-4));

        let level = headset.pose(SessionMode::ImmersiveAr, Transform::from_position(Vec3::Y));
        assert!(level.hit_test().is_none());
        assert!(headset.pose(SessionMode::Immersive, head).hit_test().is_none());
    }

    #[test]
    fn aim_points_negative_z_at_target() {
        let m = aim(Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 0.0, -3.0));
        let dir = m.transform_vector3(Vec3::NEG_Z);
        let expected = (Vec3::new(2.0, -1.0, -3.0)).normalize();
        assert!(dir.abs_diff_eq(expected, 1e-5));
    }
}
