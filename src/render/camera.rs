use glam::{Mat4, Quat, Vec3, Vec4};

use crate::config::CameraSettings;

/// Perspective camera. In the flat view the matrices derive from position and
/// target; while a device pose drives rendering they are overridden.
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection_override: Option<Mat4>,
    view_override: Option<Mat4>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default())
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &CameraSettings) -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            fov: settings.fov_degrees.to_radians(),
            aspect: 1.0,
            near: settings.near,
            far: settings.far,
            projection_override: None,
            view_override: None,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view_override
            .unwrap_or_else(|| Mat4::look_at_rh(self.position, self.target, self.up))
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_override
            .unwrap_or_else(|| Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far))
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Recomputes the aspect ratio from a surface size.
    pub fn fit_to(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    /// Drive the camera from an eye of the device pose. The eye transform
    /// itself is carried by the scene root, so the camera stays at the
    /// reference-space origin.
    pub fn apply_pose(&mut self, projection: Mat4) {
        self.projection_override = Some(projection);
        self.view_override = Some(Mat4::IDENTITY);
    }

    pub fn clear_pose(&mut self) {
        self.projection_override = None;
        self.view_override = None;
    }

    pub fn is_pose_driven(&self) -> bool {
        self.projection_override.is_some()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize()
    }

    pub fn screen_to_ray(&self, ndc_x: f32, ndc_y: f32) -> (Vec3, Vec3) {
        let inv_view_proj = self.view_projection().inverse();

        let near_point = inv_view_proj * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far_point = inv_view_proj * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);

        let near = near_point.truncate() / near_point.w;
        let far = far_point.truncate() / far_point.w;

        let direction = (far - near).normalize();
        (near, direction)
    }
}

/// First-person look for the flat view: yaw around world up, pitch clamped
/// short of straight up or down.
pub struct LookController {
    pub yaw: f32,
    pub pitch: f32,
    pub sensitivity: f32,
    pub max_pitch: f32,
}

impl Default for LookController {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            sensitivity: 0.002,
            max_pitch: std::f32::consts::FRAC_PI_2 - 0.05,
        }
    }
}

impl LookController {
    pub fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw -= delta_x * self.sensitivity;
        self.pitch = (self.pitch - delta_y * self.sensitivity).clamp(-self.max_pitch, self.max_pitch);
    }

    pub fn heading(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    pub fn orientation(&self) -> Quat {
        self.heading() * Quat::from_rotation_x(self.pitch)
    }

    pub fn reset(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
    }

    pub fn update_camera(&self, camera: &mut Camera, eye: Vec3) {
        camera.position = eye;
        camera.target = eye + self.orientation() * Vec3::NEG_Z;
        camera.up = Vec3::Y;
    }
}
