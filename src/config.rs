//! Per-scene configuration.

use crate::locomotion::RoomBounds;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 10000.0,
        }
    }
}

impl CameraSettings {
    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov_degrees = fov_degrees;
        self
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }
}

/// Tuning for keyboard/joystick driven movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionConfig {
    /// Velocity gained per second while a direction is held (flat view).
    pub walk_acceleration: f32,
    /// Fraction of velocity lost per second (flat view).
    pub damping: f32,
    /// Step scale for magic-window movement, applied as `speed * dt * dt`.
    pub magic_window_speed: f32,
    /// Upper bound on the frame delta fed to the integrators, in seconds.
    pub max_frame_delta: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            walk_acceleration: 100.0,
            damping: 10.0,
            magic_window_speed: 70.0,
            max_frame_delta: 0.1,
        }
    }
}

impl LocomotionConfig {
    pub fn with_walk(mut self, acceleration: f32, damping: f32) -> Self {
        self.walk_acceleration = acceleration;
        self.damping = damping;
        self
    }

    pub fn with_magic_window_speed(mut self, speed: f32) -> Self {
        self.magic_window_speed = speed;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub camera: CameraSettings,
    pub bounds: RoomBounds,
    pub locomotion: LocomotionConfig,
    /// Height of the flat-view camera above the locomotion offset.
    pub eye_height: f32,
    /// Flat-view keyboard walking.
    pub walking: bool,
    /// Name of the object that accepts teleport selections.
    pub teleport_target: Option<String>,
    /// Name of the object that can be grabbed and rotated.
    pub grab_target: Option<String>,
    /// Name of the object AR sessions place on detected surfaces.
    pub place_target: Option<String>,
    pub clear_color: [f64; 4],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraSettings::default(),
            bounds: RoomBounds::default(),
            locomotion: LocomotionConfig::default(),
            eye_height: 1.6,
            walking: true,
            teleport_target: None,
            grab_target: None,
            place_target: None,
            clear_color: [0.1, 0.1, 0.15, 1.0],
        }
    }
}

impl SceneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(mut self, camera: CameraSettings) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_bounds(mut self, bounds: RoomBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_locomotion(mut self, locomotion: LocomotionConfig) -> Self {
        self.locomotion = locomotion;
        self
    }

    pub fn with_eye_height(mut self, eye_height: f32) -> Self {
        self.eye_height = eye_height;
        self
    }

    pub fn with_walking(mut self, walking: bool) -> Self {
        self.walking = walking;
        self
    }

    pub fn with_teleport_target(mut self, name: impl Into<String>) -> Self {
        self.teleport_target = Some(name.into());
        self
    }

    pub fn with_grab_target(mut self, name: impl Into<String>) -> Self {
        self.grab_target = Some(name.into());
        self
    }

    pub fn with_place_target(mut self, name: impl Into<String>) -> Self {
        self.place_target = Some(name.into());
        self
    }

    pub fn with_clear_color(mut self, r: f64, g: f64, b: f64) -> Self {
        self.clear_color = [r, g, b, 1.0];
        self
    }

    /// Clears to fully transparent black, so passthrough shows behind the scene.
    pub fn with_transparent_clear(mut self) -> Self {
        self.clear_color = [0.0; 4];
        self
    }
}
