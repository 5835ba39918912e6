use glam::Mat4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRayMode {
    Gaze,
    TrackedPointer,
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    None,
    Left,
    Right,
}

/// One input source with the poses the platform reported for this frame,
/// expressed in the session's reference space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSource {
    pub handedness: Handedness,
    pub target_ray_mode: TargetRayMode,
    pub target_ray: Option<Mat4>,
    pub grip: Option<Mat4>,
}

impl InputSource {
    pub fn tracked_pointer(handedness: Handedness, target_ray: Mat4) -> Self {
        Self {
            handedness,
            target_ray_mode: TargetRayMode::TrackedPointer,
            target_ray: Some(target_ray),
            grip: Some(target_ray),
        }
    }

    pub fn gaze(target_ray: Mat4) -> Self {
        Self {
            handedness: Handedness::None,
            target_ray_mode: TargetRayMode::Gaze,
            target_ray: Some(target_ray),
            grip: None,
        }
    }

    pub fn with_grip(mut self, grip: Option<Mat4>) -> Self {
        self.grip = grip;
        self
    }

    pub fn is_tracked_pointer(&self) -> bool {
        self.target_ray_mode == TargetRayMode::TrackedPointer
    }
}
