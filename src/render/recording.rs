use glam::Mat4;

use super::backend::{FramebufferTarget, RenderBackend};
use super::camera::Camera;
use super::scene::Scene;
use crate::xr::Viewport;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    BindFramebuffer(FramebufferTarget),
    SetViewport(Viewport),
    SetAutoClear(bool),
    Clear,
    ClearDepth,
    Render(RenderCall),
    FinishFrame,
}

/// Snapshot of one `render` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    pub viewport: Viewport,
    pub auto_clear: bool,
    pub projection: Mat4,
    pub view: Mat4,
    pub scene_matrix: Mat4,
    pub scene_auto_update: bool,
    pub visible_objects: usize,
    /// A panorama was drawn behind the objects.
    pub environment: bool,
}

/// Backend that records calls instead of drawing. Useful headless and as a
/// test double.
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    size: (u32, u32),
    target: FramebufferTarget,
    viewport: Viewport,
    auto_clear: bool,
    calls: Vec<BackendCall>,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            target: FramebufferTarget::Default,
            viewport: Viewport::full(width, height),
            auto_clear: true,
            calls: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn renders(&self) -> Vec<&RenderCall> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Render(render) => Some(render),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn target(&self) -> FramebufferTarget {
        self.target
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn auto_clear(&self) -> bool {
        self.auto_clear
    }
}

impl RenderBackend for RecordingBackend {
    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget) {
        self.target = target;
        self.calls.push(BackendCall::BindFramebuffer(target));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.calls.push(BackendCall::SetViewport(viewport));
    }

    fn set_auto_clear(&mut self, enabled: bool) {
        self.auto_clear = enabled;
        self.calls.push(BackendCall::SetAutoClear(enabled));
    }

    fn clear(&mut self) {
        self.calls.push(BackendCall::Clear);
    }

    fn clear_depth(&mut self) {
        self.calls.push(BackendCall::ClearDepth);
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) {
        self.calls.push(BackendCall::Render(RenderCall {
            viewport: self.viewport,
            auto_clear: self.auto_clear,
            projection: camera.projection_matrix(),
            view: camera.view_matrix(),
            scene_matrix: scene.matrix(),
            scene_auto_update: scene.matrix_auto_update(),
            visible_objects: scene.iter().filter(|o| o.visible).count(),
            environment: scene.visible_environment().is_some(),
        }));
    }

    fn finish_frame(&mut self) {
        self.calls.push(BackendCall::FinishFrame);
    }
}
