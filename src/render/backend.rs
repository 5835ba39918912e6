use super::camera::Camera;
use super::scene::Scene;
use crate::xr::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferTarget {
    /// The window or canvas surface.
    Default,
    /// A session render layer of the given size.
    Layer { width: u32, height: u32 },
}

/// Which scheduler should deliver the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    /// Host display refresh (winit redraw, `requestAnimationFrame`).
    Host,
    /// The immersive session's own frame loop.
    Session,
}

/// Retained scene renderer as seen by the frame loop.
///
/// With auto-clear on, every `render` clears color and depth first. With it
/// off, only explicit `clear`/`clear_depth` calls clear.
pub trait RenderBackend {
    fn surface_size(&self) -> (u32, u32);

    fn bind_framebuffer(&mut self, target: FramebufferTarget);

    fn set_viewport(&mut self, viewport: Viewport);

    fn set_auto_clear(&mut self, enabled: bool);

    /// Clears color and depth of the bound framebuffer.
    fn clear(&mut self);

    fn clear_depth(&mut self);

    fn render(&mut self, scene: &Scene, camera: &Camera);

    /// Submits and presents whatever the frame drew.
    fn finish_frame(&mut self);
}
