use glam::Mat4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
    /// Monoscopic view, e.g. a magic window.
    None,
}

pub trait HasProjectionMatrix {
    fn projection_matrix(&self) -> Mat4;
}

/// World-to-eye transform of a view for the current frame.
pub trait HasViewTransform {
    fn view_matrix(&self) -> Mat4;
}

pub trait XrView: HasProjectionMatrix + HasViewTransform {
    fn eye(&self) -> Eye {
        Eye::None
    }
}

/// Device pose for one frame. Views are ordered left to right.
pub trait ViewerPose {
    type View: XrView;

    fn views(&self) -> &[Self::View];

    /// Pose of the closest real surface along the viewer's center ray, in
    /// the session's reference space. Only AR sessions with hit testing
    /// report one.
    fn hit_test(&self) -> Option<Mat4> {
        None
    }
}

/// Pixel rectangle inside a framebuffer, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Converts a rectangle anchored at the bottom-left corner of a
    /// framebuffer `framebuffer_height` pixels tall.
    pub fn from_bottom_left(x: i32, y: i32, width: i32, height: i32, framebuffer_height: u32) -> Self {
        let top = framebuffer_height as i32 - y - height;
        Self::new(
            x.max(0) as u32,
            top.max(0) as u32,
            width.max(0) as u32,
            height.max(0) as u32,
        )
    }

    /// `(x, y, width, height)` with y measured from the bottom edge.
    pub fn to_bottom_left(&self, framebuffer_height: u32) -> (i32, i32, i32, i32) {
        let y = framebuffer_height as i32 - self.y as i32 - self.height as i32;
        (self.x as i32, y, self.width as i32, self.height as i32)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Render layer of a session: one shared framebuffer split into per-view
/// viewports.
pub trait HasViewport<V: ?Sized> {
    fn viewport(&self, view: &V) -> Option<Viewport>;

    fn framebuffer_size(&self) -> (u32, u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_left_rectangles_flip_to_top_left() {
        // Lower half of a 100 pixel tall framebuffer.
        let viewport = Viewport::from_bottom_left(10, 0, 50, 50, 100);
        assert_eq!(viewport, Viewport::new(10, 50, 50, 50));
        assert_eq!(viewport.to_bottom_left(100), (10, 0, 50, 50));

        let full = Viewport::from_bottom_left(0, 0, 640, 480, 480);
        assert_eq!(full, Viewport::full(640, 480));
    }

    #[test]
    fn oversized_rectangles_are_clamped_to_the_top() {
        let viewport = Viewport::from_bottom_left(-4, 20, 30, 100, 100);
        assert_eq!(viewport, Viewport::new(0, 0, 30, 100));
    }
}
