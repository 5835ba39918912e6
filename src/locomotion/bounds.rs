use glam::Vec3;

/// Walkable floor rectangle on the x/z plane. Height is never clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for RoomBounds {
    fn default() -> Self {
        Self {
            min_x: -4.0,
            max_x: 4.0,
            min_z: -6.0,
            max_z: 2.0,
        }
    }
}

impl RoomBounds {
    pub fn new(x: (f32, f32), z: (f32, f32)) -> Self {
        Self {
            min_x: x.0.min(x.1),
            max_x: x.0.max(x.1),
            min_z: z.0.min(z.1),
            max_z: z.0.max(z.1),
        }
    }

    /// Square room centered on the origin.
    pub fn square(half_extent: f32) -> Self {
        let h = half_extent.abs();
        Self::new((-h, h), (-h, h))
    }

    pub fn clamp(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.min_x, self.max_x),
            point.y,
            point.z.clamp(self.min_z, self.max_z),
        )
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.z >= self.min_z && point.z <= self.max_z
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min_x + self.max_x) * 0.5,
            0.0,
            (self.min_z + self.max_z) * 0.5,
        )
    }
}
