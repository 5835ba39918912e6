//! Equirectangular backdrops drawn on the inside of a sphere around the
//! viewer.

use std::f32::consts::{PI, TAU};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::Vec3;

use crate::error::RenderError;

static NEXT_PANORAMA_ID: AtomicU64 = AtomicU64::new(1);

/// Texture coordinates of a view direction in an equirectangular image.
///
/// Straight ahead (-z) lands in the middle of the image, up on the top row.
/// Turning right moves to the right of the image.
pub fn direction_to_uv(direction: Vec3) -> (f32, f32) {
    let d = direction.normalize_or_zero();
    let u = 0.5 + d.x.atan2(-d.z) / TAU;
    let v = d.y.clamp(-1.0, 1.0).acos() / PI;
    (u, v)
}

/// Inverse of [`direction_to_uv`].
pub fn uv_to_direction(u: f32, v: f32) -> Vec3 {
    let longitude = (u - 0.5) * TAU;
    let polar = v * PI;
    Vec3::new(polar.sin() * longitude.sin(), polar.cos(), -polar.sin() * longitude.cos())
}

/// RGBA8 image in equirectangular projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Equirect {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Equirect {
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Result<Self, RenderError> {
        if width == 0 || height == 0 || pixels.len() != (width * height) as usize {
            return Err(RenderError::Panorama {
                width,
                height,
                pixels: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    pub fn from_image(image: &image::RgbaImage) -> Result<Self, RenderError> {
        let pixels = image.pixels().map(|p| p.0).collect();
        Self::new(image.width(), image.height(), pixels)
    }

    /// Decodes a PNG or JPEG file already in memory.
    pub fn decode(bytes: &[u8]) -> Result<Self, RenderError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Self::from_image(&image)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, RenderError> {
        let image = image::open(path)?.to_rgba8();
        Self::from_image(&image)
    }

    /// Sky fading from `zenith` to `horizon`, over a flat `ground`.
    pub fn gradient(zenith: [u8; 3], horizon: [u8; 3], ground: [u8; 3]) -> Self {
        let (width, height) = (64, 32);
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for row in 0..height {
            let v = (row as f32 + 0.5) / height as f32;
            let color = if v < 0.5 {
                let t = (v / 0.5).powf(2.0);
                lerp(zenith, horizon, t)
            } else {
                ground
            };
            for _ in 0..width {
                pixels.push([color[0], color[1], color[2], 255]);
            }
        }
        Self { width, height, pixels }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Nearest texel seen along `direction`, as linear 0..1 floats.
    pub fn sample(&self, direction: Vec3) -> [f32; 4] {
        let (u, v) = direction_to_uv(direction);
        let x = ((u.rem_euclid(1.0) * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        self.pixels[(y * self.width + x) as usize].map(|c| c as f32 / 255.0)
    }
}

fn lerp(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    [0, 1, 2].map(|i| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * t).round() as u8)
}

/// Panorama shown around the scene, centered on the scene origin.
///
/// Every panorama gets a fresh id so backends can tell when the baked mesh
/// has to be rebuilt.
#[derive(Debug, Clone)]
pub struct Panorama {
    id: u64,
    radius: f32,
    image: Arc<Equirect>,
}

impl Panorama {
    pub fn new(image: Equirect, radius: f32) -> Self {
        Self {
            id: NEXT_PANORAMA_ID.fetch_add(1, Ordering::Relaxed),
            radius,
            image: Arc::new(image),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn image(&self) -> &Equirect {
        &self.image
    }

    /// Longitude and latitude bands of the baked sphere: one vertex per
    /// texel, capped.
    pub fn bands(&self) -> (u32, u32) {
        let (width, height) = self.image.dimensions();
        (width.clamp(16, 256), height.clamp(8, 128))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_is_the_image_center() {
        let (u, v) = direction_to_uv(Vec3::NEG_Z);
        assert!((u - 0.5).abs() < 1e-6 && (v - 0.5).abs() < 1e-6);
        assert!(direction_to_uv(Vec3::Y).1.abs() < 1e-6);
        assert!((direction_to_uv(Vec3::NEG_Y).1 - 1.0).abs() < 1e-6);
        assert!((direction_to_uv(Vec3::X).0 - 0.75).abs() < 1e-6);
    }

    #[test]
    fn uv_and_direction_agree() {
        for (u, v) in [(0.1, 0.2), (0.5, 0.5), (0.9, 0.7), (0.3, 0.95)] {
            let direction = uv_to_direction(u, v);
            assert!((direction.length() - 1.0).abs() < 1e-5);
            let (u2, v2) = direction_to_uv(direction);
            assert!((u - u2).abs() < 1e-4 && (v - v2).abs() < 1e-4, "{u} {v} -> {u2} {v2}");
        }
    }

    #[test]
    fn sample_reads_the_right_quadrant() {
        // Left half red, right half blue.
        let (width, height) = (4, 2);
        let pixels = (0..width * height)
            .map(|i| if i % width < width / 2 { [255, 0, 0, 255] } else { [0, 0, 255, 255] })
            .collect();
        let image = Equirect::new(width, height, pixels).expect("sized");
        assert_eq!(image.sample(Vec3::NEG_X), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(image.sample(Vec3::X), [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn mismatched_pixels_are_rejected() {
        assert!(Equirect::new(4, 2, vec![[0; 4]; 7]).is_err());
        assert!(Equirect::new(0, 0, Vec::new()).is_err());
    }

    #[test]
    fn gradient_has_sky_above_ground() {
        let sky = Equirect::gradient([20, 40, 120], [200, 200, 230], [60, 50, 40]);
        let up = sky.sample(Vec3::Y);
        let down = sky.sample(Vec3::NEG_Y);
        assert!(up[2] > up[0]);
        assert_eq!(down, [60.0 / 255.0, 50.0 / 255.0, 40.0 / 255.0, 1.0]);
    }

    #[test]
    fn panoramas_get_distinct_ids() {
        let a = Panorama::new(Equirect::gradient([0; 3], [0; 3], [0; 3]), 50.0);
        let b = Panorama::new(Equirect::gradient([0; 3], [0; 3], [0; 3]), 50.0);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
        assert_eq!(a.bands(), (64, 32));
    }
}
