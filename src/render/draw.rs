use glam::Mat4;

use super::mesh::{draws_lines, MeshKey};
use super::scene::Scene;
use crate::picking::MeshShape;

/// Pipeline a draw goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPass {
    /// Triangles in their baked colors, no lighting.
    Unlit,
    /// Triangles lit by the fixed directional light.
    Lit,
    Lines,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawSource {
    Shape { shape: MeshShape, wireframe: bool },
    /// The scene's panorama, identified by its id.
    Environment(u64),
}

impl DrawSource {
    /// Cache key for procedural shapes.
    pub fn mesh_key(&self) -> Option<MeshKey> {
        match *self {
            DrawSource::Shape { shape, wireframe } => Some(MeshKey::new(shape, wireframe)),
            DrawSource::Environment(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub source: DrawSource,
    pub pass: DrawPass,
    pub model: Mat4,
    pub color: [f32; 4],
}

/// Everything `scene` shows right now, in submission order: the panorama
/// first, then lit triangles, then lines. Within a pass, scene order is kept.
pub fn draw_list(scene: &Scene) -> Vec<DrawItem> {
    let mut items = Vec::new();

    if let Some(panorama) = scene.visible_environment() {
        items.push(DrawItem {
            source: DrawSource::Environment(panorama.id()),
            pass: DrawPass::Unlit,
            model: scene.matrix(),
            color: [1.0; 4],
        });
    }

    let mut lines = Vec::new();
    for object in scene.iter().filter(|o| o.visible) {
        let shape = object.shape();
        let wireframe = object.material.wireframe;
        let item = DrawItem {
            source: DrawSource::Shape { shape, wireframe },
            pass: if draws_lines(shape, wireframe) {
                DrawPass::Lines
            } else {
                DrawPass::Lit
            },
            model: object.world_matrix(),
            color: object.color(),
        };
        match item.pass {
            DrawPass::Lines => lines.push(item),
            _ => items.push(item),
        }
    }

    items.extend(lines);
    items
}
