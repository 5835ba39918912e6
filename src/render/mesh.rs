use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::f32::consts::PI;

use super::panorama::{uv_to_direction, Panorama};
use crate::picking::MeshShape;

const SEGMENTS: u32 = 32;

/// Cache key of a procedural mesh. Float parameters are compared bitwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshKey {
    kind: u8,
    params: [u32; 3],
    pub wireframe: bool,
}

impl MeshKey {
    pub fn new(shape: MeshShape, wireframe: bool) -> Self {
        let (kind, params) = match shape {
            MeshShape::Box { half_extents } => (0, half_extents.to_array()),
            MeshShape::Sphere { radius } => (1, [radius, 0.0, 0.0]),
            MeshShape::Plane { half_width, half_depth } => (2, [half_width, half_depth, 0.0]),
            MeshShape::Line { length } => (3, [length, 0.0, 0.0]),
            MeshShape::Disc { radius } => (4, [radius, 0.0, 0.0]),
            MeshShape::Ring { radius, tube } => (5, [radius, tube, 0.0]),
            MeshShape::Controller => (6, [0.0; 3]),
        };
        Self {
            kind,
            params: params.map(f32::to_bits),
            wireframe,
        }
    }
}

/// Whether [`MeshData::for_shape`] builds a line list for this shape.
pub fn draws_lines(shape: MeshShape, wireframe: bool) -> bool {
    match shape {
        MeshShape::Box { .. } | MeshShape::Sphere { .. } => wireframe,
        MeshShape::Plane { .. } | MeshShape::Line { .. } => true,
        MeshShape::Disc { .. } | MeshShape::Ring { .. } | MeshShape::Controller => false,
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Multiplied with the material color. White except on baked meshes.
    pub color: [f32; 4],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: Self::COLOR_OFFSET as wgpu::BufferAddress,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };

    pub const NORMAL_OFFSET: usize = std::mem::size_of::<[f32; 3]>();
    pub const COLOR_OFFSET: usize = std::mem::size_of::<[f32; 6]>();

    fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            color: [1.0; 4],
        }
    }

    fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}

/// CPU-side geometry, triangle list unless `lines` is set.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub lines: bool,
}

impl MeshData {
    pub fn for_shape(shape: MeshShape, wireframe: bool) -> Self {
        match shape {
            MeshShape::Box { half_extents } if wireframe => Self::wireframe_box(half_extents),
            MeshShape::Box { half_extents } => Self::solid_box(half_extents),
            MeshShape::Sphere { radius } if wireframe => Self::wireframe_sphere(radius, 16, 8),
            MeshShape::Sphere { radius } => Self::sphere(radius, 16, 12),
            MeshShape::Plane { half_width, half_depth } => Self::grid(half_width, half_depth, 1.0),
            MeshShape::Line { length } => Self::line(length),
            MeshShape::Disc { radius } => Self::ring(0.0, radius),
            MeshShape::Ring { radius, tube } => Self::ring((radius - tube).max(0.0), radius + tube),
            MeshShape::Controller => Self::solid_box(Vec3::new(0.02, 0.02, 0.08)),
        }
    }

    /// Inward-facing sphere with the panorama baked into vertex colors.
    pub fn panorama(panorama: &Panorama) -> Self {
        let (columns, rows) = panorama.bands();
        let image = panorama.image();
        let mut vertices = Vec::with_capacity(((columns + 1) * (rows + 1)) as usize);
        let mut indices = Vec::with_capacity((columns * rows * 6) as usize);

        for row in 0..=rows {
            let v = row as f32 / rows as f32;
            for column in 0..=columns {
                let u = column as f32 / columns as f32;
                let direction = uv_to_direction(u, v);
                // Sample at the texel center the vertex stands for, so the seam
                // column does not wrap around.
                let sample_dir = uv_to_direction(
                    (column as f32 + 0.5).min(columns as f32 - 0.5) / columns as f32,
                    v,
                );
                vertices.push(
                    Vertex::new(direction * panorama.radius(), -direction).with_color(image.sample(sample_dir)),
                );
            }
        }

        for row in 0..rows {
            for column in 0..columns {
                let a = row * (columns + 1) + column;
                let b = a + columns + 1;
                indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }

        Self {
            vertices,
            indices,
            lines: false,
        }
    }

    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            for seg in 0..=segments {
                let theta = 2.0 * PI * seg as f32 / segments as f32;
                let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                vertices.push(Vertex::new(n * radius, n));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let curr_ring = ring * (segments + 1);
                let next_ring = (ring + 1) * (segments + 1);

                indices.extend_from_slice(&[curr_ring + seg, next_ring + seg, next_ring + seg + 1]);
                indices.extend_from_slice(&[curr_ring + seg, next_ring + seg + 1, curr_ring + seg + 1]);
            }
        }

        Self {
            vertices,
            indices,
            lines: false,
        }
    }

    pub fn wireframe_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            let r = radius * phi.sin();
            let y = radius * phi.cos();

            let base_idx = vertices.len() as u32;
            for seg in 0..=segments {
                let theta = 2.0 * PI * seg as f32 / segments as f32;
                vertices.push(Vertex::new(Vec3::new(r * theta.cos(), y, r * theta.sin()), Vec3::Y));
                if seg < segments {
                    indices.extend_from_slice(&[base_idx + seg, base_idx + seg + 1]);
                }
            }
        }

        for seg in 0..segments {
            let theta = 2.0 * PI * seg as f32 / segments as f32;
            let base_idx = vertices.len() as u32;
            for ring in 0..=rings {
                let phi = PI * ring as f32 / rings as f32;
                let r = radius * phi.sin();
                vertices.push(Vertex::new(
                    Vec3::new(r * theta.cos(), radius * phi.cos(), r * theta.sin()),
                    Vec3::Y,
                ));
                if ring < rings {
                    indices.extend_from_slice(&[base_idx + ring, base_idx + ring + 1]);
                }
            }
        }

        Self {
            vertices,
            indices,
            lines: true,
        }
    }

    /// Box with per-face normals.
    pub fn solid_box(half_extents: Vec3) -> Self {
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for axis in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z] {
            let u = if axis.y.abs() > 0.5 { Vec3::X } else { Vec3::Y };
            let v = axis.cross(u);
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let corner = axis + u * su + v * sv;
                vertices.push(Vertex::new(corner * half_extents, axis));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            vertices,
            indices,
            lines: false,
        }
    }

    pub fn wireframe_box(half_extents: Vec3) -> Self {
        let h = half_extents;
        let vertices = [
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ]
        .into_iter()
        .map(|p| Vertex::new(p, Vec3::ZERO))
        .collect();

        let indices = vec![
            0, 1, 1, 2, 2, 3, 3, 0,
            4, 5, 5, 6, 6, 7, 7, 4,
            0, 4, 1, 5, 2, 6, 3, 7,
        ];

        Self {
            vertices,
            indices,
            lines: true,
        }
    }

    /// Wire grid on the x/z plane with lines every `spacing`.
    pub fn grid(half_width: f32, half_depth: f32, spacing: f32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let mut push = |a: Vec3, b: Vec3| {
            let base = vertices.len() as u32;
            vertices.push(Vertex::new(a, Vec3::Y));
            vertices.push(Vertex::new(b, Vec3::Y));
            indices.extend_from_slice(&[base, base + 1]);
        };

        let columns = (2.0 * half_width / spacing).round().max(1.0) as u32;
        for i in 0..=columns {
            let x = -half_width + 2.0 * half_width * i as f32 / columns as f32;
            push(Vec3::new(x, 0.0, -half_depth), Vec3::new(x, 0.0, half_depth));
        }
        let rows = (2.0 * half_depth / spacing).round().max(1.0) as u32;
        for i in 0..=rows {
            let z = -half_depth + 2.0 * half_depth * i as f32 / rows as f32;
            push(Vec3::new(-half_width, 0.0, z), Vec3::new(half_width, 0.0, z));
        }

        Self {
            vertices,
            indices,
            lines: true,
        }
    }

    pub fn line(length: f32) -> Self {
        Self {
            vertices: vec![
                Vertex::new(Vec3::ZERO, Vec3::Z),
                Vertex::new(Vec3::new(0.0, 0.0, -length), Vec3::Z),
            ],
            indices: vec![0, 1],
            lines: true,
        }
    }

    /// Flat annulus facing +y. An inner radius of zero gives a disc.
    pub fn ring(inner: f32, outer: f32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for seg in 0..=SEGMENTS {
            let theta = 2.0 * PI * seg as f32 / SEGMENTS as f32;
            let dir = Vec3::new(theta.cos(), 0.0, theta.sin());
            vertices.push(Vertex::new(dir * inner, Vec3::Y));
            vertices.push(Vertex::new(dir * outer, Vec3::Y));
        }
        for seg in 0..SEGMENTS {
            let base = seg * 2;
            indices.extend_from_slice(&[base, base + 1, base + 3, base, base + 3, base + 2]);
        }

        Self {
            vertices,
            indices,
            lines: false,
        }
    }
}

pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub lines: bool,
}

impl Mesh {
    pub fn from_data(device: &wgpu::Device, data: &MeshData) -> Self {
        use wgpu::util::DeviceExt;

        let label = if data.lines { "Line" } else { "Triangle" };
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
            lines: data.lines,
        }
    }

    pub fn for_shape(device: &wgpu::Device, shape: MeshShape, wireframe: bool) -> Self {
        Self::from_data(device, &MeshData::for_shape(shape, wireframe))
    }

    pub fn for_panorama(device: &wgpu::Device, panorama: &Panorama) -> Self {
        Self::from_data(device, &MeshData::panorama(panorama))
    }
}
