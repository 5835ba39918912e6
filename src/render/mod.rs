//! Scene graph, stereo frame loop and the backends it draws through.
//!
//! [`RenderState::render_frame`] owns the per-frame algorithm and talks to a
//! [`RenderBackend`]. [`WgpuBackend`] draws with wgpu, `WebGlBackend` draws
//! into a WebXR layer framebuffer in the browser, and [`RecordingBackend`]
//! records the calls for tests and headless runs. Both drawing backends
//! consume the same [`draw_list`].

pub mod backend;
pub mod camera;
pub mod context;
pub mod draw;
pub mod gpu;
pub mod mesh;
pub mod panorama;
pub mod pipeline;
pub mod recording;
pub mod scene;
pub mod stereo;
#[cfg(target_arch = "wasm32")]
pub mod webgl;

pub use backend::{FrameRequest, FramebufferTarget, RenderBackend};
pub use camera::{Camera, LookController};
pub use context::GpuContext;
pub use draw::{draw_list, DrawItem, DrawPass, DrawSource};
pub use gpu::WgpuBackend;
pub use mesh::{Mesh, MeshData, MeshKey, Vertex};
pub use panorama::{Equirect, Panorama};
pub use pipeline::{RenderPipelines, Uniforms};
pub use recording::{BackendCall, RecordingBackend, RenderCall};
pub use scene::{Animation, Material, Scene, SceneObject, TransientKind, TransientPool, HIGHLIGHT_OPACITY};
pub use stereo::{FrameInput, RenderState};
#[cfg(target_arch = "wasm32")]
pub use webgl::WebGlBackend;
