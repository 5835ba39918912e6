//! # xr-webgpu
//!
//! Frame loop, locomotion and session handling for room-scale XR demos, with
//! a wgpu renderer and a simulated headset for running without hardware.
//!
//! ## Features
//! - Stereo frame rendering that reconciles the head pose with a virtual
//!   locomotion offset
//! - Room-bounded locomotion: flat walking, magic-window walking, teleport
//! - Immersive / AR / magic-window session lifecycle as an explicit state machine
//! - Ray picking for teleport targets, pointer feedback and grab-to-rotate
//! - AR tap-to-place on hit-test surfaces, and 360 degree panorama backdrops
//! - Cross-platform: native viewer + WASM/WebXR entry point, with WebGL2
//!   drawing into the immersive layer
//!
//! ## Example
//! ```rust,ignore
//! use xr_webgpu::app::{scenes, XrApp};
//! use xr_webgpu::render::RecordingBackend;
//! use xr_webgpu::xr::sim::{SimSession, SimulatedHeadset};
//! use xr_webgpu::xr::SessionMode;
//!
//! let headset = SimulatedHeadset::default();
//! let (scene, config) = scenes::teleport_room(Default::default());
//! let mut app: XrApp<SimSession> = XrApp::new(scene, config, headset.capabilities());
//! let mut backend = RecordingBackend::new(1280, 720);
//!
//! app.toggle();
//! app.on_session_outcome(headset.request(SessionMode::Immersive), &mut backend);
//!
//! let pose = headset.pose(SessionMode::Immersive, headset.head_at(0.0));
//! app.frame(&mut backend, 0.0, Some(&pose), &[]);
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod locomotion;
pub mod math;
pub mod picking;
pub mod render;
pub mod xr;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::XrApp;
pub use config::{CameraSettings, LocomotionConfig, SceneConfig};
pub use error::{RenderError, XrError, XrResult};
pub use locomotion::{Direction, Locomotion, RoomBounds};
pub use math::{reconcile_view_matrix, yaw_only, Transform};
pub use picking::{Ray, RayHit};
pub use render::{FrameRequest, RenderBackend, RenderState};
pub use xr::{Capabilities, SessionLifecycle, SessionMode, SessionState};
