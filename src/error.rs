use thiserror::Error;

use crate::xr::SessionMode;

/// Failures around immersive session setup. None of these are fatal: the
/// application keeps rendering the flat view.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XrError {
    #[error("{0} sessions are not supported on this device")]
    Unsupported(SessionMode),

    #[error("session request rejected: {0}")]
    Rejected(String),

    #[error("session interrupted: {0}")]
    Interrupted(String),

    #[error("session has no render layer")]
    MissingLayer,
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter found")]
    NoAdapter,

    #[error("surface reports no usable texture format")]
    NoSurfaceFormat,

    #[error("failed to acquire device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("could not decode panorama: {0}")]
    Image(#[from] image::ImageError),

    #[error("panorama of {width}x{height} cannot hold {pixels} pixels")]
    Panorama { width: u32, height: u32, pixels: usize },

    #[error("WebGL: {0}")]
    WebGl(String),
}

pub type XrResult<T> = Result<T, XrError>;
