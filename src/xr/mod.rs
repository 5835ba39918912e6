//! Platform immersive API seams
//!
//! Platform objects (views, layers, sessions, input sources) are consumed
//! through narrow capability traits so the frame loop and session lifecycle
//! can run against WebXR in the browser or against the simulated headset.

mod input;
mod pose;
mod session;
pub mod sim;

pub use input::{Handedness, InputSource, TargetRayMode};
pub use pose::{Eye, HasProjectionMatrix, HasViewTransform, HasViewport, ViewerPose, Viewport, XrView};
pub use session::{
    Capabilities, EntryPoint, LifecycleEffect, ReferenceSpaceKind, SessionHandle, SessionLifecycle,
    SessionMode, SessionOutcome, SessionState,
};
