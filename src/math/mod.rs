//! Math utilities module
//!
//! Provides glam re-exports, the scene-object [`Transform`], and the
//! view-space helpers used to reconcile head pose with user locomotion.

mod transform;
mod view;

pub use transform::Transform;
pub use view::{reconcile_view_matrix, strip_translation, translate_view_matrix, view_rotation, yaw_only};

// Re-export commonly used glam types
pub use glam::{Mat4, Quat, Vec3, Vec4};
