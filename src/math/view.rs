use glam::{Mat4, Quat, Vec3, Vec4};

/// Copy of `matrix` with its translation column zeroed.
pub fn strip_translation(matrix: Mat4) -> Mat4 {
    let mut rotation_only = matrix;
    rotation_only.w_axis = Vec4::W;
    rotation_only
}

/// Moves a view matrix by `position` expressed in head-relative space.
///
/// The position is carried through the rotation part of `view` and the
/// resulting pure translation is premultiplied onto the original matrix.
pub fn translate_view_matrix(view: Mat4, position: Vec3) -> Mat4 {
    let shifted = strip_translation(view).transform_point3(position);
    Mat4::from_translation(shifted) * view
}

/// Applies a user locomotion offset (world-space displacement of the user)
/// to an eye view matrix. A zero offset returns `view` unchanged.
pub fn reconcile_view_matrix(view: Mat4, offset: Vec3) -> Mat4 {
    translate_view_matrix(view, -offset)
}

pub fn view_rotation(view: Mat4) -> Quat {
    let (_, rotation, _) = view.to_scale_rotation_translation();
    rotation
}

/// Rotation about the vertical axis only: x and z are zeroed and the
/// remaining (y, w) pair renormalized. Degenerate inputs (pure pitch or roll
/// of 180 degrees) fall back to identity.
pub fn yaw_only(rotation: Quat) -> Quat {
    let norm = (rotation.w * rotation.w + rotation.y * rotation.y).sqrt();
    if norm < f32::EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_xyzw(0.0, rotation.y / norm, 0.0, rotation.w / norm)
}
