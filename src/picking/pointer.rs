use glam::{Mat4, Vec3};
use log::{debug, info};

use super::geometry::{MeshShape, VisualGeometry};
use super::grab::GrabState;
use super::ray::Ray;
use crate::config::SceneConfig;
use crate::locomotion::Locomotion;
use crate::math::Transform;
use crate::render::{Scene, TransientKind};
use crate::xr::InputSource;

pub const CURSOR_RADIUS: f32 = 0.05;
pub const TELEPORT_RING_RADIUS: f32 = 0.3;
const TELEPORT_RING_TUBE: f32 = 0.02;
/// Lasers and cursors stop this far short of the surface they hit.
const SURFACE_GAP: f32 = 0.1;

/// Ray along the -z axis of a target-ray pose, moved by the user's offset.
pub fn pointer_ray(target_ray: Mat4, offset: Vec3) -> Ray {
    let pose = Transform::from_matrix(target_ray).translated(offset);
    Ray::new(pose.position, pose.forward())
}

/// Moves the user to where `target_ray` meets the object called `floor`.
/// Returns the new offset, or `None` when the ray misses.
pub fn teleport(scene: &Scene, locomotion: &mut Locomotion, target_ray: Mat4, floor: &str) -> Option<Vec3> {
    let ray = pointer_ray(target_ray, locomotion.offset());
    let Some((_, hit)) = scene.raycast_named(&ray, floor) else {
        debug!("Teleport ray missed '{}'", floor);
        return None;
    };
    let offset = locomotion.teleport_to(hit.point);
    info!("Teleported to ({:.2}, {:.2}, {:.2})", offset.x, offset.y, offset.z);
    Some(offset)
}

/// Places controllers, lasers and cursors for this frame's input sources.
///
/// Casts the same rays as [`teleport`] but never touches the offset. The
/// grab target is highlighted while any ray rests on it and follows the grip
/// while `grab` is held.
pub fn update_input_visuals(
    scene: &mut Scene,
    offset: Vec3,
    inputs: &[InputSource],
    config: &SceneConfig,
    grab: Option<&GrabState>,
) {
    let mut hovered = false;

    for input in inputs {
        if let Some(grip) = input.grip {
            let controller = scene.transients_mut().acquire(TransientKind::Controller);
            controller.transform = Transform::from_matrix(grip).translated(offset);

            if let (Some(grab), Some(name)) = (grab, config.grab_target.as_deref()) {
                if let Some(target) = scene.find_mut(name) {
                    target.set_rest_rotation(grab.rotation(grip));
                }
            }
        }

        let Some(target_ray) = input.target_ray else {
            continue;
        };
        let pose = Transform::from_matrix(target_ray).translated(offset);
        let ray = Ray::new(pose.position, pose.forward());
        let hit = scene
            .raycast(&ray, |o| o.is_transient())
            .map(|(object, hit)| (object.name.clone(), object.transform.rotation, hit));

        let Some((name, surface_rotation, hit)) = hit else {
            scene.transients_mut().acquire(TransientKind::Cursor).visible = false;
            continue;
        };

        let length = (hit.t - SURFACE_GAP).max(0.0);
        if input.is_tracked_pointer() {
            let laser = scene.transients_mut().acquire(TransientKind::Laser);
            laser.transform = Transform::new(pose.position, pose.rotation, Vec3::new(1.0, 1.0, length));
        }

        let on_floor = config.teleport_target.as_deref() == Some(name.as_str());
        if config.grab_target.as_deref() == Some(name.as_str()) {
            hovered = true;
        }

        let shape = if on_floor && input.is_tracked_pointer() {
            MeshShape::Ring {
                radius: TELEPORT_RING_RADIUS,
                tube: TELEPORT_RING_TUBE,
            }
        } else {
            MeshShape::Disc {
                radius: CURSOR_RADIUS,
            }
        };
        let cursor = scene.transients_mut().acquire(TransientKind::Cursor);
        cursor.geometry = Box::new(VisualGeometry(shape));
        cursor.transform = Transform::from_position_rotation(ray.at(length), surface_rotation);
    }

    scene.transients_mut().end_frame();

    if let Some(name) = config.grab_target.as_deref() {
        if let Some(target) = scene.find_mut(name) {
            target.highlighted = hovered;
        }
    }
}
