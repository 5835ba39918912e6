//! Ready-made scenes, each paired with the config it is meant to run with.

use glam::{Quat, Vec3};

use crate::config::{CameraSettings, SceneConfig};
use crate::locomotion::RoomBounds;
use crate::picking::{BoxGeometry, PlaneGeometry};
use crate::render::{Animation, Equirect, Material, Panorama, Scene, SceneObject};

pub const FLOOR: &str = "floor";
pub const MODEL: &str = "model";

const PANORAMA_RADIUS: f32 = 50.0;

const ROOM_HEIGHT: f32 = 3.0;

/// Wireframe room sized to `bounds`, with a floor to teleport on and a model
/// to grab in the middle.
pub fn teleport_room(bounds: RoomBounds) -> (Scene, SceneConfig) {
    let mut scene = Scene::new();
    let center = bounds.center();
    let width = bounds.max_x - bounds.min_x;
    let depth = bounds.max_z - bounds.min_z;
    let wall = Material::wireframe(0.45, 0.45, 0.55);

    scene.add(
        SceneObject::new(FLOOR, PlaneGeometry::new(width, depth))
            .with_position(center)
            .with_material(Material::wireframe(0.3, 0.6, 0.9)),
    );
    scene.add(
        SceneObject::new("roof", PlaneGeometry::new(width, depth))
            .with_position(center + Vec3::Y * ROOM_HEIGHT)
            .with_material(wall),
    );

    let half_height = ROOM_HEIGHT * 0.5;
    let walls = [
        ("wall-north", Vec3::new(center.x, half_height, bounds.min_z), Vec3::new(width, ROOM_HEIGHT, 0.05)),
        ("wall-south", Vec3::new(center.x, half_height, bounds.max_z), Vec3::new(width, ROOM_HEIGHT, 0.05)),
        ("wall-west", Vec3::new(bounds.min_x, half_height, center.z), Vec3::new(0.05, ROOM_HEIGHT, depth)),
        ("wall-east", Vec3::new(bounds.max_x, half_height, center.z), Vec3::new(0.05, ROOM_HEIGHT, depth)),
    ];
    for (name, position, size) in walls {
        scene.add(
            SceneObject::new(name, BoxGeometry::new(size.x, size.y, size.z))
                .with_position(position)
                .with_material(wall),
        );
    }

    scene.add(
        SceneObject::new(MODEL, BoxGeometry::new(0.4, 0.6, 0.4))
            .with_position(center + Vec3::new(0.0, 1.0, 0.0))
            .with_material(Material::solid(0.9, 0.55, 0.2)),
    );

    let config = SceneConfig::new()
        .with_bounds(bounds)
        .with_teleport_target(FLOOR)
        .with_grab_target(MODEL);
    (scene, config)
}

/// Ring of swaying boxes around the viewer.
pub fn box_room() -> (Scene, SceneConfig) {
    let mut scene = Scene::new();
    scene.add(
        SceneObject::new(FLOOR, PlaneGeometry::new(12.0, 12.0))
            .with_material(Material::wireframe(0.35, 0.35, 0.4)),
    );

    let count = 8;
    for i in 0..count {
        let angle = std::f32::consts::TAU * i as f32 / count as f32;
        let position = Vec3::new(angle.sin() * 3.0, 1.2 + 0.3 * (i % 3) as f32, -angle.cos() * 3.0);
        let hue = i as f32 / count as f32;
        scene.add(
            SceneObject::new(format!("box-{i}"), BoxGeometry::cube(0.5))
                .with_position(position)
                .with_rotation(Quat::from_rotation_y(angle))
                .with_material(Material::solid(0.3 + 0.6 * hue, 0.5, 0.9 - 0.6 * hue))
                .with_animation(Animation::Sway {
                    amplitude: 0.4,
                    speed: 0.5 + 0.1 * i as f32,
                }),
        );
    }

    (scene, SceneConfig::new().with_bounds(RoomBounds::square(5.0)))
}

/// One cube spinning in front of a stationary viewer.
pub fn spinning_cube() -> (Scene, SceneConfig) {
    let mut scene = Scene::new();
    scene.add(
        SceneObject::new(MODEL, BoxGeometry::cube(0.6))
            .with_position(Vec3::new(0.0, 1.6, -2.0))
            .with_material(Material::solid(0.2, 0.7, 0.4))
            .with_animation(Animation::Spin {
                rate: Vec3::new(0.5, 1.0, 0.0),
            }),
    );

    (scene, SceneConfig::new().with_walking(false))
}

/// A model to put down on real surfaces. Nothing else is drawn over the
/// passthrough.
pub fn ar_placement() -> (Scene, SceneConfig) {
    let mut scene = Scene::new();
    scene.add(
        SceneObject::new(MODEL, BoxGeometry::new(0.2, 0.3, 0.2))
            .with_material(Material::solid(0.9, 0.55, 0.2))
            .with_animation(Animation::Sway {
                amplitude: 0.15,
                speed: 1.5,
            }),
    );

    let config = SceneConfig::new()
        .with_walking(false)
        .with_place_target(MODEL)
        .with_transparent_clear();
    (scene, config)
}

/// 360 degree backdrop around a stationary viewer, with a cube floating in
/// front. `image` defaults to a generated sky.
pub fn panorama(image: Option<Equirect>) -> (Scene, SceneConfig) {
    let image = image.unwrap_or_else(|| Equirect::gradient([25, 45, 110], [190, 200, 225], [55, 60, 50]));
    let mut scene = Scene::new();
    scene.set_environment(Some(Panorama::new(image, PANORAMA_RADIUS)));
    scene.add(
        SceneObject::new(MODEL, BoxGeometry::cube(0.4))
            .with_position(Vec3::new(0.0, 0.0, -2.0))
            .with_material(Material::solid(0.85, 0.85, 0.9))
            .with_animation(Animation::Spin {
                rate: Vec3::new(0.0, 0.6, 0.0),
            }),
    );

    let config = SceneConfig::new()
        .with_walking(false)
        .with_eye_height(0.0)
        .with_camera(CameraSettings::default().with_clip(0.1, PANORAMA_RADIUS * 2.0));
    (scene, config)
}

/// Preset by name, as used on the command line and in page URLs.
pub fn by_name(name: &str) -> Option<(Scene, SceneConfig)> {
    match name {
        "teleport" => Some(teleport_room(RoomBounds::default())),
        "boxes" => Some(box_room()),
        "cube" => Some(spinning_cube()),
        "ar" => Some(ar_placement()),
        "panorama" => Some(panorama(None)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picking::Ray;

    #[test]
    fn teleport_room_floor_covers_bounds() {
        let bounds = RoomBounds::default();
        let (scene, config) = teleport_room(bounds);
        assert_eq!(config.teleport_target.as_deref(), Some(FLOOR));

        for corner in [
            Vec3::new(bounds.min_x + 0.1, 0.0, bounds.min_z + 0.1),
            Vec3::new(bounds.max_x - 0.1, 0.0, bounds.max_z - 0.1),
        ] {
            let ray = Ray::new(corner + Vec3::Y * 1.0, Vec3::NEG_Y);
            let (object, hit) = scene.raycast_named(&ray, FLOOR).expect("floor below");
            assert_eq!(object.name, FLOOR);
            assert!(hit.point.abs_diff_eq(corner, 1e-4));
        }
    }

    #[test]
    fn model_sits_above_the_floor() {
        let (scene, _) = teleport_room(RoomBounds::default());
        let model = scene.find(MODEL).expect("model");
        assert!(model.transform.position.y > 0.5);
    }

    #[test]
    fn presets_are_populated() {
        assert_eq!(box_room().0.objects().len(), 9);
        assert!(!spinning_cube().1.walking);
    }

    #[test]
    fn swaying_boxes_keep_their_heading() {
        let (mut scene, _) = box_room();
        scene.animate(0.0);
        let turned = scene.find("box-2").expect("box");
        assert!(!turned.rest_rotation().abs_diff_eq(Quat::IDENTITY, 1e-3));
        assert!(turned
            .transform
            .rotation
            .abs_diff_eq(turned.rest_rotation() * Quat::from_rotation_y(0.4), 1e-5));
    }

    #[test]
    fn ar_scene_places_its_only_model() {
        let (scene, config) = ar_placement();
        assert_eq!(config.place_target.as_deref(), Some(MODEL));
        assert_eq!(config.clear_color[3], 0.0);
        assert!(config.teleport_target.is_none());
        assert_eq!(scene.objects().len(), 1);
    }

    #[test]
    fn panorama_fits_inside_the_far_plane() {
        let (scene, config) = panorama(None);
        let environment = scene.environment().expect("panorama");
        assert!(environment.radius() < config.camera.far);
        assert_eq!(config.eye_height, 0.0);
    }

    #[test]
    fn presets_resolve_by_name() {
        for name in ["teleport", "boxes", "cube", "ar", "panorama"] {
            assert!(by_name(name).is_some(), "{name}");
        }
        assert!(by_name("lobby").is_none());
    }
}
