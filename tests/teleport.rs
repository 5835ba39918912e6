use glam::Vec3;
use xr_webgpu::app::{scenes, XrApp};
use xr_webgpu::picking::{pointer_ray, teleport};
use xr_webgpu::xr::sim::{aim, SimSession, SimulatedHeadset};
use xr_webgpu::xr::{Handedness, InputSource};
use xr_webgpu::RoomBounds;

fn app() -> XrApp<SimSession> {
    let (scene, config) = scenes::teleport_room(RoomBounds::default());
    XrApp::new(scene, config, SimulatedHeadset::default().capabilities())
}

#[test]
fn floor_hit_becomes_the_offset() {
    let mut app = app();
    let input = InputSource::tracked_pointer(Handedness::Right, aim(Vec3::new(0.0, 1.5, 0.0), Vec3::new(2.0, 0.0, -3.0)));
    let offset = app.select(&input).expect("ray reaches the floor");
    assert!(offset.abs_diff_eq(Vec3::new(2.0, 0.0, -3.0), 1e-4));
    assert_eq!(app.offset(), offset);
}

#[test]
fn second_teleport_starts_from_the_new_offset() {
    let mut app = app();
    let headset = SimulatedHeadset::default();
    let hand = Vec3::new(0.0, 1.2, 0.0);

    let first = headset.controller(Handedness::Left, hand, Vec3::new(1.0, 0.0, -2.0));
    app.select(&first).expect("first hit");

    // Same reference-space pose, now cast from the new offset.
    let second = headset.controller(Handedness::Left, hand, Vec3::new(1.0, 0.0, -2.0));
    let offset = app.select(&second).expect("second hit");
    assert!(offset.abs_diff_eq(Vec3::new(2.0, 0.0, -4.0), 1e-4));
}

#[test]
fn misses_leave_the_offset_alone() {
    let mut app = app();
    app.render.locomotion.set_offset(Vec3::new(0.5, 0.0, -1.0));

    let skyward = InputSource::tracked_pointer(Handedness::Right, aim(Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.0, 5.0, -1.0)));
    assert_eq!(app.select(&skyward), None);

    let past_the_wall = InputSource::tracked_pointer(Handedness::Right, aim(Vec3::new(0.0, 1.5, 0.0), Vec3::new(12.0, 0.0, -1.0)));
    assert_eq!(app.select(&past_the_wall), None);
    assert_eq!(app.offset(), Vec3::new(0.5, 0.0, -1.0));
}

#[test]
fn teleport_result_is_clamped_to_the_room() {
    let mut app = app();
    // The floor still spans the default room; only the walkable area shrinks.
    app.render.locomotion.set_bounds(RoomBounds::new((-1.0, 1.0), (-1.0, 1.0)));

    let render = &mut app.render;
    let target_ray = aim(Vec3::new(0.0, 1.5, 0.0), Vec3::new(3.0, 0.0, -4.0));
    let offset = teleport(&render.scene, &mut render.locomotion, target_ray, scenes::FLOOR).expect("floor hit");
    assert_eq!(offset, Vec3::new(1.0, 0.0, -1.0));
}

#[test]
fn pointer_ray_follows_the_offset() {
    let pose = aim(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, -1.0));
    let ray = pointer_ray(pose, Vec3::new(3.0, 0.0, 2.0));
    assert!(ray.origin.abs_diff_eq(Vec3::new(3.0, 1.0, 2.0), 1e-5));
    assert!(ray.direction.abs_diff_eq(Vec3::NEG_Z, 1e-5));
}
