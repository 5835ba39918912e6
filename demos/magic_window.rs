//! Magic-window walking: hold "forward" while the simulated phone turns,
//! and watch the offset follow the heading until the room bounds stop it.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use log::info;
use xr_webgpu::app::{scenes, XrApp};
use xr_webgpu::render::RecordingBackend;
use xr_webgpu::xr::sim::{SimSession, SimulatedHeadset};
use xr_webgpu::xr::LifecycleEffect;
use xr_webgpu::{Direction, SessionMode, Transform};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let headset = SimulatedHeadset::default();
    let (scene, config) = scenes::box_room();
    let mut app: XrApp<SimSession> = XrApp::new(scene, config, headset.capabilities());
    let mut backend = RecordingBackend::new(720, 1280);

    if let Some(LifecycleEffect::RequestSession(mode)) = app.start_magic_window() {
        app.on_session_outcome(headset.request(mode), &mut backend);
    }
    info!("Session state: {}", app.lifecycle().state());

    app.render.locomotion.press(Direction::FORWARD);

    let mut timestamp = 0.0;
    for (label, yaw) in [("north", 0.0), ("west", FRAC_PI_2), ("south", 2.0 * FRAC_PI_2)] {
        // Pitch the phone down a little: only the yaw steers.
        let rotation = Quat::from_rotation_y(yaw) * Quat::from_rotation_x(-0.4);
        let pose = headset.pose(SessionMode::MagicWindow, Transform::from_position_rotation(Vec3::ZERO, rotation));
        for _ in 0..120 {
            app.frame(&mut backend, timestamp, Some(&pose), &[]);
            timestamp += 1000.0 / 60.0;
        }
        let offset = app.offset();
        info!("After walking {}: offset ({:.2}, {:.2}, {:.2})", label, offset.x, offset.y, offset.z);
    }

    app.render.locomotion.release(Direction::FORWARD);
    info!(
        "Bounds {:?}; {} frames rendered",
        app.render.locomotion.bounds(),
        backend.renders().len()
    );
}
