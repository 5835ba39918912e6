//! Headless walk through the teleport room: enter an immersive session on
//! the simulated headset, aim the controller at a few floor spots, teleport,
//! and report what each frame drew.

use glam::Vec3;
use log::info;
use xr_webgpu::app::{scenes, XrApp};
use xr_webgpu::render::{BackendCall, RecordingBackend};
use xr_webgpu::xr::sim::{SimSession, SimulatedHeadset};
use xr_webgpu::xr::{Handedness, LifecycleEffect};
use xr_webgpu::RoomBounds;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let headset = SimulatedHeadset::default();
    let (scene, config) = scenes::teleport_room(RoomBounds::default());
    let mut app: XrApp<SimSession> = XrApp::new(scene, config, headset.capabilities());
    let mut backend = RecordingBackend::new(1280, 720);

    for effect in app.toggle() {
        if let LifecycleEffect::RequestSession(mode) = effect {
            app.on_session_outcome(headset.request(mode), &mut backend);
        }
    }
    info!("Session state: {}", app.lifecycle().state());

    let hand = Vec3::new(0.2, 1.2, -0.2);
    let targets = [
        Vec3::new(2.0, 0.0, -3.0),
        Vec3::new(-3.5, 0.0, -5.5),
        // Past the east wall: the floor ends there, so this one misses.
        Vec3::new(10.0, 0.0, -1.0),
    ];

    let mut timestamp = 0.0;
    for target in targets {
        // Controller poses live in reference space, the floor in world space.
        let controller = headset.controller(Handedness::Right, hand, target - app.offset());
        match app.select(&controller) {
            Some(offset) => info!("Teleported towards {:?}, offset is now {:?}", target, offset),
            None => info!("Nothing to teleport to at {:?}", target),
        }

        for _ in 0..3 {
            let pose = headset.pose(xr_webgpu::SessionMode::Immersive, headset.head_at(timestamp as f32 / 1000.0));
            app.frame(&mut backend, timestamp, Some(&pose), &[controller]);
            timestamp += 1000.0 / 72.0;
        }

        let calls = backend.take_calls();
        let renders = calls.iter().filter(|c| matches!(c, BackendCall::Render(_))).count();
        let depth_clears = calls.iter().filter(|c| matches!(c, BackendCall::ClearDepth)).count();
        info!("3 frames: {} eye renders, {} depth clears", renders, depth_clears);
    }
}
