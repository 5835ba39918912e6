//! Drives the session lifecycle through its transitions against the
//! simulated headset: enter, platform-driven end, magic-window fallback,
//! switch back to immersive, and a rejected request.

use std::collections::VecDeque;

use log::info;
use xr_webgpu::app::{scenes, XrApp};
use xr_webgpu::render::{FrameRequest, RecordingBackend};
use xr_webgpu::xr::sim::{SimSession, SimulatedHeadset};
use xr_webgpu::xr::{LifecycleEffect, SessionOutcome};

fn settle(
    app: &mut XrApp<SimSession>,
    headset: &SimulatedHeadset,
    backend: &mut RecordingBackend,
    effects: Vec<LifecycleEffect>,
) {
    let mut queue: VecDeque<LifecycleEffect> = effects.into();
    while let Some(effect) = queue.pop_front() {
        info!("Effect: {:?}", effect);
        match effect {
            LifecycleEffect::RequestSession(mode) => queue.extend(app.on_session_outcome(headset.request(mode), backend)),
            LifecycleEffect::EndSession => queue.extend(app.on_session_outcome(SessionOutcome::Ended, backend)),
            LifecycleEffect::StartSessionLoop | LifecycleEffect::ResumeHostLoop => {}
        }
    }
    info!("Now {}", app.lifecycle().state());
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut headset = SimulatedHeadset::default();
    let (scene, config) = scenes::spinning_cube();
    let mut app: XrApp<SimSession> = XrApp::new(scene, config, headset.capabilities());
    let mut backend = RecordingBackend::new(1280, 720);

    assert_eq!(app.flat_frame(&mut backend, 0.0), FrameRequest::Host);

    let effects = app.toggle();
    settle(&mut app, &headset, &mut backend, effects);

    info!("Headset taken off");
    let effects = app.on_session_outcome(SessionOutcome::Ended, &mut backend);
    settle(&mut app, &headset, &mut backend, effects);

    info!("Back to immersive from the magic window");
    let effects = app.toggle();
    settle(&mut app, &headset, &mut backend, effects);

    info!("Exit, with the headset busy elsewhere");
    headset.busy = true;
    let effects = app.toggle();
    settle(&mut app, &headset, &mut backend, effects);
}
