use glam::Vec3;
use xr_webgpu::app::{scenes, XrApp};
use xr_webgpu::render::{FramebufferTarget, RecordingBackend, RenderState};
use xr_webgpu::xr::sim::{SimSession, SimulatedHeadset};
use xr_webgpu::xr::{Capabilities, EntryPoint, Handedness, LifecycleEffect, SessionOutcome, Viewport};
use xr_webgpu::{RoomBounds, SessionLifecycle, SessionMode, SessionState, XrError};

/// Everything the cleanup after a session is expected to restore.
#[derive(Debug, PartialEq)]
struct Snapshot {
    state: SessionState,
    target: FramebufferTarget,
    viewport: Viewport,
    auto_clear: bool,
    pose_driven: bool,
    aspect: f32,
    scene_auto_update: bool,
    scene_matrix: glam::Mat4,
    visible_transients: usize,
    grabbing: bool,
}

fn snapshot(app: &XrApp<SimSession>, backend: &RecordingBackend) -> Snapshot {
    let render = &app.render;
    Snapshot {
        state: app.lifecycle().state(),
        target: backend.target(),
        viewport: backend.viewport(),
        auto_clear: backend.auto_clear(),
        pose_driven: render.camera.is_pose_driven(),
        aspect: render.camera.aspect,
        scene_auto_update: render.scene.matrix_auto_update(),
        scene_matrix: render.scene.matrix(),
        visible_transients: render.scene.iter().filter(|o| o.visible && o.is_transient()).count(),
        grabbing: render.grab.is_some(),
    }
}

/// Enters an immersive session and renders a few frames with a controller
/// resting on the model, mid-grab.
fn presenting() -> (XrApp<SimSession>, RecordingBackend, SimulatedHeadset) {
    let headset = SimulatedHeadset::default().with_capabilities(Capabilities::new(true, false));
    let (scene, config) = scenes::teleport_room(RoomBounds::default());
    let mut app = XrApp::new(scene, config, headset.capabilities());
    let mut backend = RecordingBackend::new(1024, 768);

    assert_eq!(app.toggle(), vec![LifecycleEffect::RequestSession(SessionMode::Immersive)]);
    assert_eq!(
        app.on_session_outcome(headset.request(SessionMode::Immersive), &mut backend),
        vec![LifecycleEffect::StartSessionLoop]
    );

    let controller = headset.controller(Handedness::Right, Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, -2.0));
    assert!(app.select_start(&controller));
    for frame in 0..3 {
        let pose = headset.pose(SessionMode::Immersive, headset.head_at(frame as f32 * 0.1));
        app.frame(&mut backend, frame as f64 * 11.0, Some(&pose), &[controller]);
    }
    (app, backend, headset)
}

#[test]
fn explicit_and_platform_end_leave_identical_state() {
    let (mut explicit, mut explicit_backend, _) = presenting();
    assert_eq!(explicit.toggle(), vec![LifecycleEffect::EndSession]);
    assert_eq!(explicit.lifecycle().state(), SessionState::Ending(SessionMode::Immersive));
    let explicit_effects = explicit.on_session_outcome(SessionOutcome::Ended, &mut explicit_backend);

    let (mut platform, mut platform_backend, _) = presenting();
    let platform_effects = platform.on_session_outcome(SessionOutcome::Ended, &mut platform_backend);

    assert_eq!(explicit_effects, vec![LifecycleEffect::ResumeHostLoop]);
    assert_eq!(explicit_effects, platform_effects);

    let explicit_state = snapshot(&explicit, &explicit_backend);
    assert_eq!(explicit_state, snapshot(&platform, &platform_backend));
    assert_eq!(
        explicit_state,
        Snapshot {
            state: SessionState::Inactive,
            target: FramebufferTarget::Default,
            viewport: Viewport::full(1024, 768),
            auto_clear: true,
            pose_driven: false,
            aspect: 1024.0 / 768.0,
            scene_auto_update: true,
            scene_matrix: glam::Mat4::IDENTITY,
            visible_transients: 0,
            grabbing: false,
        }
    );
}

#[test]
fn immersive_end_falls_back_to_magic_window() {
    let headset = SimulatedHeadset::default();
    let (scene, config) = scenes::box_room();
    let mut app: XrApp<SimSession> = XrApp::new(scene, config, headset.capabilities());
    let mut backend = RecordingBackend::new(640, 480);

    app.toggle();
    app.on_session_outcome(headset.request(SessionMode::Immersive), &mut backend);
    let effects = app.on_session_outcome(SessionOutcome::Ended, &mut backend);
    assert_eq!(
        effects,
        vec![
            LifecycleEffect::ResumeHostLoop,
            LifecycleEffect::RequestSession(SessionMode::MagicWindow),
        ]
    );
    assert_eq!(app.lifecycle().state(), SessionState::Requesting(SessionMode::MagicWindow));
}

#[test]
fn magic_window_start_resets_the_offset() {
    let headset = SimulatedHeadset::default();
    let (scene, config) = scenes::box_room();
    let mut app: XrApp<SimSession> = XrApp::new(scene, config, headset.capabilities());
    let mut backend = RecordingBackend::new(640, 480);
    app.render.locomotion.set_offset(Vec3::new(1.0, 0.0, 1.0));

    let request = app.start_magic_window();
    assert_eq!(request, Some(LifecycleEffect::RequestSession(SessionMode::MagicWindow)));
    app.on_session_outcome(headset.request(SessionMode::MagicWindow), &mut backend);

    assert_eq!(app.lifecycle().state(), SessionState::Active(SessionMode::MagicWindow));
    assert_eq!(app.offset(), Vec3::ZERO);
}

#[test]
fn rejection_returns_to_inactive_and_allows_retry() {
    let mut headset = SimulatedHeadset::default();
    headset.busy = true;
    let mut lifecycle: SessionLifecycle<SimSession> = SessionLifecycle::new(headset.capabilities());
    let mut render = RenderState::default();
    let mut backend = RecordingBackend::new(640, 480);

    lifecycle.toggle().expect("immersive supported");
    let effects = lifecycle.apply(headset.request(SessionMode::Immersive), &mut render, &mut backend);
    assert!(effects.is_empty());
    assert_eq!(lifecycle.state(), SessionState::Inactive);
    assert!(backend.calls().is_empty());

    headset.busy = false;
    assert_eq!(
        lifecycle.toggle(),
        Ok(vec![LifecycleEffect::RequestSession(SessionMode::Immersive)])
    );
}

#[test]
fn missing_capability_hides_the_entry_point() {
    let mut lifecycle: SessionLifecycle<SimSession> = SessionLifecycle::new(Capabilities::none());
    assert_eq!(lifecycle.capabilities().entry_point(), EntryPoint::Hidden);
    assert_eq!(lifecycle.toggle(), Err(XrError::Unsupported(SessionMode::Immersive)));
    assert_eq!(lifecycle.request_magic_window(), Err(XrError::Unsupported(SessionMode::MagicWindow)));
    assert_eq!(lifecycle.state(), SessionState::Inactive);
}

#[test]
fn toggling_mid_request_is_ignored() {
    let headset = SimulatedHeadset::default();
    let mut lifecycle: SessionLifecycle<SimSession> = SessionLifecycle::new(headset.capabilities());
    lifecycle.toggle().expect("immersive supported");
    assert_eq!(lifecycle.toggle(), Ok(Vec::new()));
    assert_eq!(lifecycle.state(), SessionState::Requesting(SessionMode::Immersive));
}
