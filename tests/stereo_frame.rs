use glam::{Mat4, Quat, Vec3};
use xr_webgpu::app::{scenes, XrApp};
use xr_webgpu::render::{BackendCall, FrameInput, FramebufferTarget, RecordingBackend, RenderState};
use xr_webgpu::xr::sim::{SimPose, SimSession, SimulatedHeadset};
use xr_webgpu::xr::{Handedness, HasViewport, SessionHandle, SessionOutcome, ViewerPose, Viewport};
use xr_webgpu::{reconcile_view_matrix, FrameRequest, RoomBounds, SessionMode, Transform};

fn granted(headset: &SimulatedHeadset, mode: SessionMode) -> SimSession {
    match headset.request(mode) {
        SessionOutcome::Granted(session) => session,
        _ => panic!("simulated headset refused a {mode} session"),
    }
}

#[test]
fn flat_ticks_render_once_with_surface_aspect() {
    let (scene, config) = scenes::spinning_cube();
    let mut state = RenderState::new(scene, config);
    let mut backend = RecordingBackend::new(1000, 500);

    for tick in 0..3 {
        let request = state.render_frame(
            &mut backend,
            FrameInput::<SimPose>::new(tick as f64 * 16.0, None),
            None::<&SimSession>,
        );
        assert_eq!(request, FrameRequest::Host);
    }

    let renders = backend.renders();
    assert_eq!(renders.len(), 3);
    for render in renders {
        assert_eq!(render.viewport, Viewport::full(1000, 500));
        let expected = Mat4::perspective_rh(state.camera.fov, 2.0, state.camera.near, state.camera.far);
        assert!(render.projection.abs_diff_eq(expected, 1e-6));
    }
}

#[test]
fn session_without_pose_only_reschedules() {
    let headset = SimulatedHeadset::default();
    let session = granted(&headset, SessionMode::Immersive);
    let mut state = RenderState::default();
    let mut backend = RecordingBackend::new(800, 600);

    let request = state.render_frame(&mut backend, FrameInput::<SimPose>::new(0.0, None), Some(&session));

    assert_eq!(request, FrameRequest::Session);
    assert_eq!(backend.renders().len(), 0);
    assert!(backend.calls().is_empty());
}

#[test]
fn two_views_render_into_their_viewports() {
    let headset = SimulatedHeadset::default().with_eye_resolution(800, 900);
    let session = granted(&headset, SessionMode::Immersive);
    let pose = headset.pose(SessionMode::Immersive, headset.head_at(0.5));
    let mut state = RenderState::default();
    let mut backend = RecordingBackend::new(1280, 720);

    state.render_frame(&mut backend, FrameInput::new(10.0, Some(&pose)), Some(&session));

    assert_eq!(
        backend.calls().iter().find(|c| matches!(c, BackendCall::BindFramebuffer(_))),
        Some(&BackendCall::BindFramebuffer(FramebufferTarget::Layer { width: 1600, height: 900 }))
    );
    assert_eq!(backend.count(|c| matches!(c, BackendCall::Clear)), 1);
    assert_eq!(backend.count(|c| matches!(c, BackendCall::ClearDepth)), 1);

    let layer = session.layer();
    let renders = backend.renders();
    assert_eq!(renders.len(), 2);
    for (render, view) in renders.iter().zip(pose.views().iter()) {
        assert_eq!(Some(render.viewport), layer.viewport(view));
        assert_eq!(render.projection, view.projection);
    }
    assert_eq!(backend.calls().last(), Some(&BackendCall::FinishFrame));
}

#[test]
fn zero_offset_leaves_eye_views_untouched() {
    let headset = SimulatedHeadset::default();
    let session = granted(&headset, SessionMode::Immersive);
    let mut state = RenderState::default();
    let mut backend = RecordingBackend::new(800, 600);

    for step in 0..8 {
        let yaw = step as f32 * std::f32::consts::FRAC_PI_4;
        let head = Transform::from_position_rotation(Vec3::new(0.3, 1.7, -0.2), Quat::from_rotation_y(yaw));
        let pose = headset.pose(SessionMode::Immersive, head);
        backend.take_calls();
        state.render_frame(&mut backend, FrameInput::new(step as f64, Some(&pose)), Some(&session));

        for (render, view) in backend.renders().iter().zip(pose.views().iter()) {
            assert!(render.scene_matrix.abs_diff_eq(view.view, 1e-5));
        }
    }
}

#[test]
fn offset_shifts_the_scene_against_the_user() {
    let headset = SimulatedHeadset::default();
    let session = granted(&headset, SessionMode::Immersive);
    let pose = headset.pose(SessionMode::Immersive, headset.head_at(2.0));
    let mut state = RenderState::default();
    let offset = state.locomotion.set_offset(Vec3::new(-1.5, 0.0, -4.0));
    let mut backend = RecordingBackend::new(800, 600);

    state.render_frame(&mut backend, FrameInput::new(0.0, Some(&pose)), Some(&session));

    for (render, view) in backend.renders().iter().zip(pose.views().iter()) {
        let expected = view.view * Mat4::from_translation(-offset);
        assert!(render.scene_matrix.abs_diff_eq(expected, 1e-4));
        assert!(render
            .scene_matrix
            .abs_diff_eq(reconcile_view_matrix(view.view, offset), 1e-5));
    }
}

#[test]
fn controllers_are_drawn_in_session_frames() {
    let headset = SimulatedHeadset::default();
    let (scene, config) = scenes::teleport_room(RoomBounds::default());
    let mut app: XrApp<SimSession> = XrApp::new(scene, config, headset.capabilities());
    let mut backend = RecordingBackend::new(800, 600);

    app.toggle();
    app.on_session_outcome(headset.request(SessionMode::Immersive), &mut backend);
    let baseline = app.render.scene.iter().filter(|o| o.visible).count();

    let controller = headset.controller(Handedness::Left, Vec3::new(-0.2, 1.2, -0.2), Vec3::new(0.0, 0.0, -2.0));
    let pose = headset.pose(SessionMode::Immersive, headset.head_at(0.0));
    backend.take_calls();
    app.frame(&mut backend, 0.0, Some(&pose), &[controller]);

    // Controller body, laser and ring cursor.
    for render in backend.renders() {
        assert_eq!(render.visible_objects, baseline + 3);
    }
}
