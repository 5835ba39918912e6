//! One [`XrApp`] per demo: the render state plus the session lifecycle, with
//! the input handlers the entry points forward events to.

pub mod scenes;

use glam::Vec3;
use log::{debug, info, warn};
use winit::keyboard::KeyCode;

use crate::config::SceneConfig;
use crate::locomotion::Direction;
use crate::picking::{begin_grab, teleport, Ray};
use crate::render::{FrameInput, FrameRequest, RenderBackend, RenderState, Scene};
use crate::xr::{
    Capabilities, EntryPoint, InputSource, LifecycleEffect, SessionHandle, SessionLifecycle, SessionMode,
    SessionOutcome, ViewerPose,
};

pub struct XrApp<S: SessionHandle> {
    pub render: RenderState,
    lifecycle: SessionLifecycle<S>,
    joystick: Direction,
    deferred: Vec<SessionOutcome<S>>,
}

impl<S: SessionHandle> XrApp<S> {
    pub fn new(scene: Scene, config: SceneConfig, capabilities: Capabilities) -> Self {
        Self {
            render: RenderState::new(scene, config),
            lifecycle: SessionLifecycle::new(capabilities),
            joystick: Direction::STOPPED,
            deferred: Vec::new(),
        }
    }

    pub fn lifecycle(&self) -> &SessionLifecycle<S> {
        &self.lifecycle
    }

    pub fn entry_point(&self) -> EntryPoint {
        self.lifecycle.capabilities().entry_point()
    }

    pub fn entry_point_for(&self, mode: SessionMode) -> EntryPoint {
        self.lifecycle.capabilities().entry_point_for(mode)
    }

    pub fn offset(&self) -> Vec3 {
        self.render.locomotion.offset()
    }

    /// Session frame. `pose` is `None` when the platform had none to give.
    pub fn frame<B, P>(&mut self, backend: &mut B, timestamp: f64, pose: Option<&P>, inputs: &[InputSource]) -> FrameRequest
    where
        B: RenderBackend,
        P: ViewerPose<View = S::View>,
    {
        let frame = FrameInput::new(timestamp, pose).with_inputs(inputs);
        self.render.render_frame(backend, frame, self.lifecycle.session())
    }

    /// Host display tick. Ignored while a session drives the frames.
    pub fn flat_frame<B: RenderBackend>(&mut self, backend: &mut B, timestamp: f64) -> FrameRequest {
        if self.lifecycle.is_presenting() {
            return FrameRequest::Session;
        }
        self.render.render_flat(backend, timestamp)
    }

    /// Enter/exit button.
    pub fn toggle(&mut self) -> Vec<LifecycleEffect> {
        self.lifecycle.toggle().unwrap_or_else(|err| {
            warn!("XR: cannot toggle: {}", err);
            Vec::new()
        })
    }

    /// Enter/exit AR button.
    pub fn toggle_ar(&mut self) -> Vec<LifecycleEffect> {
        self.lifecycle.toggle_ar().unwrap_or_else(|err| {
            warn!("XR: cannot toggle AR: {}", err);
            Vec::new()
        })
    }

    pub fn start_magic_window(&mut self) -> Option<LifecycleEffect> {
        self.lifecycle.request_magic_window().unwrap_or_else(|err| {
            info!("XR: no magic window: {}", err);
            None
        })
    }

    pub fn on_session_outcome<B: RenderBackend>(&mut self, outcome: SessionOutcome<S>, backend: &mut B) -> Vec<LifecycleEffect> {
        self.lifecycle.apply(outcome, &mut self.render, backend)
    }

    /// Holds an outcome that arrived before the host had a backend to apply
    /// it with. [`replay_deferred`](Self::replay_deferred) applies it later.
    pub fn defer_outcome(&mut self, outcome: SessionOutcome<S>) {
        debug!("XR: holding a session outcome until the renderer is ready");
        self.deferred.push(outcome);
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Applies held outcomes in arrival order.
    pub fn replay_deferred<B: RenderBackend>(&mut self, backend: &mut B) -> Vec<LifecycleEffect> {
        let mut effects = Vec::new();
        for outcome in std::mem::take(&mut self.deferred) {
            effects.extend(self.lifecycle.apply(outcome, &mut self.render, backend));
        }
        effects
    }

    /// Select on an input source. In AR this places the model on the
    /// reticle; otherwise it teleports onto the configured floor.
    pub fn select(&mut self, input: &InputSource) -> Option<Vec3> {
        if self.render.placement.is_some() {
            return self.render.place();
        }
        let floor = self.render.config.teleport_target.as_deref()?;
        let target_ray = input.target_ray?;
        teleport(&self.render.scene, &mut self.render.locomotion, target_ray, floor)
    }

    /// Starts rotating the grab target if the input points at it.
    pub fn select_start(&mut self, input: &InputSource) -> bool {
        let Some(target) = self.render.config.grab_target.as_deref() else {
            return false;
        };
        self.render.grab = begin_grab(&self.render.scene, self.render.locomotion.offset(), input, target);
        self.render.grab.is_some()
    }

    pub fn select_end(&mut self) {
        self.render.grab = None;
    }

    /// Flat-view click at normalized device coordinates: teleport where the
    /// camera ray meets the floor.
    pub fn click(&mut self, ndc_x: f32, ndc_y: f32) -> Option<Vec3> {
        let floor = self.render.config.teleport_target.as_deref()?;
        let (origin, direction) = self.render.camera.screen_to_ray(ndc_x, ndc_y);
        let (_, hit) = self.render.scene.raycast_named(&Ray::new(origin, direction), floor)?;
        let offset = self.render.locomotion.teleport_to(hit.point);
        info!("Teleported to ({:.2}, {:.2}, {:.2})", offset.x, offset.y, offset.z);
        Some(offset)
    }

    /// Returns whether the key drives locomotion.
    pub fn key(&mut self, code: KeyCode, pressed: bool) -> bool {
        let Some(direction) = Direction::from_key_code(code) else {
            return false;
        };
        if pressed {
            self.render.locomotion.press(direction);
        } else {
            self.render.locomotion.release(direction);
        }
        true
    }

    /// On-screen joystick moved by (`dx`, `dy`) from its rest position.
    pub fn joystick(&mut self, dx: f32, dy: f32) {
        self.render.locomotion.release(self.joystick);
        self.joystick = Direction::from_joystick(dx, dy);
        self.render.locomotion.press(self.joystick);
    }

    pub fn joystick_release(&mut self) {
        self.render.locomotion.release(self.joystick);
        self.joystick = Direction::STOPPED;
    }

    pub fn look(&mut self, dx: f32, dy: f32) {
        self.render.look.rotate(dx, dy);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.render.resize(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingBackend;
    use crate::xr::sim::{SimSession, SimulatedHeadset};
    use crate::xr::{Handedness, SessionState};

    fn app() -> XrApp<SimSession> {
        let (scene, config) = scenes::teleport_room(Default::default());
        XrApp::new(scene, config, Capabilities::new(true, true))
    }

    #[test]
    fn joystick_replaces_previous_direction() {
        let mut app = app();
        app.joystick(0.0, -1.0);
        assert_eq!(app.render.locomotion.direction(), Direction::FORWARD);
        app.joystick(1.0, 0.0);
        assert_eq!(app.render.locomotion.direction(), Direction::RIGHT);
        app.joystick_release();
        assert!(app.render.locomotion.direction().is_stopped());
    }

    #[test]
    fn keys_map_to_directions() {
        let mut app = app();
        assert!(app.key(KeyCode::KeyW, true));
        assert!(app.key(KeyCode::ArrowLeft, true));
        assert!(app.render.locomotion.direction().contains(Direction::FORWARD));
        assert!(app.render.locomotion.direction().contains(Direction::LEFT));
        assert!(app.key(KeyCode::KeyW, false));
        assert!(!app.render.locomotion.direction().contains(Direction::FORWARD));
        assert!(!app.key(KeyCode::KeyV, true));
    }

    #[test]
    fn select_teleports_onto_floor() {
        let mut app = app();
        let headset = SimulatedHeadset::default();
        let input = headset.controller(Handedness::Right, Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 0.0, -3.0));
        let offset = app.select(&input).expect("floor hit");
        assert!(offset.abs_diff_eq(Vec3::new(2.0, 0.0, -3.0), 1e-4));
    }

    #[test]
    fn grab_starts_only_on_the_model() {
        let mut app = app();
        let headset = SimulatedHeadset::default();
        let at_model = headset.controller(Handedness::Left, Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, -2.0));
        let at_floor = headset.controller(Handedness::Left, Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, -1.0));
        assert!(!app.select_start(&at_floor));
        assert!(app.select_start(&at_model));
        app.select_end();
        assert!(app.render.grab.is_none());
    }

    #[test]
    fn flat_tick_is_skipped_while_presenting() {
        let mut app = app();
        let headset = SimulatedHeadset::default();
        let mut backend = RecordingBackend::new(800, 600);

        assert_eq!(app.toggle(), vec![LifecycleEffect::RequestSession(SessionMode::Immersive)]);
        app.on_session_outcome(headset.request(SessionMode::Immersive), &mut backend);
        assert_eq!(app.lifecycle().state(), SessionState::Active(SessionMode::Immersive));

        assert_eq!(app.flat_frame(&mut backend, 0.0), FrameRequest::Session);
        assert!(backend.renders().is_empty());
    }

    #[test]
    fn outcomes_wait_for_the_renderer() {
        let mut app = app();
        let headset = SimulatedHeadset::default();

        app.toggle();
        app.defer_outcome(headset.request(SessionMode::Immersive));
        assert!(app.has_deferred());
        assert_eq!(app.lifecycle().state(), SessionState::Requesting(SessionMode::Immersive));

        let mut backend = RecordingBackend::new(800, 600);
        assert_eq!(app.replay_deferred(&mut backend), vec![LifecycleEffect::StartSessionLoop]);
        assert_eq!(app.lifecycle().state(), SessionState::Active(SessionMode::Immersive));
        assert!(!app.has_deferred());
        assert!(app.replay_deferred(&mut backend).is_empty());
    }

    #[test]
    fn deferred_outcomes_replay_in_order() {
        let mut app = app();
        let headset = SimulatedHeadset::default();
        let mut backend = RecordingBackend::new(800, 600);

        app.toggle();
        app.defer_outcome(headset.request(SessionMode::Immersive));
        app.defer_outcome(SessionOutcome::Ended);
        let effects = app.replay_deferred(&mut backend);

        assert_eq!(
            effects,
            vec![
                LifecycleEffect::StartSessionLoop,
                LifecycleEffect::ResumeHostLoop,
                LifecycleEffect::RequestSession(SessionMode::MagicWindow),
            ]
        );
    }
}
