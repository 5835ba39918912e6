use glam::Vec3;
use log::{debug, info, trace, warn};

use super::backend::{FrameRequest, FramebufferTarget, RenderBackend};
use super::camera::{Camera, LookController};
use super::scene::Scene;
use crate::config::SceneConfig;
use crate::locomotion::Locomotion;
use crate::math::{reconcile_view_matrix, Transform};
use crate::picking::{update_input_visuals, GrabState, Placement, Ray};
use crate::xr::{HasProjectionMatrix, HasViewTransform, HasViewport, InputSource, SessionHandle, SessionMode, ViewerPose, Viewport};

/// Per-frame data handed over by the scheduler.
pub struct FrameInput<'a, P> {
    /// Milliseconds, monotonic.
    pub timestamp: f64,
    /// `None` while the platform has no pose for this frame.
    pub pose: Option<&'a P>,
    pub inputs: &'a [InputSource],
}

impl<'a, P> FrameInput<'a, P> {
    pub fn new(timestamp: f64, pose: Option<&'a P>) -> Self {
        Self {
            timestamp,
            pose,
            inputs: &[],
        }
    }

    pub fn with_inputs(mut self, inputs: &'a [InputSource]) -> Self {
        self.inputs = inputs;
        self
    }
}

/// Everything one demo mutates from frame to frame.
pub struct RenderState {
    pub camera: Camera,
    pub scene: Scene,
    pub locomotion: Locomotion,
    pub look: LookController,
    pub config: SceneConfig,
    pub grab: Option<GrabState>,
    /// Tap-to-place state while an AR session runs.
    pub placement: Option<Placement>,
    last_timestamp: Option<f64>,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new(Scene::new(), SceneConfig::default())
    }
}

impl RenderState {
    pub fn new(scene: Scene, config: SceneConfig) -> Self {
        Self {
            camera: Camera::from_settings(&config.camera),
            scene,
            locomotion: Locomotion::new(config.bounds, config.locomotion),
            look: LookController::default(),
            config,
            grab: None,
            placement: None,
            last_timestamp: None,
        }
    }

    fn advance_clock(&mut self, timestamp: f64) -> f32 {
        let dt = self
            .last_timestamp
            .map(|previous| ((timestamp - previous) / 1000.0) as f32)
            .unwrap_or(0.0)
            .max(0.0);
        self.last_timestamp = Some(timestamp);
        dt
    }

    /// Hides the configured place target until the user puts it on a surface.
    pub fn begin_placement(&mut self) {
        let Some(name) = self.config.place_target.as_deref() else {
            debug!("AR: no place target configured");
            return;
        };
        self.placement = Placement::begin(&mut self.scene, name);
        if self.placement.is_none() {
            warn!("AR: place target '{}' is not in the scene", name);
        }
    }

    /// Puts the place target where the reticle is.
    pub fn place(&mut self) -> Option<Vec3> {
        self.placement.as_mut()?.place(&mut self.scene)
    }

    /// Renders one frame and says which scheduler should deliver the next.
    ///
    /// Without a session this is the flat view. With one, a missing pose
    /// skips the frame; otherwise every view is drawn into its viewport of
    /// the session layer.
    pub fn render_frame<B, S, P>(&mut self, backend: &mut B, frame: FrameInput<'_, P>, session: Option<&S>) -> FrameRequest
    where
        B: RenderBackend,
        S: SessionHandle,
        P: ViewerPose<View = S::View>,
    {
        match session {
            None => self.render_flat(backend, frame.timestamp),
            Some(session) => self.render_session(backend, frame, session),
        }
    }

    pub fn render_flat<B: RenderBackend>(&mut self, backend: &mut B, timestamp: f64) -> FrameRequest {
        let dt = self.advance_clock(timestamp);
        let (width, height) = backend.surface_size();

        self.camera.clear_pose();
        self.camera.fit_to(width, height);
        backend.set_viewport(Viewport::full(width, height));
        backend.set_auto_clear(true);
        self.scene.set_matrix_auto_update(true);

        if self.config.walking {
            self.locomotion.step_flat(dt, self.look.heading());
        }
        let eye = self.locomotion.offset() + Vec3::Y * self.config.eye_height;
        self.look.update_camera(&mut self.camera, eye);

        self.scene.animate((timestamp / 1000.0) as f32);
        self.scene.update_matrix_world();
        backend.render(&self.scene, &self.camera);
        backend.finish_frame();

        FrameRequest::Host
    }

    pub fn render_session<B, S, P>(&mut self, backend: &mut B, frame: FrameInput<'_, P>, session: &S) -> FrameRequest
    where
        B: RenderBackend,
        S: SessionHandle,
        P: ViewerPose<View = S::View>,
    {
        let Some(pose) = frame.pose else {
            trace!("No viewer pose at {:.1}ms, skipping frame", frame.timestamp);
            return FrameRequest::Session;
        };
        let dt = self.advance_clock(frame.timestamp);

        // Scene root and clears are driven from here until the session ends.
        self.scene.set_matrix_auto_update(false);
        backend.set_auto_clear(false);

        let layer = session.layer();
        let (width, height) = layer.framebuffer_size();
        backend.bind_framebuffer(FramebufferTarget::Layer { width, height });
        backend.clear();

        self.scene.set_environment_visible(!session.mode().is_passthrough());
        self.scene.animate((frame.timestamp / 1000.0) as f32);
        if let Some(placement) = self.placement.as_mut() {
            let offset = self.locomotion.offset();
            let head = pose
                .views()
                .first()
                .map(|view| Transform::from_matrix(view.view_matrix().inverse()).translated(offset));
            if let Some(head) = head {
                let hit = pose.hit_test().map(|m| m.transform_point3(Vec3::ZERO) + offset);
                placement.track(&mut self.scene, hit, &Ray::new(head.position, head.forward()));
            }
        }
        update_input_visuals(
            &mut self.scene,
            self.locomotion.offset(),
            frame.inputs,
            &self.config,
            self.grab.as_ref(),
        );

        let mut rendered = 0;
        for view in pose.views() {
            let Some(viewport) = layer.viewport(view) else {
                debug!("Render layer has no viewport for a view, skipping it");
                continue;
            };
            if rendered > 0 {
                backend.clear_depth();
            }
            backend.set_viewport(viewport);

            let eye_view = view.view_matrix();
            if session.mode() == SessionMode::MagicWindow {
                self.locomotion.step_magic_window(eye_view, dt);
            }
            let view_matrix = reconcile_view_matrix(eye_view, self.locomotion.offset());

            self.camera.apply_pose(view.projection_matrix());
            self.scene.set_matrix(view_matrix);
            self.scene.update_matrix_world();
            backend.render(&self.scene, &self.camera);
            rendered += 1;
        }

        backend.finish_frame();
        FrameRequest::Session
    }

    /// Puts renderer, camera and scene back into flat-view shape after a
    /// session ends.
    pub fn restore_flat_view<B: RenderBackend>(&mut self, backend: &mut B) -> FrameRequest {
        self.scene.release_transients();
        self.grab = None;
        if let Some(placement) = self.placement.take() {
            placement.end(&mut self.scene);
        }
        self.scene.set_environment_visible(true);
        if let Some(name) = self.config.grab_target.as_deref() {
            if let Some(target) = self.scene.find_mut(name) {
                target.highlighted = false;
            }
        }

        backend.bind_framebuffer(FramebufferTarget::Default);
        let (width, height) = backend.surface_size();
        backend.set_viewport(Viewport::full(width, height));
        backend.set_auto_clear(true);

        self.camera.clear_pose();
        self.camera.fit_to(width, height);
        self.scene.set_matrix_auto_update(true);
        self.scene.update_matrix_world();

        info!("Restored flat view at {}x{}", width, height);
        FrameRequest::Host
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.camera.is_pose_driven() {
            self.camera.fit_to(width, height);
        }
    }
}
