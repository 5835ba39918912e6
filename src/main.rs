//! Native viewer: flat walk-through of a preset scene, with a simulated
//! headset standing in for immersive, AR and magic-window sessions.
//!
//! `xr-viewer [teleport|boxes|cube|ar|panorama]` picks the scene.
//! WASD / arrows walk, right-drag looks around, left click teleports (or
//! places the model during AR). V enters or leaves the immersive session,
//! R the AR session, M starts a magic window, E ends the session as if the
//! headset had been taken off, G (held) grabs the model with the simulated
//! controller.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use log::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};
use xr_webgpu::app::{scenes, XrApp};
use xr_webgpu::render::{GpuContext, WgpuBackend};
use xr_webgpu::xr::sim::{SimSession, SimulatedHeadset};
use xr_webgpu::xr::{Handedness, InputSource, LifecycleEffect, SessionHandle, SessionMode, SessionOutcome};
use xr_webgpu::{RoomBounds, Transform};

struct App {
    window: Option<Arc<Window>>,
    backend: Option<WgpuBackend<'static>>,
    xr: XrApp<SimSession>,
    headset: SimulatedHeadset,
    start: Instant,
    mouse_pos: PhysicalPosition<f64>,
    looking: bool,
}

impl App {
    fn new(preset: Option<String>) -> Self {
        let headset = SimulatedHeadset::default();
        let (scene, config) = match preset.as_deref() {
            Some(name) => scenes::by_name(name).unwrap_or_else(|| {
                warn!("Unknown scene '{}', using the teleport room", name);
                scenes::teleport_room(RoomBounds::default())
            }),
            None => scenes::teleport_room(RoomBounds::default()),
        };
        let xr = XrApp::new(scene, config, headset.capabilities());

        Self {
            window: None,
            backend: None,
            xr,
            headset,
            start: Instant::now(),
            mouse_pos: PhysicalPosition::new(0.0, 0.0),
            looking: false,
        }
    }

    fn timestamp(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    fn session_mode(&self) -> Option<SessionMode> {
        self.xr.lifecycle().session().map(|s| s.mode())
    }

    /// Right-hand controller held in front of the head, aimed where the
    /// viewer looks.
    fn controller(&self) -> InputSource {
        let look = self.xr.render.look.orientation();
        let origin = Vec3::new(0.2, self.headset.head_height - 0.3, -0.2);
        self.headset
            .controller(Handedness::Right, origin, origin + look * Vec3::new(0.0, -0.4, -1.0))
    }

    /// Carries out lifecycle effects against the simulated headset, which
    /// answers every request immediately.
    fn run_effects(&mut self, effects: Vec<LifecycleEffect>) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let mut queue: VecDeque<LifecycleEffect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                LifecycleEffect::RequestSession(mode) => {
                    queue.extend(self.xr.on_session_outcome(self.headset.request(mode), backend));
                }
                LifecycleEffect::EndSession => {
                    queue.extend(self.xr.on_session_outcome(SessionOutcome::Ended, backend));
                }
                LifecycleEffect::StartSessionLoop | LifecycleEffect::ResumeHostLoop => {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
        }
    }

    fn redraw(&mut self) {
        let timestamp = self.timestamp();
        let mode = self.session_mode();
        let inputs = [self.controller()];
        let Some(backend) = self.backend.as_mut() else {
            return;
        };

        // Natively both frame schedulers are winit redraws.
        match mode {
            Some(mode) => {
                let head_position = match mode {
                    SessionMode::Immersive | SessionMode::ImmersiveAr => Vec3::Y * self.headset.head_height,
                    SessionMode::MagicWindow => Vec3::ZERO,
                };
                let head = Transform::from_position_rotation(head_position, self.xr.render.look.orientation());
                let pose = self.headset.pose(mode, head);
                self.xr.frame(backend, timestamp, Some(&pose), &inputs);
            }
            None => {
                self.xr.flat_frame(backend, timestamp);
            }
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode, pressed: bool, repeat: bool) {
        match code {
            KeyCode::Escape if pressed => event_loop.exit(),
            KeyCode::KeyV if pressed && !repeat => {
                let effects = self.xr.toggle();
                self.run_effects(effects);
            }
            KeyCode::KeyR if pressed && !repeat => {
                let effects = self.xr.toggle_ar();
                self.run_effects(effects);
            }
            KeyCode::KeyM if pressed && !repeat => {
                let effects = self.xr.start_magic_window().into_iter().collect();
                self.run_effects(effects);
            }
            KeyCode::KeyE if pressed && !repeat => {
                if let Some(backend) = self.backend.as_mut() {
                    info!("Simulated headset removed");
                    let effects = self.xr.on_session_outcome(SessionOutcome::Ended, backend);
                    self.run_effects(effects);
                }
            }
            KeyCode::KeyG if !repeat => {
                if pressed {
                    let controller = self.controller();
                    if self.xr.select_start(&controller) {
                        info!("Grabbed the model");
                    }
                } else {
                    self.xr.select_end();
                }
            }
            _ => {
                self.xr.key(code, pressed);
            }
        }
    }

    fn on_click(&mut self) {
        if self.session_mode().is_some() {
            let controller = self.controller();
            self.xr.select(&controller);
            return;
        }
        let Some(window) = &self.window else {
            return;
        };
        let size = window.inner_size();
        let ndc_x = (2.0 * self.mouse_pos.x / size.width.max(1) as f64 - 1.0) as f32;
        let ndc_y = (1.0 - 2.0 * self.mouse_pos.y / size.height.max(1) as f64) as f32;
        self.xr.click(ndc_x, ndc_y);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title("XR Viewer")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        match pollster::block_on(GpuContext::new(window.clone())) {
            Ok(context) => {
                let size = context.size;
                self.backend = Some(WgpuBackend::new(context, self.xr.render.config.clear_color));
                self.xr.resize(size.width, size.height);
                window.request_redraw();
            }
            Err(e) => {
                error!("Failed to initialise rendering: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.on_key(event_loop, code, event.state == ElementState::Pressed, event.repeat);
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(backend) = &mut self.backend {
                    backend.resize(size);
                }
                self.xr.resize(size.width, size.height);
            }
            WindowEvent::MouseInput { state, button, .. } => match button {
                MouseButton::Left if state == ElementState::Pressed => self.on_click(),
                MouseButton::Right => self.looking = state == ElementState::Pressed,
                _ => {}
            },
            WindowEvent::CursorMoved { position, .. } => {
                let delta_x = position.x - self.mouse_pos.x;
                let delta_y = position.y - self.mouse_pos.y;
                self.mouse_pos = position;
                if self.looking {
                    self.xr.look(delta_x as f32, delta_y as f32);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(std::env::args().nth(1));
    event_loop.run_app(&mut app)?;
    Ok(())
}
