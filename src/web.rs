//! WASM entry point: flat view in a canvas, WebXR sessions on top of it.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use glam::Mat4;
use log::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    HtmlCanvasElement, UrlSearchParams, WebGl2RenderingContext, XrFrame, XrInputSourceEvent, XrReferenceSpace,
    XrReferenceSpaceType, XrRenderStateInit, XrSession, XrSessionInit, XrSessionMode, XrSystem, XrWebGlLayer,
};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::web::{EventLoopExtWebSys, WindowAttributesExtWebSys};
use winit::window::{Window, WindowId};

use crate::app::{scenes, XrApp};
use crate::error::{XrError, XrResult};
use crate::locomotion::RoomBounds;
use crate::render::{FrameRequest, GpuContext, WebGlBackend, WgpuBackend};
use crate::xr::{
    Capabilities, EntryPoint, Eye, Handedness, HasProjectionMatrix, HasViewTransform, HasViewport, InputSource,
    LifecycleEffect, ReferenceSpaceKind, SessionHandle, SessionMode, SessionOutcome, TargetRayMode, ViewerPose,
    Viewport, XrView,
};

const CANVAS_ID: &str = "canvas";
const BUTTON_ID: &str = "xr-button";
const AR_BUTTON_ID: &str = "ar-button";

fn mat4(values: &[f32]) -> Option<Mat4> {
    (values.len() >= 16).then(|| Mat4::from_cols_slice(&values[..16]))
}

fn js_error(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Method looked up by name, for WebXR modules web-sys has no bindings for.
fn method(target: &JsValue, name: &str) -> Option<js_sys::Function> {
    js_sys::Reflect::get(target, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<js_sys::Function>()
        .ok()
}

fn is_missing(value: &JsValue) -> bool {
    value.is_undefined() || value.is_null()
}

#[derive(Clone)]
pub struct WebXrView {
    raw: web_sys::XrView,
    eye: Eye,
    view: Mat4,
    projection: Mat4,
}

impl WebXrView {
    fn from_raw(raw: web_sys::XrView) -> Option<Self> {
        let projection = mat4(&raw.projection_matrix())?;
        let view = mat4(&raw.transform().inverse().matrix())?;
        let eye = match raw.eye() {
            web_sys::XrEye::Left => Eye::Left,
            web_sys::XrEye::Right => Eye::Right,
            _ => Eye::None,
        };
        Some(Self {
            raw,
            eye,
            view,
            projection,
        })
    }
}

impl HasProjectionMatrix for WebXrView {
    fn projection_matrix(&self) -> Mat4 {
        self.projection
    }
}

impl HasViewTransform for WebXrView {
    fn view_matrix(&self) -> Mat4 {
        self.view
    }
}

impl XrView for WebXrView {
    fn eye(&self) -> Eye {
        self.eye
    }
}

pub struct WebXrPose {
    views: Vec<WebXrView>,
    hit: Option<Mat4>,
}

impl WebXrPose {
    fn from_frame(frame: &XrFrame, session: &WebXrSession) -> Option<Self> {
        let pose = frame.get_viewer_pose(&session.space)?;
        let views = pose
            .views()
            .iter()
            .filter_map(|view| view.dyn_into::<web_sys::XrView>().ok())
            .filter_map(WebXrView::from_raw)
            .collect();
        let hit = session
            .hit_test_source
            .as_ref()
            .and_then(|source| first_hit(frame, source, &session.space));
        Some(Self { views, hit })
    }
}

impl ViewerPose for WebXrPose {
    type View = WebXrView;

    fn views(&self) -> &[WebXrView] {
        &self.views
    }

    fn hit_test(&self) -> Option<Mat4> {
        self.hit
    }
}

/// Pose of the closest hit-test result this frame, in `space`.
fn first_hit(frame: &XrFrame, source: &JsValue, space: &XrReferenceSpace) -> Option<Mat4> {
    let results = method(frame, "getHitTestResults")?.call1(frame, source).ok()?;
    let first = results.dyn_into::<js_sys::Array>().ok()?.get(0);
    if is_missing(&first) {
        return None;
    }
    let pose = method(&first, "getPose")?.call1(&first, space).ok()?;
    if is_missing(&pose) {
        return None;
    }
    mat4(&pose.unchecked_into::<web_sys::XrPose>().transform().matrix())
}

#[derive(Clone)]
pub struct WebXrLayer(XrWebGlLayer);

impl HasViewport<WebXrView> for WebXrLayer {
    fn viewport(&self, view: &WebXrView) -> Option<Viewport> {
        let vp = self.0.get_viewport(&view.raw)?;
        Some(Viewport::from_bottom_left(
            vp.x(),
            vp.y(),
            vp.width(),
            vp.height(),
            self.0.framebuffer_height(),
        ))
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        (self.0.framebuffer_width(), self.0.framebuffer_height())
    }
}

#[derive(Clone)]
pub struct WebXrSession {
    session: XrSession,
    mode: SessionMode,
    space: XrReferenceSpace,
    layer: WebXrLayer,
    hit_test_source: Option<JsValue>,
}

impl WebXrSession {
    /// Stops hit testing. The source dies with the session anyway; this
    /// just releases it early.
    fn cancel_hit_test(&self) {
        let Some(source) = &self.hit_test_source else {
            return;
        };
        if let Some(cancel) = method(source, "cancel") {
            if let Err(err) = cancel.call0(source) {
                warn!("XR: cancelling the hit-test source failed: {}", js_error(&err));
            }
        }
    }
}

impl SessionHandle for WebXrSession {
    type View = WebXrView;
    type Layer = WebXrLayer;

    fn mode(&self) -> SessionMode {
        self.mode
    }

    fn reference_space(&self) -> ReferenceSpaceKind {
        self.mode.reference_space()
    }

    fn layer(&self) -> &WebXrLayer {
        &self.layer
    }

    fn supports_hit_test(&self) -> bool {
        self.hit_test_source.is_some()
    }
}

fn xr_mode(mode: SessionMode) -> XrSessionMode {
    match mode {
        SessionMode::Immersive => XrSessionMode::ImmersiveVr,
        SessionMode::MagicWindow => XrSessionMode::Inline,
        SessionMode::ImmersiveAr => XrSessionMode::ImmersiveAr,
    }
}

fn space_type(kind: ReferenceSpaceKind) -> (XrReferenceSpaceType, &'static str) {
    match kind {
        ReferenceSpaceKind::FloorLevel => (XrReferenceSpaceType::LocalFloor, "local-floor"),
        ReferenceSpaceKind::EyeLevel => (XrReferenceSpaceType::Local, "local"),
    }
}

fn xr_system() -> Option<XrSystem> {
    let navigator = web_sys::window()?.navigator();
    let xr = js_sys::Reflect::get(&navigator, &JsValue::from_str("xr")).ok()?;
    (!xr.is_undefined() && !xr.is_null()).then(|| xr.unchecked_into())
}

async fn is_supported(system: &XrSystem, mode: XrSessionMode) -> bool {
    JsFuture::from(system.is_session_supported(mode))
        .await
        .ok()
        .and_then(|supported| supported.as_bool())
        .unwrap_or(false)
}

async fn detect_capabilities(system: &XrSystem) -> Capabilities {
    let immersive = is_supported(system, XrSessionMode::ImmersiveVr).await;
    let magic_window = is_supported(system, XrSessionMode::Inline).await;
    let ar = is_supported(system, XrSessionMode::ImmersiveAr).await;
    Capabilities::new(immersive, magic_window).with_immersive_ar(ar)
}

/// XR-compatible WebGL2 context on an offscreen canvas. Session layers are
/// created from it and [`WebGlBackend`] draws into their framebuffers.
fn xr_gl_context() -> Option<WebGl2RenderingContext> {
    let document = web_sys::window()?.document()?;
    let canvas: HtmlCanvasElement = document.create_element("canvas").ok()?.dyn_into().ok()?;
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &JsValue::from_str("xrCompatible"), &JsValue::TRUE).ok()?;
    canvas
        .get_context_with_context_options("webgl2", &options)
        .ok()??
        .dyn_into()
        .ok()
}

fn input_from(frame: &XrFrame, space: &XrReferenceSpace, source: &web_sys::XrInputSource) -> InputSource {
    let pose_of = |s: &web_sys::XrSpace| frame.get_pose(s, space).and_then(|p| mat4(&p.transform().matrix()));
    InputSource {
        handedness: match source.handedness() {
            web_sys::XrHandedness::Left => Handedness::Left,
            web_sys::XrHandedness::Right => Handedness::Right,
            _ => Handedness::None,
        },
        target_ray_mode: match source.target_ray_mode() {
            web_sys::XrTargetRayMode::TrackedPointer => TargetRayMode::TrackedPointer,
            web_sys::XrTargetRayMode::Screen => TargetRayMode::Screen,
            _ => TargetRayMode::Gaze,
        },
        target_ray: pose_of(&source.target_ray_space()),
        grip: source.grip_space().and_then(|grip| pose_of(&grip)),
    }
}

fn collect_inputs(frame: &XrFrame, session: &WebXrSession) -> Vec<InputSource> {
    let sources = session.session.input_sources();
    (0..sources.length())
        .filter_map(|i| sources.get(i))
        .map(|source| input_from(frame, &session.space, &source))
        .collect()
}

/// Issues the platform request right away, so it still runs inside the
/// user gesture that triggered it.
fn request_session(system: &XrSystem, mode: SessionMode) -> js_sys::Promise {
    let (_, feature) = space_type(mode.reference_space());
    let init = XrSessionInit::new();
    init.set_optional_features(&js_sys::Array::of1(&JsValue::from_str(feature)));
    if mode == SessionMode::ImmersiveAr {
        init.set_required_features(&js_sys::Array::of1(&JsValue::from_str("hit-test")));
    }
    system.request_session_with_options(xr_mode(mode), &init)
}

/// Hit-test source casting along the viewer's center ray.
async fn request_hit_test_source(session: &XrSession) -> Result<JsValue, JsValue> {
    let viewer = JsFuture::from(session.request_reference_space(XrReferenceSpaceType::Viewer)).await?;
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &JsValue::from_str("space"), &viewer)?;
    let request = method(session, "requestHitTestSource")
        .ok_or_else(|| JsValue::from_str("requestHitTestSource is not available"))?;
    let promise = request.call1(session, &options)?.dyn_into::<js_sys::Promise>()?;
    JsFuture::from(promise).await
}

async fn setup_session(session: &XrSession, mode: SessionMode, gl: &WebGl2RenderingContext) -> XrResult<WebXrSession> {
    let layer = XrWebGlLayer::new_with_web_gl2_rendering_context(session, gl).map_err(|_| XrError::MissingLayer)?;
    let render_state = XrRenderStateInit::new();
    render_state.set_base_layer(Some(&layer));
    session.update_render_state_with_state(&render_state);

    let (space_type, _) = space_type(mode.reference_space());
    let space = JsFuture::from(session.request_reference_space(space_type))
        .await
        .map_err(|err| XrError::Interrupted(js_error(&err)))?
        .unchecked_into::<XrReferenceSpace>();

    let hit_test_source = if mode == SessionMode::ImmersiveAr {
        match request_hit_test_source(session).await {
            Ok(source) => Some(source),
            Err(err) => {
                warn!("XR: no hit-test source: {}", js_error(&err));
                None
            }
        }
    } else {
        None
    };

    Ok(WebXrSession {
        session: session.clone(),
        mode,
        space,
        layer: WebXrLayer(layer),
        hit_test_source,
    })
}

async fn finish_request(promise: js_sys::Promise, mode: SessionMode, gl: WebGl2RenderingContext) -> SessionOutcome<WebXrSession> {
    let session: XrSession = match JsFuture::from(promise).await {
        Ok(value) => value.unchecked_into(),
        Err(err) => return SessionOutcome::Rejected(XrError::Rejected(js_error(&err))),
    };
    match setup_session(&session, mode, &gl).await {
        Ok(session) => SessionOutcome::Granted(session),
        Err(err) => {
            if let Err(end_err) = JsFuture::from(session.end()).await {
                warn!("XR: ending the half-set-up session failed: {}", js_error(&end_err));
            }
            SessionOutcome::Rejected(err)
        }
    }
}

struct WebState {
    xr: XrApp<WebXrSession>,
    /// Page canvas: flat view and magic window.
    backend: Option<WgpuBackend<'static>>,
    /// XR layer framebuffer: immersive VR and AR.
    session_backend: Option<WebGlBackend>,
    window: Option<Arc<Window>>,
    system: Option<XrSystem>,
    gl: Option<WebGl2RenderingContext>,
    frame_callback: Option<Closure<dyn FnMut(f64, XrFrame)>>,
}

type Shared = Rc<RefCell<WebState>>;

/// Immersive sessions draw into their layer; inline ones share the page
/// canvas with the flat view.
fn draws_to_layer(session: &WebXrSession) -> bool {
    session.mode != SessionMode::MagicWindow
}

impl WebState {
    /// Points the WebGL backend at the live session's layer, or detaches it.
    fn sync_session_layer(&mut self) {
        let layer = self
            .xr
            .lifecycle()
            .session()
            .filter(|session| draws_to_layer(session))
            .map(|session| session.layer.0.clone());
        let clear_color = self.xr.render.config.clear_color;
        if let Some(backend) = self.session_backend.as_mut() {
            backend.set_clear_color(clear_color);
            backend.set_layer(layer);
        }
    }
}

fn deliver(state: &Shared, outcome: SessionOutcome<WebXrSession>) {
    let effects = {
        let mut guard = state.borrow_mut();
        let st = &mut *guard;
        match st.backend.as_mut() {
            Some(backend) => {
                let effects = st.xr.on_session_outcome(outcome, backend);
                st.sync_session_layer();
                effects
            }
            None => {
                st.xr.defer_outcome(outcome);
                Vec::new()
            }
        }
    };
    run_effects(state, effects);
}

fn run_effects(state: &Shared, effects: Vec<LifecycleEffect>) {
    for effect in effects {
        match effect {
            LifecycleEffect::RequestSession(mode) => start_request(state, mode),
            LifecycleEffect::EndSession => {
                let session = state.borrow().xr.lifecycle().session().map(|s| s.session.clone());
                if let Some(session) = session {
                    // The session's `end` event delivers the outcome.
                    spawn_local(async move {
                        if let Err(err) = JsFuture::from(session.end()).await {
                            warn!("XR: ending the session failed: {}", js_error(&err));
                        }
                    });
                }
            }
            LifecycleEffect::StartSessionLoop => request_xr_frame(state),
            LifecycleEffect::ResumeHostLoop => {
                if let Some(window) = &state.borrow().window {
                    window.request_redraw();
                }
            }
        }
    }
}

fn start_request(state: &Shared, mode: SessionMode) {
    let pending = {
        let st = state.borrow();
        st.system
            .as_ref()
            .zip(st.gl.clone())
            .map(|(system, gl)| (request_session(system, mode), gl))
    };
    let Some((promise, gl)) = pending else {
        deliver(state, SessionOutcome::Rejected(XrError::Unsupported(mode)));
        return;
    };

    let state = state.clone();
    spawn_local(async move {
        let outcome = finish_request(promise, mode, gl).await;
        if let SessionOutcome::Granted(session) = &outcome {
            install_session_handlers(&state, session);
        }
        deliver(&state, outcome);
    });
}

fn on_input_event(
    state: &Shared,
    handler: fn(&mut XrApp<WebXrSession>, &InputSource),
) -> Closure<dyn FnMut(XrInputSourceEvent)> {
    let state = state.clone();
    Closure::<dyn FnMut(XrInputSourceEvent)>::new(move |event: XrInputSourceEvent| {
        let mut guard = state.borrow_mut();
        let Some(space) = guard.xr.lifecycle().session().map(|s| s.space.clone()) else {
            return;
        };
        let input = input_from(&event.frame(), &space, &event.input_source());
        handler(&mut guard.xr, &input);
    })
}

fn install_session_handlers(state: &Shared, session: &WebXrSession) {
    let on_end = {
        let state = state.clone();
        Closure::<dyn FnMut(JsValue)>::new(move |_event: JsValue| {
            info!("XR: the {} session has ended", session_mode_name(&state));
            if let Some(session) = state.borrow().xr.lifecycle().session() {
                session.cancel_hit_test();
            }
            deliver(&state, SessionOutcome::Ended);
        })
    };
    session.session.set_onend(Some(on_end.as_ref().unchecked_ref()));
    on_end.forget();

    let on_select = on_input_event(state, |app, input| {
        app.select(input);
    });
    session.session.set_onselect(Some(on_select.as_ref().unchecked_ref()));
    on_select.forget();

    let on_select_start = on_input_event(state, |app, input| {
        app.select_start(input);
    });
    session.session.set_onselectstart(Some(on_select_start.as_ref().unchecked_ref()));
    on_select_start.forget();

    let on_select_end = on_input_event(state, |app, _| app.select_end());
    session.session.set_onselectend(Some(on_select_end.as_ref().unchecked_ref()));
    on_select_end.forget();
}

fn session_mode_name(state: &Shared) -> &'static str {
    state
        .borrow()
        .xr
        .lifecycle()
        .session()
        .map(|s| s.mode.as_str())
        .unwrap_or("unknown")
}

fn request_xr_frame(state: &Shared) {
    let mut guard = state.borrow_mut();
    if guard.frame_callback.is_none() {
        let callback_state = state.clone();
        guard.frame_callback = Some(Closure::<dyn FnMut(f64, XrFrame)>::new(move |time: f64, frame: XrFrame| {
            on_xr_frame(&callback_state, time, frame)
        }));
    }
    let st = &*guard;
    if let (Some(session), Some(callback)) = (st.xr.lifecycle().session(), st.frame_callback.as_ref()) {
        session.session.request_animation_frame(callback.as_ref().unchecked_ref());
    }
}

fn on_xr_frame(state: &Shared, time: f64, frame: XrFrame) {
    let request = {
        let mut guard = state.borrow_mut();
        let st = &mut *guard;
        let Some(session) = st.xr.lifecycle().session().cloned() else {
            return;
        };
        let pose = WebXrPose::from_frame(&frame, &session);
        let inputs = collect_inputs(&frame, &session);
        match (draws_to_layer(&session), st.session_backend.as_mut(), st.backend.as_mut()) {
            (true, Some(gl), _) => st.xr.frame(gl, time, pose.as_ref(), &inputs),
            (_, _, Some(backend)) => st.xr.frame(backend, time, pose.as_ref(), &inputs),
            _ => return,
        }
    };
    if request == FrameRequest::Session {
        request_xr_frame(state);
    }
}

fn toggle(state: &Shared, mode: SessionMode) {
    let effects = match mode {
        SessionMode::ImmersiveAr => state.borrow_mut().xr.toggle_ar(),
        _ => state.borrow_mut().xr.toggle(),
    };
    run_effects(state, effects);
}

/// Shows the enter button for `mode` if the platform supports it. Called
/// once the renderer exists, so a click always has a backend to land on.
fn install_entry_button(state: &Shared, id: &str, mode: SessionMode) {
    let Some(button) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
    else {
        debug!("No '{}' element for the {} session", id, mode);
        return;
    };

    if state.borrow().xr.entry_point_for(mode) == EntryPoint::Hidden {
        if let Err(err) = button.set_attribute("hidden", "") {
            warn!("Could not hide '{}': {}", id, js_error(&err));
        }
        return;
    }
    if let Err(err) = button.remove_attribute("hidden") {
        warn!("Could not show '{}': {}", id, js_error(&err));
    }

    let on_click = {
        let state = state.clone();
        Closure::<dyn FnMut(JsValue)>::new(move |_event: JsValue| toggle(&state, mode))
    };
    if let Err(err) = button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref()) {
        warn!("Could not attach the {} button: {}", mode, js_error(&err));
    }
    on_click.forget();
}

/// `?scene=<name>` from the page URL.
fn scene_from_query() -> Option<String> {
    let search = web_sys::window()?.location().search().ok()?;
    UrlSearchParams::new_with_str(&search).ok()?.get("scene")
}

fn performance_now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

struct App {
    state: Shared,
    init_pending: bool,
    mouse_pos: (f32, f32),
    looking: bool,
}

impl App {
    fn redraw(&mut self) {
        let request = {
            let mut guard = self.state.borrow_mut();
            let st = &mut *guard;
            let Some(backend) = st.backend.as_mut() else {
                return;
            };
            st.xr.flat_frame(backend, performance_now())
        };
        if request == FrameRequest::Host {
            if let Some(window) = &self.state.borrow().window {
                window.request_redraw();
            }
        }
    }

    fn click(&mut self) {
        let mut st = self.state.borrow_mut();
        let Some(size) = st.window.as_ref().map(|w| w.inner_size()) else {
            return;
        };
        let ndc_x = 2.0 * self.mouse_pos.0 / size.width.max(1) as f32 - 1.0;
        let ndc_y = 1.0 - 2.0 * self.mouse_pos.1 / size.height.max(1) as f32;
        st.xr.click(ndc_x, ndc_y);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.borrow().window.is_some() || self.init_pending {
            return;
        }
        self.init_pending = true;

        let Some(canvas) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(CANVAS_ID))
            .and_then(|e| e.dyn_into::<HtmlCanvasElement>().ok())
        else {
            error!("Could not find canvas element with id '{}'", CANVAS_ID);
            return;
        };

        let width = canvas.width().max(1);
        let height = canvas.height().max(1);
        let window_attrs = Window::default_attributes()
            .with_canvas(Some(canvas))
            .with_inner_size(PhysicalSize::new(width, height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                return;
            }
        };
        self.state.borrow_mut().window = Some(window.clone());

        let state = self.state.clone();
        spawn_local(async move {
            let context = match GpuContext::new(window.clone()).await {
                Ok(context) => context,
                Err(e) => {
                    error!("Failed to initialise rendering: {}", e);
                    return;
                }
            };

            let effects: Vec<LifecycleEffect> = {
                let mut guard = state.borrow_mut();
                let st = &mut *guard;
                let size = context.size;
                let clear_color = st.xr.render.config.clear_color;
                let backend = st.backend.insert(WgpuBackend::new(context, clear_color));
                st.xr.resize(size.width, size.height);

                let mut effects = st.xr.replay_deferred(backend);
                st.sync_session_layer();
                effects.extend(st.xr.start_magic_window());
                effects
            };
            run_effects(&state, effects);
            install_entry_button(&state, BUTTON_ID, SessionMode::Immersive);
            install_entry_button(&state, AR_BUTTON_ID, SessionMode::ImmersiveAr);
            window.request_redraw();
        });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                let mut guard = self.state.borrow_mut();
                let st = &mut *guard;
                if let Some(backend) = st.backend.as_mut() {
                    backend.resize(size);
                }
                st.xr.resize(size.width, size.height);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;
                if let PhysicalKey::Code(code) = event.physical_key {
                    match code {
                        KeyCode::KeyV if pressed && !event.repeat => toggle(&self.state, SessionMode::Immersive),
                        KeyCode::KeyR if pressed && !event.repeat => toggle(&self.state, SessionMode::ImmersiveAr),
                        _ => {
                            self.state.borrow_mut().xr.key(code, pressed);
                        }
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => match button {
                MouseButton::Left if state == ElementState::Pressed => self.click(),
                MouseButton::Right => self.looking = state == ElementState::Pressed,
                _ => {}
            },

            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                if self.looking {
                    self.state
                        .borrow_mut()
                        .xr
                        .look(x - self.mouse_pos.0, y - self.mouse_pos.1);
                }
                self.mouse_pos = (x, y);
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => {}
        }
    }
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).map_err(|e| JsValue::from_str(&e.to_string()))?;

    spawn_local(async {
        let system = xr_system();
        let capabilities = match &system {
            Some(system) => detect_capabilities(system).await,
            None => {
                info!("WebXR is not available in this browser");
                Capabilities::none()
            }
        };

        let preset = scene_from_query();
        let (scene, config) = match preset.as_deref().and_then(scenes::by_name) {
            Some(preset) => preset,
            None => {
                if let Some(name) = &preset {
                    warn!("Unknown scene '{}', using the teleport room", name);
                }
                scenes::teleport_room(RoomBounds::default())
            }
        };

        let gl = xr_gl_context();
        let session_backend = gl.clone().and_then(|gl| match WebGlBackend::new(gl, config.clear_color) {
            Ok(backend) => Some(backend),
            Err(err) => {
                error!("Immersive sessions will not render: {}", err);
                None
            }
        });
        if gl.is_none() {
            warn!("No XR-compatible WebGL2 context, immersive sessions are unavailable");
        }

        let state = Rc::new(RefCell::new(WebState {
            xr: XrApp::new(scene, config, capabilities),
            backend: None,
            session_backend,
            window: None,
            system,
            gl,
            frame_callback: None,
        }));

        let event_loop = match EventLoop::new() {
            Ok(event_loop) => event_loop,
            Err(e) => {
                error!("Failed to create event loop: {}", e);
                return;
            }
        };
        event_loop.spawn_app(App {
            state,
            init_pending: false,
            mouse_pos: (0.0, 0.0),
            looking: false,
        });
    });
    Ok(())
}
