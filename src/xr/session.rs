use std::fmt;

use log::{debug, info, warn};

use super::pose::{HasViewport, XrView};
use crate::error::{XrError, XrResult};
use crate::render::{RenderBackend, RenderState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionMode {
    /// Stereo rendering on a head-mounted display.
    Immersive,
    /// Monoscopic, orientation-tracked view inside the page.
    MagicWindow,
    /// Camera passthrough with content anchored on real surfaces.
    ImmersiveAr,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Immersive => "immersive",
            SessionMode::MagicWindow => "magic window",
            SessionMode::ImmersiveAr => "immersive AR",
        }
    }

    pub fn reference_space(&self) -> ReferenceSpaceKind {
        match self {
            SessionMode::Immersive => ReferenceSpaceKind::FloorLevel,
            SessionMode::MagicWindow | SessionMode::ImmersiveAr => ReferenceSpaceKind::EyeLevel,
        }
    }

    /// Drawn over a see-through display rather than an opaque one.
    pub fn is_passthrough(&self) -> bool {
        matches!(self, SessionMode::ImmersiveAr)
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSpaceKind {
    /// Origin on the floor, y up.
    FloorLevel,
    /// Origin at the viewer's head at session start.
    EyeLevel,
}

/// What the platform offers, detected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub immersive: bool,
    pub magic_window: bool,
    pub immersive_ar: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    Enabled,
    Hidden,
}

impl Capabilities {
    pub fn new(immersive: bool, magic_window: bool) -> Self {
        info!(
            "XR capabilities: immersive={}, magic window={}",
            immersive, magic_window
        );
        Self {
            immersive,
            magic_window,
            immersive_ar: false,
        }
    }

    pub fn with_immersive_ar(mut self, supported: bool) -> Self {
        if supported {
            info!("XR capabilities: immersive AR");
        }
        self.immersive_ar = supported;
        self
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn supports(&self, mode: SessionMode) -> bool {
        match mode {
            SessionMode::Immersive => self.immersive,
            SessionMode::MagicWindow => self.magic_window,
            SessionMode::ImmersiveAr => self.immersive_ar,
        }
    }

    /// Enter VR button.
    pub fn entry_point(&self) -> EntryPoint {
        self.entry_point_for(SessionMode::Immersive)
    }

    pub fn entry_point_for(&self, mode: SessionMode) -> EntryPoint {
        if self.supports(mode) {
            EntryPoint::Enabled
        } else {
            EntryPoint::Hidden
        }
    }
}

/// A granted platform session.
pub trait SessionHandle {
    type View: XrView;
    type Layer: HasViewport<Self::View>;

    fn mode(&self) -> SessionMode;

    fn reference_space(&self) -> ReferenceSpaceKind;

    fn layer(&self) -> &Self::Layer;

    /// Whether viewer poses of this session carry hit-test results.
    fn supports_hit_test(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Inactive,
    Requesting(SessionMode),
    Active(SessionMode),
    Ending(SessionMode),
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Inactive => "inactive",
            SessionState::Requesting(_) => "requesting",
            SessionState::Active(_) => "active",
            SessionState::Ending(_) => "ending",
        }
    }

    pub fn mode(&self) -> Option<SessionMode> {
        match *self {
            SessionState::Inactive => None,
            SessionState::Requesting(mode) | SessionState::Active(mode) | SessionState::Ending(mode) => {
                Some(mode)
            }
        }
    }

    /// A platform call is in flight.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, SessionState::Requesting(_) | SessionState::Ending(_))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode() {
            Some(mode) => write!(f, "{} ({})", self.as_str(), mode),
            None => f.write_str(self.as_str()),
        }
    }
}

/// Result of an asynchronous platform call, fed back into
/// [`SessionLifecycle::apply`].
pub enum SessionOutcome<S> {
    Granted(S),
    Rejected(XrError),
    /// The session is gone, whether we asked for it or not.
    Ended,
}

impl<S> SessionOutcome<S> {
    fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::Granted(_) => "granted",
            SessionOutcome::Rejected(_) => "rejected",
            SessionOutcome::Ended => "ended",
        }
    }
}

/// Work the host must carry out after a lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEffect {
    RequestSession(SessionMode),
    EndSession,
    StartSessionLoop,
    ResumeHostLoop,
}

pub struct SessionLifecycle<S> {
    state: SessionState,
    session: Option<S>,
    capabilities: Capabilities,
    pending: Option<SessionMode>,
}

impl<S: SessionHandle> SessionLifecycle<S> {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            state: SessionState::Inactive,
            session: None,
            capabilities,
            pending: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// The live session while active or ending.
    pub fn session(&self) -> Option<&S> {
        self.session.as_ref()
    }

    pub fn is_presenting(&self) -> bool {
        self.session.is_some()
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            info!("XR: session state: {} -> {}", self.state, next);
            self.state = next;
        }
    }

    fn begin_request(&mut self, mode: SessionMode) -> XrResult<LifecycleEffect> {
        if !self.capabilities.supports(mode) {
            return Err(XrError::Unsupported(mode));
        }
        self.transition(SessionState::Requesting(mode));
        Ok(LifecycleEffect::RequestSession(mode))
    }

    /// The user pressed the enter/exit VR button.
    ///
    /// Toggling while a request or an end is in flight does nothing. Leaving a
    /// magic-window session queues an immersive request for when it has ended.
    pub fn toggle(&mut self) -> XrResult<Vec<LifecycleEffect>> {
        self.toggle_mode(SessionMode::Immersive)
    }

    /// Same as [`toggle`](Self::toggle) for the enter/exit AR button.
    pub fn toggle_ar(&mut self) -> XrResult<Vec<LifecycleEffect>> {
        self.toggle_mode(SessionMode::ImmersiveAr)
    }

    fn toggle_mode(&mut self, target: SessionMode) -> XrResult<Vec<LifecycleEffect>> {
        match self.state {
            SessionState::Requesting(_) | SessionState::Ending(_) => {
                debug!("XR: toggle ignored while {}", self.state);
                Ok(Vec::new())
            }
            SessionState::Inactive => Ok(vec![self.begin_request(target)?]),
            SessionState::Active(SessionMode::MagicWindow) => {
                if !self.capabilities.supports(target) {
                    return Err(XrError::Unsupported(target));
                }
                self.pending = Some(target);
                self.transition(SessionState::Ending(SessionMode::MagicWindow));
                Ok(vec![LifecycleEffect::EndSession])
            }
            SessionState::Active(mode) => {
                self.transition(SessionState::Ending(mode));
                Ok(vec![LifecycleEffect::EndSession])
            }
        }
    }

    /// Starts the in-page magic-window view when nothing else is running.
    pub fn request_magic_window(&mut self) -> XrResult<Option<LifecycleEffect>> {
        if self.state != SessionState::Inactive {
            return Ok(None);
        }
        self.begin_request(SessionMode::MagicWindow).map(Some)
    }

    /// Consumes the outcome of a platform call.
    ///
    /// An explicit end and a platform-driven end run the same cleanup on
    /// `render`, so both leave the renderer in the same state.
    pub fn apply<B: RenderBackend>(
        &mut self,
        outcome: SessionOutcome<S>,
        render: &mut RenderState,
        backend: &mut B,
    ) -> Vec<LifecycleEffect> {
        match (self.state, outcome) {
            (SessionState::Requesting(mode), SessionOutcome::Granted(session)) => {
                if session.mode() != mode {
                    warn!(
                        "XR: requested a {} session but the platform granted {}",
                        mode,
                        session.mode()
                    );
                }
                debug!(
                    "XR: {} session uses a {:?} reference space",
                    mode,
                    session.reference_space()
                );
                match mode {
                    SessionMode::MagicWindow => render.locomotion.reset(),
                    SessionMode::ImmersiveAr => {
                        render.locomotion.reset();
                        if !session.supports_hit_test() {
                            warn!("XR: the AR session has no hit testing, nothing can be placed");
                        }
                        render.begin_placement();
                    }
                    SessionMode::Immersive => {}
                }
                self.session = Some(session);
                self.transition(SessionState::Active(mode));
                vec![LifecycleEffect::StartSessionLoop]
            }
            (SessionState::Requesting(mode), SessionOutcome::Rejected(err)) => {
                warn!("Error while requesting the {} session: {}", mode, err);
                self.pending = None;
                self.transition(SessionState::Inactive);
                Vec::new()
            }
            (SessionState::Active(mode) | SessionState::Ending(mode), SessionOutcome::Ended) => {
                self.finish(mode, render, backend)
            }
            (state, outcome) => {
                warn!("XR: ignoring {} outcome while {}", outcome.as_str(), state);
                Vec::new()
            }
        }
    }

    fn finish<B: RenderBackend>(
        &mut self,
        mode: SessionMode,
        render: &mut RenderState,
        backend: &mut B,
    ) -> Vec<LifecycleEffect> {
        self.session = None;
        render.restore_flat_view(backend);
        self.transition(SessionState::Inactive);

        let mut effects = vec![LifecycleEffect::ResumeHostLoop];
        let next = self.pending.take().or_else(|| {
            (mode != SessionMode::MagicWindow && self.capabilities.magic_window)
                .then_some(SessionMode::MagicWindow)
        });
        if let Some(next) = next {
            match self.begin_request(next) {
                Ok(effect) => effects.push(effect),
                Err(err) => warn!("XR: cannot follow up with a {} session: {}", next, err),
            }
        }
        effects
    }
}
