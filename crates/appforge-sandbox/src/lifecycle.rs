//! Host-side lifecycle controller
//!
//! Owns the current [`SandboxSession`] exclusively. Channel events are the
//! only input from the boundary; events for any generation other than the
//! active one are discarded.
//!
//! ```text
//! Empty --mount--> Mounted --ERROR--> Errored
//!                  ^  |  ^              |
//!                  |  +--+ refresh      | RENDERED / refresh
//!                  +--------------------+
//! ```

use crate::channel::{ChannelMessage, ErrorReport, SandboxEvent};
use crate::error::SandboxError;
use crate::session::SandboxSession;
use appforge_artifact::CodeArtifact;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No artifact yet
    Empty,
    /// Session active, no error reported
    Mounted,
    /// Session active with `last_error` set
    Errored,
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: LifecycleState) -> &'static [LifecycleState] {
    use LifecycleState::{Empty, Errored, Mounted};
    match from {
        Empty => &[Mounted],
        Mounted => &[Mounted, Errored],
        Errored => &[Mounted, Errored],
    }
}

/// Check a single transition against the table
///
/// # Errors
/// Returns [`SandboxError::IllegalTransition`] if `to` is not reachable from `from`
pub fn validate_transition(from: LifecycleState, to: LifecycleState) -> Result<(), SandboxError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(SandboxError::IllegalTransition { from, to })
    }
}

/// Source view or rendered view; orthogonal to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Rendered,
    Source,
}

impl ViewMode {
    fn toggled(self) -> Self {
        match self {
            Self::Rendered => Self::Source,
            Self::Source => Self::Rendered,
        }
    }
}

/// What happened to a delivered channel message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Applied to the active session; carries the resulting state
    Applied(LifecycleState),
    /// Tagged with another generation; dropped
    Stale { active: u64, received: u64 },
    /// Nothing mounted; dropped
    NoSession,
    /// Failed the shape check or the transition table; dropped
    Rejected(String),
}

/// Snapshot for the host UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostStatus {
    pub state: LifecycleState,
    /// False while an error is displayed
    pub healthy: bool,
    pub last_error: Option<ErrorReport>,
    pub generation: Option<u64>,
    pub ready: bool,
    /// RENDERED seen for the active mount
    pub rendered: bool,
    pub view: ViewMode,
}

/// Mounts, remounts and tracks the sandbox boundary
#[derive(Debug)]
pub struct LifecycleController {
    state: LifecycleState,
    session: Option<SandboxSession>,
    last_generation: u64,
    view: ViewMode,
    mount_timeout: Option<Duration>,
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(10)))
    }
}

impl LifecycleController {
    /// Create a controller; `mount_timeout` of `None` disables the watchdog
    #[must_use]
    pub fn new(mount_timeout: Option<Duration>) -> Self {
        Self {
            state: LifecycleState::Empty,
            session: None,
            last_generation: 0,
            view: ViewMode::default(),
            mount_timeout,
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Active session
    #[inline]
    #[must_use]
    pub fn session(&self) -> Option<&SandboxSession> {
        self.session.as_ref()
    }

    /// Generation of the active session
    #[inline]
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        self.session.as_ref().map(SandboxSession::generation)
    }

    /// Current display mode
    #[inline]
    #[must_use]
    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// Tear down any session and mount `artifact` under a new generation
    ///
    /// # Errors
    /// Returns [`SandboxError::NotValid`] unless the artifact passed validation
    pub fn mount(&mut self, artifact: CodeArtifact) -> Result<u64, SandboxError> {
        self.mount_at(artifact, Instant::now())
    }

    /// [`Self::mount`] with an explicit clock reading
    ///
    /// # Errors
    /// Returns [`SandboxError::NotValid`] unless the artifact passed validation
    pub fn mount_at(&mut self, artifact: CodeArtifact, now: Instant) -> Result<u64, SandboxError> {
        if !artifact.is_valid() {
            return Err(SandboxError::NotValid {
                hash: artifact.hash(),
                state: artifact.state().clone(),
            });
        }
        self.transition(LifecycleState::Mounted)?;

        self.last_generation += 1;
        let generation = self.last_generation;
        info!(
            generation,
            hash = %artifact.hash().short(),
            replaced = ?self.generation(),
            "Mounting sandbox session"
        );
        self.session = Some(SandboxSession::new(artifact, generation, now));
        Ok(generation)
    }

    /// Remount the current artifact; `None` when nothing is mounted
    pub fn refresh(&mut self) -> Option<u64> {
        self.refresh_at(Instant::now())
    }

    /// [`Self::refresh`] with an explicit clock reading
    pub fn refresh_at(&mut self, now: Instant) -> Option<u64> {
        let artifact = self.session.as_ref()?.artifact().clone();
        match self.mount_at(artifact, now) {
            Ok(generation) => Some(generation),
            Err(err) => {
                warn!(error = %err, "Refresh failed");
                None
            }
        }
    }

    /// Apply a decoded channel message
    pub fn handle(&mut self, message: ChannelMessage) -> Delivery {
        let Some(session) = self.session.as_mut() else {
            debug!(kind = message.event.kind(), "No session; dropping event");
            return Delivery::NoSession;
        };
        let active = session.generation();
        if message.generation != active {
            debug!(
                active,
                received = message.generation,
                kind = message.event.kind(),
                "Dropping stale event"
            );
            return Delivery::Stale {
                active,
                received: message.generation,
            };
        }

        let target = match message.event {
            SandboxEvent::Ready => {
                session.mark_ready();
                self.state
            }
            SandboxEvent::Rendered => {
                session.mark_rendered();
                LifecycleState::Mounted
            }
            SandboxEvent::Error(report) => {
                warn!(generation = active, message = %report.message, "Sandbox runtime error");
                session.record_error(report);
                LifecycleState::Errored
            }
        };

        match self.transition(target) {
            Ok(()) => Delivery::Applied(self.state),
            Err(err) => Delivery::Rejected(err.to_string()),
        }
    }

    /// Shape-check and apply a raw channel message
    pub fn deliver(&mut self, raw: &str) -> Delivery {
        match ChannelMessage::parse(raw) {
            Ok(message) => self.handle(message),
            Err(err) => {
                debug!(error = %err, "Rejecting channel message");
                Delivery::Rejected(err.to_string())
            }
        }
    }

    /// Flip between source and rendered view; the session is untouched
    pub fn toggle_view(&mut self) -> ViewMode {
        self.view = self.view.toggled();
        self.view
    }

    /// Report a mount that stayed silent past the timeout
    ///
    /// Fires at most once per session and never interrupts the boundary.
    /// Returns true if it fired on this call.
    pub fn check_watchdog(&mut self, now: Instant) -> bool {
        let Some(timeout) = self.mount_timeout else {
            return false;
        };
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.watchdog_due(now, timeout) {
            return false;
        }

        let report = ErrorReport::new(format!(
            "App did not finish rendering within {}s",
            timeout.as_secs_f64()
        ));
        warn!(generation = session.generation(), "Mount watchdog fired");
        session.fire_watchdog(report);
        self.transition(LifecycleState::Errored).is_ok()
    }

    /// Snapshot for display
    #[must_use]
    pub fn status(&self) -> HostStatus {
        HostStatus {
            state: self.state,
            healthy: self.state != LifecycleState::Errored,
            last_error: self.session.as_ref().and_then(|s| s.last_error().cloned()),
            generation: self.generation(),
            ready: self.session.as_ref().is_some_and(SandboxSession::is_ready),
            rendered: self.session.as_ref().is_some_and(SandboxSession::is_rendered),
            view: self.view,
        }
    }

    fn transition(&mut self, to: LifecycleState) -> Result<(), SandboxError> {
        validate_transition(self.state, to)?;
        self.state = to;
        Ok(())
    }
}
