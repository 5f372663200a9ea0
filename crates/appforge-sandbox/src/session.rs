//! One mounted execution of an artifact

use crate::channel::ErrorReport;
use appforge_artifact::CodeArtifact;
use std::time::Instant;

/// A mounted boundary instance
///
/// Sessions are replaced on refresh, never reused. The artifact is shared
/// read-only with whoever produced it.
#[derive(Debug, Clone)]
pub struct SandboxSession {
    artifact: CodeArtifact,
    generation: u64,
    mounted_at: Instant,
    last_error: Option<ErrorReport>,
    ready: bool,
    rendered: bool,
    watchdog_fired: bool,
}

impl SandboxSession {
    pub(crate) fn new(artifact: CodeArtifact, generation: u64, mounted_at: Instant) -> Self {
        Self {
            artifact,
            generation,
            mounted_at,
            last_error: None,
            ready: false,
            rendered: false,
            watchdog_fired: false,
        }
    }

    /// Artifact being run
    #[inline]
    #[must_use]
    pub fn artifact(&self) -> &CodeArtifact {
        &self.artifact
    }

    /// Identity of this mount
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Most recent error reported for this mount
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<&ErrorReport> {
        self.last_error.as_ref()
    }

    /// READY received
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// RENDERED received
    #[inline]
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    pub(crate) fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub(crate) fn mark_rendered(&mut self) {
        self.rendered = true;
        self.last_error = None;
    }

    pub(crate) fn record_error(&mut self, report: ErrorReport) {
        self.last_error = Some(report);
    }

    /// Watchdog may fire once, and only while the mount is still silent
    pub(crate) fn watchdog_due(&self, now: Instant, timeout: std::time::Duration) -> bool {
        !self.watchdog_fired
            && !self.rendered
            && self.last_error.is_none()
            && now.saturating_duration_since(self.mounted_at) >= timeout
    }

    pub(crate) fn fire_watchdog(&mut self, report: ErrorReport) {
        self.watchdog_fired = true;
        self.last_error = Some(report);
    }
}
