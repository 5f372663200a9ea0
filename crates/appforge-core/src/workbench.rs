//! Host facade
//!
//! One [`Workbench`] backs one host view: it requests generations, mounts
//! artifacts from generation or storage, and routes sandbox channel events to
//! its lifecycle controller. The controller sits behind a mutex that is never
//! held across an await.

use crate::store::{AppRecord, AppStore, NewApp, StoreError};
use appforge_artifact::{ArtifactError, CodeArtifact};
use appforge_generation::{GenerationError, GenerationOutcome, GenerationRequest, Orchestrator};
use appforge_sandbox::{
    ChannelMessage, Delivery, DocumentBuilder, HostStatus, IsolationPolicy, LifecycleController,
    SandboxConfig, SandboxError, ViewMode,
};
use appforge_validator::SyntaxValidator;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

const PREVIEW_TITLE: &str = "App Preview";

/// Errors surfaced by the host facade
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkbenchError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Saved code no longer passes validation
    #[error("saved app {id} has invalid code: {reason}")]
    InvalidStoredCode { id: Uuid, reason: String },

    /// Operation needs a mounted artifact
    #[error("no artifact is mounted")]
    NothingMounted,
}

/// Re-validate a saved app before it is allowed near the sandbox
///
/// # Errors
/// - [`WorkbenchError::Store`] if the app cannot be fetched
/// - [`WorkbenchError::InvalidStoredCode`] if the stored code fails validation
pub async fn hydrate(
    store: &dyn AppStore,
    validator: &SyntaxValidator,
    id: Uuid,
) -> Result<(AppRecord, CodeArtifact), WorkbenchError> {
    let app = store.get(id).await?;
    let artifact = validator.check(CodeArtifact::candidate(app.code.as_str(), 1)?)?;
    if let Some(reason) = artifact.state().reason() {
        tracing::warn!(%id, reason, "Stored code failed validation");
        return Err(WorkbenchError::InvalidStoredCode {
            id,
            reason: reason.to_string(),
        });
    }
    Ok((app, artifact))
}

struct Host {
    controller: LifecycleController,
    title: String,
}

/// Host-side facade over generation, storage and the sandbox lifecycle
pub struct Workbench {
    orchestrator: Orchestrator,
    store: Arc<dyn AppStore>,
    validator: SyntaxValidator,
    documents: DocumentBuilder,
    isolation: IsolationPolicy,
    host: Mutex<Host>,
}

impl std::fmt::Debug for Workbench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("orchestrator", &self.orchestrator)
            .field("isolation", &self.isolation)
            .finish_non_exhaustive()
    }
}

impl Workbench {
    /// Create a workbench
    ///
    /// # Errors
    /// Returns [`WorkbenchError::Sandbox`] if the sandbox settings are unusable
    pub fn new(
        orchestrator: Orchestrator,
        store: Arc<dyn AppStore>,
        sandbox: &SandboxConfig,
    ) -> Result<Self, WorkbenchError> {
        let entry_symbol = orchestrator.config().entry_symbol.clone();
        Ok(Self {
            validator: SyntaxValidator::new(entry_symbol.clone()),
            documents: DocumentBuilder::new(sandbox.assets.clone(), entry_symbol)?,
            isolation: IsolationPolicy::with_extra(sandbox.allow.iter().cloned())?,
            host: Mutex::new(Host {
                controller: LifecycleController::new(sandbox.mount_timeout()),
                title: PREVIEW_TITLE.to_string(),
            }),
            orchestrator,
            store,
        })
    }

    /// Generate, then mount the result
    ///
    /// # Errors
    /// Returns the orchestrator's terminal error; nothing is mounted in that case
    pub async fn request_generation(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, WorkbenchError> {
        let outcome = self.orchestrator.generate(request).await?;
        self.mount(outcome.artifact.clone(), PREVIEW_TITLE)?;
        Ok(outcome)
    }

    /// Tear down and remount with `artifact`
    ///
    /// # Errors
    /// Returns [`SandboxError::NotValid`] for artifacts that did not pass validation
    pub fn mount(&self, artifact: CodeArtifact, title: &str) -> Result<u64, WorkbenchError> {
        let mut host = self.host.lock();
        let generation = host.controller.mount(artifact)?;
        host.title = title.to_string();
        Ok(generation)
    }

    /// Remount the current artifact; `None` if nothing is mounted
    pub fn refresh(&self) -> Option<u64> {
        self.host.lock().controller.refresh()
    }

    /// Load a saved app, re-validate it and mount it
    ///
    /// # Errors
    /// See [`hydrate`]; nothing is mounted on failure
    pub async fn open_saved(&self, id: Uuid) -> Result<(AppRecord, u64), WorkbenchError> {
        let (app, artifact) = hydrate(self.store.as_ref(), &self.validator, id).await?;
        let generation = self.mount(artifact, &app.name)?;
        Ok((app, generation))
    }

    /// Persist the mounted artifact as a draft
    ///
    /// # Errors
    /// - [`WorkbenchError::NothingMounted`] without an active session
    /// - [`WorkbenchError::Store`] if persisting fails
    pub async fn save_draft(&self, app: NewApp) -> Result<AppRecord, WorkbenchError> {
        let artifact = self.current_artifact().ok_or(WorkbenchError::NothingMounted)?;
        Ok(self.store.create(app, &artifact).await?)
    }

    /// Route a raw channel message from the frame
    pub fn deliver(&self, raw: &str) -> Delivery {
        self.host.lock().controller.deliver(raw)
    }

    /// Route a decoded channel message
    pub fn handle(&self, message: ChannelMessage) -> Delivery {
        self.host.lock().controller.handle(message)
    }

    /// Poll the mount watchdog
    pub fn check_watchdog(&self, now: Instant) -> bool {
        self.host.lock().controller.check_watchdog(now)
    }

    /// Live status for the host UI
    #[must_use]
    pub fn status(&self) -> HostStatus {
        self.host.lock().controller.status()
    }

    /// Switch between source and rendered view
    pub fn toggle_source_view(&self) -> ViewMode {
        self.host.lock().controller.toggle_view()
    }

    /// Source text of the mounted artifact
    #[must_use]
    pub fn source(&self) -> Option<String> {
        self.current_artifact().map(|a| a.source().to_string())
    }

    /// Sandbox document for the active session
    ///
    /// # Errors
    /// Returns [`WorkbenchError::Sandbox`] if the document cannot be built
    pub fn document(&self) -> Result<Option<String>, WorkbenchError> {
        let host = self.host.lock();
        let Some(session) = host.controller.session() else {
            return Ok(None);
        };
        Ok(Some(self.documents.build(
            session.artifact(),
            &host.title,
            session.generation(),
        )?))
    }

    /// Isolated iframe markup for the active session
    ///
    /// # Errors
    /// Returns [`WorkbenchError::Sandbox`] if the document cannot be built
    pub fn iframe(&self) -> Result<Option<String>, WorkbenchError> {
        let host = self.host.lock();
        let Some(session) = host.controller.session() else {
            return Ok(None);
        };
        let document = self
            .documents
            .build(session.artifact(), &host.title, session.generation())?;
        Ok(Some(self.isolation.iframe_markup(
            &document,
            &host.title,
            session.generation(),
        )))
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn AppStore> {
        &self.store
    }

    fn current_artifact(&self) -> Option<CodeArtifact> {
        self.host
            .lock()
            .controller
            .session()
            .map(|s| s.artifact().clone())
    }
}
