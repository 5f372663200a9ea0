use appforge_core::AppStore;
use appforge_generation::Orchestrator;
use appforge_sandbox::{DocumentBuilder, SandboxConfig, SandboxError};
use appforge_validator::SyntaxValidator;
use std::sync::Arc;

struct Inner {
    orchestrator: Orchestrator,
    store: Arc<dyn AppStore>,
    validator: SyntaxValidator,
    documents: DocumentBuilder,
}

/// Shared handler state; cheap to clone
#[derive(Clone)]
pub struct ServiceState {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceState")
            .field("orchestrator", &self.inner.orchestrator)
            .field("entry_symbol", &self.inner.validator.entry_symbol())
            .finish_non_exhaustive()
    }
}

impl ServiceState {
    /// Wire the service to its collaborators
    ///
    /// # Errors
    /// Returns [`SandboxError`] if the sandbox settings are unusable
    pub fn new(
        orchestrator: Orchestrator,
        store: Arc<dyn AppStore>,
        sandbox: &SandboxConfig,
    ) -> Result<Self, SandboxError> {
        let entry_symbol = orchestrator.config().entry_symbol.clone();
        Ok(Self {
            inner: Arc::new(Inner {
                validator: SyntaxValidator::new(entry_symbol.clone()),
                documents: DocumentBuilder::new(sandbox.assets.clone(), entry_symbol)?,
                orchestrator,
                store,
            }),
        })
    }

    #[inline]
    pub(crate) fn orchestrator(&self) -> &Orchestrator {
        &self.inner.orchestrator
    }

    #[inline]
    pub(crate) fn store(&self) -> &dyn AppStore {
        self.inner.store.as_ref()
    }

    #[inline]
    pub(crate) fn validator(&self) -> &SyntaxValidator {
        &self.inner.validator
    }

    #[inline]
    pub(crate) fn documents(&self) -> &DocumentBuilder {
        &self.inner.documents
    }
}
