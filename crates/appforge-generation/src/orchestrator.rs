//! Generation-retry loop
//!
//! Attempts run strictly one after another: each retry needs the previous
//! diagnostic. The loop stops at the first valid artifact, at the first
//! terminal collaborator failure, or when the budget is spent.

use crate::collaborator::TextGenerator;
use crate::error::GenerationError;
use crate::extract::extract_code;
use crate::prompt::build_prompt;
use crate::types::{
    AttemptFailure, GenerationAttempt, GenerationConfig, GenerationId, GenerationOutcome,
    GenerationRequest,
};
use appforge_artifact::CodeArtifact;
use appforge_validator::SyntaxValidator;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives attempts against a text generator until one validates
pub struct Orchestrator {
    generator: Arc<dyn TextGenerator>,
    validator: SyntaxValidator,
    config: GenerationConfig,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("validator", &self.validator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator over `generator`
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, config: GenerationConfig) -> Self {
        Self {
            validator: SyntaxValidator::new(config.entry_symbol.clone()),
            generator,
            config,
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate a validated component for `request`
    ///
    /// # Workflow
    /// 1. Check the request; input errors consume no attempts
    /// 2. For each attempt: prompt, call the collaborator, extract, validate
    /// 3. Return the first valid artifact with the attempt history
    ///
    /// # Errors
    /// - [`GenerationError::Input`] for a bad request
    /// - `Unavailable`, `Unauthenticated`, `RateLimited` on the first terminal collaborator failure
    /// - [`GenerationError::Exhausted`] when every attempt failed
    #[tracing::instrument(
        name = "generate",
        skip_all,
        fields(generation_id = %id, category = %request.category)
    )]
    pub async fn generate_with_id(
        &self,
        id: GenerationId,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        request.validate(&self.config)?;

        let max_attempts = self.config.max_attempts.max(1);
        let entry_symbol = self.validator.entry_symbol();
        info!(max_attempts, model = %self.config.model_id, "Starting generation");

        let mut attempts: Vec<GenerationAttempt> = Vec::new();
        let mut last_diagnostic: Option<String> = None;

        for number in 1..=max_attempts {
            if number > 1 {
                tokio::time::sleep(self.config.retry_delay()).await;
            }

            let prompt = build_prompt(request, entry_symbol, last_diagnostic.as_deref());
            debug!(attempt = number, prompt_len = prompt.len(), "Calling text generator");

            let response = match self.generator.complete(&prompt, &self.config.model_id).await {
                Ok(text) => text,
                Err(err) => {
                    let message = GenerationError::from_collaborator(err).map_err(|terminal| {
                        warn!(attempt = number, error = %terminal, "Terminal collaborator failure");
                        terminal
                    })?;
                    warn!(attempt = number, error = %message, "Transient collaborator failure");
                    attempts.push(GenerationAttempt {
                        number,
                        prompt,
                        artifact: None,
                        failure: Some(AttemptFailure::Transport(message)),
                    });
                    continue;
                }
            };

            let code = extract_code(&response);
            if code.is_empty() {
                warn!(attempt = number, "Empty response");
                attempts.push(GenerationAttempt {
                    number,
                    prompt,
                    artifact: None,
                    failure: Some(AttemptFailure::EmptyResponse),
                });
                continue;
            }

            let artifact = self.validator.check(CodeArtifact::candidate(code, number)?)?;
            if artifact.is_valid() {
                info!(
                    attempt = number,
                    hash = %artifact.hash().short(),
                    "Generated valid component"
                );
                attempts.push(GenerationAttempt {
                    number,
                    prompt,
                    artifact: Some(artifact.clone()),
                    failure: None,
                });
                return Ok(GenerationOutcome {
                    id,
                    artifact,
                    attempts,
                });
            }

            let diagnostic = artifact.state().reason().unwrap_or_default().to_string();
            warn!(attempt = number, diagnostic = %diagnostic, "Generated code failed validation");
            last_diagnostic = Some(diagnostic.clone());
            attempts.push(GenerationAttempt {
                number,
                prompt,
                artifact: Some(artifact),
                failure: Some(AttemptFailure::Validation(diagnostic)),
            });
        }

        // Transport text stands in only when nothing ever reached the validator
        let last_diagnostic = last_diagnostic.unwrap_or_else(|| {
            attempts
                .last()
                .and_then(|a| a.failure.as_ref())
                .map(|f| f.message().to_string())
                .unwrap_or_default()
        });
        warn!(attempts = max_attempts, "Attempt budget exhausted");
        Err(GenerationError::Exhausted {
            attempts: max_attempts,
            last_diagnostic,
        })
    }

    /// [`Self::generate_with_id`] with a fresh id
    ///
    /// # Errors
    /// See [`Self::generate_with_id`]
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.generate_with_id(GenerationId::new(), request).await
    }
}
