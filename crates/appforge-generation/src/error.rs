//! Terminal failures of a `generate` call

use crate::collaborator::CollaboratorError;
use crate::types::InputError;
use appforge_artifact::ArtifactError;
use std::time::Duration;

/// Typed terminal error returned to the caller of the orchestrator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// Request rejected before any attempt
    #[error("invalid request: {0}")]
    Input(#[from] InputError),

    /// Collaborator unreachable or model missing
    #[error("generation service unavailable: {detail}")]
    Unavailable { detail: String },

    /// Collaborator refused our credentials
    #[error("generation service authentication failed")]
    Unauthenticated,

    /// Collaborator quota hit
    #[error("generation service rate limited")]
    RateLimited { retry_after: Option<Duration> },

    /// Attempt budget spent without a valid artifact
    #[error("no valid code after {attempts} attempts: {last_diagnostic}")]
    Exhausted {
        attempts: u32,
        last_diagnostic: String,
    },

    /// Artifact bookkeeping broke
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

impl GenerationError {
    /// HTTP-equivalent status for this failure
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Input(_) => 400,
            Self::Unavailable { .. } => 503,
            Self::Unauthenticated | Self::Artifact(_) => 500,
            Self::RateLimited { .. } => 429,
            Self::Exhausted { .. } => 502,
        }
    }

    /// Suggested wait before the caller tries again
    #[inline]
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Message safe to show an end user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Input(e) => e.to_string(),
            Self::Unavailable { .. } => {
                "AI model is currently unavailable. Please try again later.".to_string()
            }
            Self::Unauthenticated => {
                "AI service authentication failed. Please contact support.".to_string()
            }
            Self::RateLimited { .. } => {
                "AI service rate limit reached. Please try again in a few moments.".to_string()
            }
            Self::Exhausted {
                attempts,
                last_diagnostic,
            } => format!(
                "Could not generate valid code after {attempts} attempts. Last error: {last_diagnostic}"
            ),
            Self::Artifact(_) => "An unexpected error occurred. Please try again.".to_string(),
        }
    }

    /// Split a collaborator failure into terminal error or retryable message
    ///
    /// # Errors
    /// Returns the terminal [`GenerationError`] for unavailable, unauthenticated
    /// and rate-limited failures
    pub fn from_collaborator(err: CollaboratorError) -> Result<String, Self> {
        match err {
            CollaboratorError::Unavailable(detail) => Err(Self::Unavailable { detail }),
            CollaboratorError::Unauthenticated => Err(Self::Unauthenticated),
            CollaboratorError::RateLimited { retry_after } => {
                Err(Self::RateLimited { retry_after })
            }
            CollaboratorError::Transient(message) => Ok(message),
        }
    }
}
