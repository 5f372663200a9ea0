//! Text-generation collaborator contract

use async_trait::async_trait;
use std::time::Duration;

/// Failure categories reported by a text generator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// Model or service cannot be reached
    #[error("generation service unavailable: {0}")]
    Unavailable(String),

    /// Credentials were refused
    #[error("generation service rejected the credentials")]
    Unauthenticated,

    /// Quota or rate limit hit
    #[error("generation service rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Anything else; counts against the attempt budget
    #[error("generation request failed: {0}")]
    Transient(String),
}

impl CollaboratorError {
    /// Terminal failures stop the retry loop immediately
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Transient(_))
    }
}

/// Produces text completions for a prompt
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt` with the given model
    async fn complete(&self, prompt: &str, model_id: &str) -> Result<String, CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_is_retryable() {
        assert!(CollaboratorError::Unavailable("404".into()).is_terminal());
        assert!(CollaboratorError::Unauthenticated.is_terminal());
        assert!(CollaboratorError::RateLimited { retry_after: None }.is_terminal());
        assert!(!CollaboratorError::Transient("reset".into()).is_terminal());
    }
}
