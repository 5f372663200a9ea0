//! The executable unit produced by one generation attempt
//!
//! A [`CodeArtifact`] starts `Unvalidated`, receives exactly one verdict, and
//! is frozen afterwards. A later attempt never mutates an earlier artifact; it
//! creates a new one. Valid artifacts are shared behind `Arc` between the
//! orchestrator's attempt history and the active sandbox session.

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Outcome of running the syntax validator over an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum ValidationState {
    /// Not yet checked
    Unvalidated,
    /// Passed every validation rule
    Valid,
    /// Rejected with the validator's diagnostic
    Invalid(String),
}

impl ValidationState {
    /// Diagnostic for an invalid artifact
    #[inline]
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Invalid(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Errors related to artifact construction and promotion
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactError {
    /// Attempt numbers start at 1
    #[error("attempt number must be at least 1")]
    InvalidAttempt,

    /// A verdict was recorded twice
    #[error("artifact {hash} already carries a verdict ({state:?})")]
    AlreadyValidated {
        hash: ContentHash,
        state: ValidationState,
    },

    /// A verdict of `Unvalidated` carries no information
    #[error("cannot record an unvalidated verdict")]
    EmptyVerdict,
}

/// Program text plus the verdict and provenance that travel with it
#[derive(Clone, PartialEq, Eq)]
pub struct CodeArtifact {
    source: Arc<str>,
    hash: ContentHash,
    state: ValidationState,
    attempt: u32,
}

impl CodeArtifact {
    /// Create an unvalidated candidate for the given attempt
    ///
    /// # Errors
    /// Returns [`ArtifactError::InvalidAttempt`] when `attempt` is 0
    pub fn candidate(source: impl Into<String>, attempt: u32) -> Result<Self, ArtifactError> {
        if attempt == 0 {
            return Err(ArtifactError::InvalidAttempt);
        }
        let source: String = source.into();
        Ok(Self {
            hash: ContentHash::of_source(&source),
            source: Arc::from(source),
            state: ValidationState::Unvalidated,
            attempt,
        })
    }

    /// Record the validator's verdict, consuming the candidate
    ///
    /// Only an `Unvalidated` artifact accepts a verdict, which keeps valid
    /// artifacts immutable.
    ///
    /// # Errors
    /// - [`ArtifactError::AlreadyValidated`] if a verdict is already present
    /// - [`ArtifactError::EmptyVerdict`] if `state` is `Unvalidated`
    pub fn record_verdict(self, state: ValidationState) -> Result<Self, ArtifactError> {
        if self.state != ValidationState::Unvalidated {
            return Err(ArtifactError::AlreadyValidated {
                hash: self.hash,
                state: self.state,
            });
        }
        if state == ValidationState::Unvalidated {
            return Err(ArtifactError::EmptyVerdict);
        }
        Ok(Self { state, ..self })
    }

    /// Raw program text
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Fingerprint of the source text
    #[inline]
    #[must_use]
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    /// Current verdict
    #[inline]
    #[must_use]
    pub fn state(&self) -> &ValidationState {
        &self.state
    }

    /// Which attempt produced this artifact (1-based)
    #[inline]
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// True once the validator accepted the source
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.state == ValidationState::Valid
    }
}

impl fmt::Debug for CodeArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeArtifact")
            .field("hash", &self.hash.short())
            .field("attempt", &self.attempt)
            .field("state", &self.state)
            .field("len", &self.source.len())
            .finish()
    }
}
