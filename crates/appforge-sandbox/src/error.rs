//! Error types for the sandbox host

use crate::lifecycle::LifecycleState;
use appforge_artifact::{ContentHash, ValidationState};

/// Host-side sandbox failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SandboxError {
    /// Only validated artifacts may run
    #[error("artifact {hash} is not runnable ({state:?})")]
    NotValid {
        hash: ContentHash,
        state: ValidationState,
    },

    /// Transition table violation
    #[error("illegal lifecycle transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: LifecycleState,
        to: LifecycleState,
    },

    /// Entry symbol is not a plain identifier
    #[error("invalid entry symbol `{0}`")]
    InvalidEntrySymbol(String),

    /// Isolation token would weaken the boundary
    #[error("isolation capability `{0}` is not permitted")]
    ForbiddenCapability(String),

    /// Artifact text could not be encoded for embedding
    #[error("failed to encode document payload: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for SandboxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

/// A channel message that failed the shape check
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// Not JSON, unknown `type`, or missing fields
    #[error("malformed channel message: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ChannelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
