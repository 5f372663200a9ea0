//! appforge Syntax Validator
//!
//! Decides whether a generated component can be handed to the sandbox.
//! Rules run in order and stop at the first failure:
//!
//! 1. no line may start with an `import` declaration
//! 2. no line may start with an `export` declaration
//! 3. the text must parse as JavaScript + JSX (no TypeScript-only syntax)
//! 4. the early errors a JSX compiler raises must not occur: mismatched
//!    closing tags, redeclared bindings, misplaced `await`, `break`,
//!    `continue` or `return`
//!
//! The validator is a pure function of its input. A rejection carries the
//! diagnostic verbatim; the generation loop feeds it back to the model.
//!
//! # Example
//!
//! ```rust,ignore
//! use appforge_validator::{SyntaxValidator, Verdict};
//!
//! let validator = SyntaxValidator::default();
//! match validator.validate(source) {
//!     Verdict::Valid => mount(source),
//!     Verdict::Invalid { reason } => retry_with(reason),
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod early;
mod rules;
mod syntax;

pub use syntax::Diagnostic;

use appforge_artifact::{ArtifactError, CodeArtifact, ValidationState};
use serde::{Serialize, Serializer};

/// Entry symbol the sandbox mounts when none is configured
pub const DEFAULT_ENTRY_SYMBOL: &str = "App";

/// Pass/fail result of a validation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Safe to hand to the sandbox
    Valid,
    /// Rejected; `reason` is the diagnostic text
    Invalid { reason: String },
}

impl Verdict {
    /// Whether the source passed
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Rejection reason, if any
    #[inline]
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid { reason } => Some(reason),
        }
    }
}

impl From<Verdict> for ValidationState {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Valid => ValidationState::Valid,
            Verdict::Invalid { reason } => ValidationState::Invalid(reason),
        }
    }
}

/// Serializes as `{"valid": true}` or `{"valid": false, "reason": "..."}`
impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            valid: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            reason: Option<&'a str>,
        }

        Wire {
            valid: self.is_valid(),
            reason: self.reason(),
        }
        .serialize(serializer)
    }
}

/// Syntax gate for generated components
#[derive(Debug, Clone)]
pub struct SyntaxValidator {
    entry_symbol: String,
}

impl Default for SyntaxValidator {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRY_SYMBOL)
    }
}

impl SyntaxValidator {
    /// Create a validator; `entry_symbol` only shapes the export hint
    #[inline]
    #[must_use]
    pub fn new(entry_symbol: impl Into<String>) -> Self {
        Self {
            entry_symbol: entry_symbol.into(),
        }
    }

    /// Entry symbol named in diagnostics
    #[inline]
    #[must_use]
    pub fn entry_symbol(&self) -> &str {
        &self.entry_symbol
    }

    /// Run every rule against `source`
    #[must_use]
    pub fn validate(&self, source: &str) -> Verdict {
        if let Some((construct, line)) = rules::find_module_construct(source) {
            return Verdict::Invalid {
                reason: rules::module_reason(construct, line, &self.entry_symbol),
            };
        }

        match syntax::parse_structure(source) {
            Ok(()) => Verdict::Valid,
            Err(diagnostic) => Verdict::Invalid {
                reason: diagnostic.to_string(),
            },
        }
    }

    /// Validate an unvalidated artifact and record the verdict on it
    ///
    /// # Errors
    /// Returns [`ArtifactError::AlreadyValidated`] if the artifact was checked before
    pub fn check(&self, artifact: CodeArtifact) -> Result<CodeArtifact, ArtifactError> {
        let verdict = self.validate(artifact.source());
        artifact.record_verdict(verdict.into())
    }
}

/// Validate with the default entry symbol
#[must_use]
pub fn validate(source: &str) -> Verdict {
    SyntaxValidator::default().validate(source)
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
