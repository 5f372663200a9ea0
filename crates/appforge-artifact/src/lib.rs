//! appforge Artifact Model
//!
//! The unit that flows from the generation loop into the sandbox.
//!
//! # Core Concepts
//!
//! - [`CodeArtifact`]: program text, its verdict, and the attempt that produced it
//! - [`ValidationState`]: `Unvalidated` → `Valid` | `Invalid(reason)`, recorded once
//! - [`ContentHash`]: Blake3 fingerprint of the source text
//!
//! # Example
//!
//! ```rust,ignore
//! use appforge_artifact::{CodeArtifact, ValidationState};
//!
//! let candidate = CodeArtifact::candidate(source, 1)?;
//! let artifact = candidate.record_verdict(ValidationState::Valid)?;
//! assert!(artifact.is_valid());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod artifact;
mod hash;

pub use artifact::{ArtifactError, CodeArtifact, ValidationState};
pub use hash::{ContentHash, HashError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
