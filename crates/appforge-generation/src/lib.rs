//! appforge Generation
//!
//! Turns a natural-language app description into a validated component by
//! looping over a text-generation collaborator and the syntax validator.
//!
//! # Core Concepts
//!
//! - **Attempt**: one collaborator call plus validation of what came back
//! - **Feedback**: a rejected attempt's diagnostic, appended to the next prompt
//! - **Terminal error**: unavailable, unauthenticated or rate limited; stops at once
//!
//! # Example
//!
//! ```rust,ignore
//! use appforge_generation::{ChatCompletionsClient, GenerationConfig, GenerationRequest, Orchestrator};
//! use std::sync::Arc;
//!
//! let client = ChatCompletionsClient::new(&provider)?;
//! let orchestrator = Orchestrator::new(Arc::new(client), GenerationConfig::default());
//! let outcome = orchestrator
//!     .generate(&GenerationRequest::new("a tip calculator", "Finance", 0.75))
//!     .await?;
//! println!("{}", outcome.code());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod collaborator;
mod error;
mod extract;
mod http;
mod orchestrator;
mod prompt;
mod types;

pub use collaborator::{CollaboratorError, TextGenerator};
pub use error::GenerationError;
pub use extract::extract_code;
pub use http::{ChatCompletionsClient, ProviderConfig};
pub use orchestrator::Orchestrator;
pub use prompt::{build_prompt, FEEDBACK_PREFIX};
pub use types::{
    AttemptFailure, GenerationAttempt, GenerationConfig, GenerationId, GenerationOutcome,
    GenerationRequest, InputError,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
