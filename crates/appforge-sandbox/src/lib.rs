//! appforge Sandbox
//!
//! Runs validated, untrusted components inside an isolation boundary that has
//! script execution and no same-origin capability.
//!
//! # Core Concepts
//!
//! - **Document**: self-contained HTML that installs error traps, loads the
//!   runtime, evaluates the artifact and mounts its entry symbol
//! - **Channel**: `READY` / `RENDERED` / `ERROR` events posted back to the
//!   host, tagged with the generation they belong to
//! - **Lifecycle**: `Empty -> Mounted <-> Errored`; every (re)mount gets a new
//!   generation and events for older generations are inert
//!
//! # Example
//!
//! ```rust,ignore
//! use appforge_sandbox::{DocumentBuilder, IsolationPolicy, LifecycleController};
//!
//! let mut controller = LifecycleController::default();
//! let generation = controller.mount(artifact.clone())?;
//! let html = DocumentBuilder::default().build(&artifact, "Tip Calculator", generation)?;
//! let iframe = IsolationPolicy::default().iframe_markup(&html, "Tip Calculator", generation);
//!
//! // later, for each message posted by the frame
//! controller.deliver(&raw_message);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod channel;
mod config;
mod document;
mod error;
mod html;
mod isolation;
mod lifecycle;
mod session;

pub use channel::{ChannelMessage, ErrorReport, SandboxEvent};
pub use config::{RuntimeAssets, SandboxConfig};
pub use document::DocumentBuilder;
pub use error::{ChannelError, SandboxError};
pub use isolation::{IsolationPolicy, SANDBOX_CSP_HEADER};
pub use lifecycle::{
    allowed_transitions, validate_transition, Delivery, HostStatus, LifecycleController,
    LifecycleState, ViewMode,
};
pub use session::SandboxSession;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
