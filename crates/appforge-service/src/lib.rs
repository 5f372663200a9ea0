//! appforge Service
//!
//! HTTP surface over the generation pipeline, saved apps and sandbox runtime
//! documents.
//!
//! # Core Concepts
//!
//! - `POST /api/generate-app`: `{code, success, attempts}` or `{message}` with
//!   the terminal error's status (`Retry-After` on 429)
//! - `/api/apps`: create (re-validated), list, get, patch status, delete
//! - `GET /api/apps/:id/runtime?generation=N`: the sandbox document, served
//!   with `Content-Security-Policy: sandbox allow-scripts`
//!
//! # Example
//!
//! ```rust,ignore
//! use appforge_service::{serve, ServiceState};
//!
//! let state = ServiceState::new(orchestrator, store, &sandbox)?;
//! serve(state, "127.0.0.1:5000".parse()?, shutdown_signal()).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod handlers;
mod reply;
mod routes;
mod state;

pub use routes::{routes, serve};
pub use state::ServiceState;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
