//! appforge Core
//!
//! Host-facing facade tying the pipeline together: generation requests,
//! saved apps and the sandbox lifecycle of one host view.
//!
//! # Core Concepts
//!
//! - **AppStore**: persistence collaborator; only validated code is stored
//! - **Hydration**: saved code is re-validated before it is mounted
//! - **Workbench**: `request_generation`, `mount`, `refresh`, `open_saved`,
//!   `deliver`, `status`
//!
//! # Example
//!
//! ```rust,ignore
//! use appforge_core::{InMemoryAppStore, Workbench};
//!
//! let workbench = Workbench::new(orchestrator, Arc::new(InMemoryAppStore::new()), &sandbox)?;
//! let outcome = workbench.request_generation(&request).await?;
//! let iframe = workbench.iframe()?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod store;
mod workbench;

pub use store::{AppRecord, AppStatus, AppStore, AppSummary, InMemoryAppStore, NewApp, StoreError};
pub use workbench::{hydrate, Workbench, WorkbenchError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
