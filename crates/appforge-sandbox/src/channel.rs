//! Sandbox channel protocol
//!
//! Fire-and-forget events posted by the boundary to the host. The host trusts
//! nothing but the shape: a `type` that is one of three literals and the
//! generation the boundary was built for.
//!
//! ```json
//! {"type":"ERROR","generation":4,"message":"x is not defined","stack":"..."}
//! ```

use crate::error::ChannelError;
use serde::{Deserialize, Serialize};

/// Structured error raised inside the boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorReport {
    /// Report without a stack
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    /// With stack trace
    #[inline]
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

/// Event kinds the boundary can emit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SandboxEvent {
    /// Runtime loaded
    Ready,
    /// Entry point mounted without throwing
    Rendered,
    /// Something threw
    Error(ErrorReport),
}

impl SandboxEvent {
    /// Wire literal of the `type` field
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Rendered => "RENDERED",
            Self::Error(_) => "ERROR",
        }
    }
}

/// One message on the channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Generation of the boundary that sent it
    pub generation: u64,
    #[serde(flatten)]
    pub event: SandboxEvent,
}

impl ChannelMessage {
    /// Create a message
    #[inline]
    #[must_use]
    pub fn new(generation: u64, event: SandboxEvent) -> Self {
        Self { generation, event }
    }

    /// Parse and shape-check a raw message
    ///
    /// # Errors
    /// Returns [`ChannelError::Malformed`] for anything but the three known shapes
    pub fn parse(raw: &str) -> Result<Self, ChannelError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Shape-check an already decoded value
    ///
    /// # Errors
    /// Returns [`ChannelError::Malformed`] for anything but the three known shapes
    pub fn from_value(value: serde_json::Value) -> Result<Self, ChannelError> {
        Ok(serde_json::from_value(value)?)
    }
}
