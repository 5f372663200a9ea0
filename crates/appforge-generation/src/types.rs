//! Request, configuration and attempt history types

use appforge_artifact::CodeArtifact;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use ulid::Ulid;

/// Identifies one `generate` call in logs (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GenerationId(pub Ulid);

impl GenerationId {
    /// Generate new id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Natural-language description of the app
    pub description: String,
    /// Marketplace category
    pub category: String,
    /// Target price in dollars
    pub price: f64,
}

impl GenerationRequest {
    /// Create a request
    #[inline]
    #[must_use]
    pub fn new(description: impl Into<String>, category: impl Into<String>, price: f64) -> Self {
        Self {
            description: description.into(),
            category: category.into(),
            price,
        }
    }

    /// Check the input constraints before any attempt is spent
    ///
    /// # Errors
    /// Returns the first violated constraint
    pub fn validate(&self, config: &GenerationConfig) -> Result<(), InputError> {
        if self.description.trim().is_empty() {
            return Err(InputError::EmptyDescription);
        }
        if self.category.trim().is_empty() {
            return Err(InputError::EmptyCategory);
        }
        if !(config.min_price..=config.max_price).contains(&self.price) {
            return Err(InputError::PriceOutOfRange {
                min: config.min_price,
                max: config.max_price,
            });
        }
        Ok(())
    }
}

/// Caller supplied an unusable request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("Description is required and must be a non-empty string")]
    EmptyDescription,

    #[error("Category is required and must be a non-empty string")]
    EmptyCategory,

    #[error("Price must be a number between {min} and {max}")]
    PriceOutOfRange { min: f64, max: f64 },
}

/// Retry policy and generation constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Collaborator calls allowed per `generate`
    pub max_attempts: u32,
    /// Pause between attempts
    pub retry_delay_ms: u64,
    /// Model passed to the collaborator
    pub model_id: String,
    /// Lowest accepted price
    pub min_price: f64,
    /// Highest accepted price
    pub max_price: f64,
    /// Top-level function the sandbox mounts
    pub entry_symbol: String,
}

impl GenerationConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With attempt budget (at least 1)
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max.max(1);
        self
    }

    /// With delay between attempts
    #[inline]
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With model id
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// With accepted price range
    #[inline]
    #[must_use]
    pub fn with_price_range(mut self, min: f64, max: f64) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    /// With entry symbol
    #[inline]
    #[must_use]
    pub fn with_entry_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.entry_symbol = symbol.into();
        self
    }

    /// Delay between attempts
    #[inline]
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1000,
            model_id: "meta-llama/llama-3.3-70b-instruct".to_string(),
            min_price: 0.05,
            max_price: 10.0,
            entry_symbol: appforge_validator::DEFAULT_ENTRY_SYMBOL.to_string(),
        }
    }
}

/// Why an attempt did not produce a valid artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// Transient collaborator failure
    Transport(String),
    /// Collaborator answered with nothing usable
    EmptyResponse,
    /// Validator rejected the code
    Validation(String),
}

impl AttemptFailure {
    /// Text reported to the caller when this was the last attempt
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Transport(message) | Self::Validation(message) => message,
            Self::EmptyResponse => "model returned an empty response",
        }
    }

    /// Whether the failure came from the validator
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(m) => write!(f, "transport: {m}"),
            Self::EmptyResponse => f.write_str("empty response"),
            Self::Validation(m) => write!(f, "validation: {m}"),
        }
    }
}

/// One round-trip to the collaborator
#[derive(Debug, Clone)]
pub struct GenerationAttempt {
    /// 1-based, strictly increasing
    pub number: u32,
    /// Prompt sent for this attempt
    pub prompt: String,
    /// Artifact built from the response, valid or not
    pub artifact: Option<CodeArtifact>,
    /// Set unless the artifact is valid
    pub failure: Option<AttemptFailure>,
}

/// Successful generation plus how it got there
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Log correlation id
    pub id: GenerationId,
    /// The first valid artifact
    pub artifact: CodeArtifact,
    /// Every attempt in order, the last one being the success
    pub attempts: Vec<GenerationAttempt>,
}

impl GenerationOutcome {
    /// Validated source text
    #[inline]
    #[must_use]
    pub fn code(&self) -> &str {
        self.artifact.source()
    }

    /// Collaborator calls spent
    #[inline]
    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }
}
