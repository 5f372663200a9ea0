//! Testing utilities for appforge workspace
//!
//! Shared test helpers, fixtures, and a scripted text generator.

#![allow(missing_docs)]

use appforge_artifact::CodeArtifact;
use appforge_generation::{CollaboratorError, TextGenerator};
use appforge_validator::SyntaxValidator;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Clean component, accepted by the validator
pub const TIP_CALCULATOR: &str = r#"function App() {
  const [bill, setBill] = React.useState('');
  const [tip, setTip] = React.useState(15);
  const amount = Number(bill) || 0;
  const total = amount * (1 + tip / 100);

  return (
    <div className="p-6 max-w-sm mx-auto space-y-4">
      <h1 className="text-xl font-bold">Tip Calculator</h1>
      <input
        data-testid="input-bill"
        className="border rounded p-2 w-full"
        value={bill}
        onChange={(e) => setBill(e.target.value)}
      />
      <div className="flex gap-2">
        {[10, 15, 20].map((pct) => (
          <button key={pct} data-testid={`button-tip-${pct}`} onClick={() => setTip(pct)}>
            {pct}%
          </button>
        ))}
      </div>
      <p data-testid="text-total">Total: ${total.toFixed(2)}</p>
    </div>
  );
}
"#;

/// Same component with the module import models like to add
pub fn tip_calculator_with_import() -> String {
    format!("import React from 'react';\n\n{TIP_CALCULATOR}")
}

/// Three sources that pass the module rules but fail to parse, each differently
pub const PARSE_FAILURES: [&str; 3] = [
    "function App() {\n  return <div>;\n}\n",
    "function App() {\n  const total = ;\n  return <p>{total}</p>;\n}\n",
    "function App( {\n  return null;\n}\n",
];

/// Parses, but throws while rendering
pub const THROWING_APP: &str = r#"function App() {
  const items = undefined;
  return <ul>{items.map((item) => <li key={item}>{item}</li>)}</ul>;
}
"#;

/// Validate `source` as attempt 1 and return the verdict-carrying artifact
///
/// # Panics
/// Never for attempt 1; the artifact is fresh
pub fn checked_artifact(source: &str) -> CodeArtifact {
    let candidate = CodeArtifact::candidate(source, 1).expect("attempt 1 is valid");
    SyntaxValidator::default()
        .check(candidate)
        .expect("fresh candidate accepts a verdict")
}

/// Artifact for [`TIP_CALCULATOR`], already `Valid`
pub fn valid_artifact() -> CodeArtifact {
    let artifact = checked_artifact(TIP_CALCULATOR);
    assert!(artifact.is_valid(), "fixture must validate: {:?}", artifact.state());
    artifact
}

/// A recorded collaborator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub prompt: String,
    pub model_id: String,
}

/// Text generator that replays queued responses and records every call
///
/// Once the script runs dry every call fails with a transient error.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, CollaboratorError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    /// Empty script
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    #[must_use]
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.script.lock().push_back(Ok(text.into()));
        self
    }

    /// Queue a failure
    #[must_use]
    pub fn then_error(self, error: CollaboratorError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of calls so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Prompt of the n-th call (0-based)
    pub fn prompt(&self, index: usize) -> Option<String> {
        self.calls.lock().get(index).map(|c| c.prompt.clone())
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, prompt: &str, model_id: &str) -> Result<String, CollaboratorError> {
        self.calls.lock().push(RecordedCall {
            prompt: prompt.to_string(),
            model_id: model_id.to_string(),
        });
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(CollaboratorError::Transient("script exhausted".into())))
    }
}
