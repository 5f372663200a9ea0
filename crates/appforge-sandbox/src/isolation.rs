//! Isolation boundary policy
//!
//! The boundary runs with script execution only. `allow-same-origin` and the
//! frame-escape tokens are never granted.

use crate::error::SandboxError;
use crate::html::escape_html;
use std::fmt::Write;

/// Header value for serving a sandbox document from its own URL
pub const SANDBOX_CSP_HEADER: &str = "sandbox allow-scripts";

const BASE_TOKEN: &str = "allow-scripts";

/// Tokens that would let the boundary reach the host or escape its frame
const FORBIDDEN: &[&str] = &[
    "allow-same-origin",
    "allow-top-navigation",
    "allow-top-navigation-by-user-activation",
    "allow-top-navigation-to-custom-protocols",
    "allow-popups-to-escape-sandbox",
    "allow-storage-access-by-user-activation",
];

/// Capabilities granted to the sandboxed frame
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IsolationPolicy {
    extra: Vec<String>,
}

impl IsolationPolicy {
    /// Policy with additional harmless tokens such as `allow-forms`
    ///
    /// # Errors
    /// Returns [`SandboxError::ForbiddenCapability`] for any token that weakens the boundary
    pub fn with_extra<I, S>(tokens: I) -> Result<Self, SandboxError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut extra: Vec<String> = Vec::new();
        for token in tokens {
            let token: String = token.into();
            let token = token.trim().to_ascii_lowercase();
            if token.is_empty() || token == BASE_TOKEN || extra.contains(&token) {
                continue;
            }
            if FORBIDDEN.contains(&token.as_str()) || !token.starts_with("allow-") {
                return Err(SandboxError::ForbiddenCapability(token));
            }
            extra.push(token);
        }
        Ok(Self { extra })
    }

    /// Value of the iframe `sandbox` attribute
    #[must_use]
    pub fn sandbox_attribute(&self) -> String {
        std::iter::once(BASE_TOKEN)
            .chain(self.extra.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Iframe markup embedding `document` through `srcdoc`
    ///
    /// `generation` becomes the element key so a host UI replaces the frame
    /// instead of patching it.
    #[must_use]
    pub fn iframe_markup(&self, document: &str, title: &str, generation: u64) -> String {
        let mut markup = String::with_capacity(document.len() + 256);
        let _ = write!(
            markup,
            "<iframe id=\"appforge-frame-{generation}\" data-generation=\"{generation}\" \
             title=\"{title}\" sandbox=\"{sandbox}\" referrerpolicy=\"no-referrer\" \
             data-testid=\"iframe-app-runtime\" class=\"w-full h-full border-0\" \
             srcdoc=\"{srcdoc}\"></iframe>",
            title = escape_html(title),
            sandbox = self.sandbox_attribute(),
            srcdoc = escape_html(document),
        );
        markup
    }
}
