//! Sandbox settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the boundary loads its runtime from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeAssets {
    /// React UMD build
    pub react_url: String,
    /// ReactDOM UMD build
    pub react_dom_url: String,
    /// Babel standalone (JSX transform)
    pub babel_url: String,
    /// Tailwind play CDN
    pub tailwind_url: String,
}

impl Default for RuntimeAssets {
    fn default() -> Self {
        Self {
            react_url: "https://unpkg.com/react@18/umd/react.production.min.js".to_string(),
            react_dom_url: "https://unpkg.com/react-dom@18/umd/react-dom.production.min.js"
                .to_string(),
            babel_url: "https://unpkg.com/@babel/standalone/babel.min.js".to_string(),
            tailwind_url: "https://cdn.tailwindcss.com".to_string(),
        }
    }
}

impl RuntimeAssets {
    /// Every script URL, in load order
    #[must_use]
    pub fn scripts(&self) -> [&str; 4] {
        [
            &self.react_url,
            &self.react_dom_url,
            &self.babel_url,
            &self.tailwind_url,
        ]
    }

    /// Distinct `scheme://host[:port]` origins of the script URLs
    #[must_use]
    pub fn origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = Vec::new();
        for url in self.scripts() {
            if let Some(origin) = origin_of(url) {
                if !origins.iter().any(|o| o == origin) {
                    origins.push(origin.to_string());
                }
            }
        }
        origins
    }
}

fn origin_of(url: &str) -> Option<&str> {
    let scheme_end = url.find("://")? + 3;
    let host_end = url[scheme_end..]
        .find(['/', '?', '#'])
        .map_or(url.len(), |i| scheme_end + i);
    (host_end > scheme_end).then(|| &url[..host_end])
}

/// Sandbox host settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Runtime script locations
    #[serde(flatten)]
    pub assets: RuntimeAssets,
    /// Watchdog for a mount that never reports; 0 disables
    pub mount_timeout_ms: u64,
    /// Extra iframe sandbox tokens beyond `allow-scripts`
    pub allow: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            assets: RuntimeAssets::default(),
            mount_timeout_ms: 10_000,
            allow: Vec::new(),
        }
    }
}

impl SandboxConfig {
    /// Watchdog duration, if enabled
    #[inline]
    #[must_use]
    pub fn mount_timeout(&self) -> Option<Duration> {
        (self.mount_timeout_ms > 0).then(|| Duration::from_millis(self.mount_timeout_ms))
    }
}
