//! `appforge.toml` loading
//!
//! A missing file means defaults. Environment overrides are applied last.

use anyhow::Context;
use appforge_generation::{GenerationConfig, ProviderConfig};
use appforge_sandbox::SandboxConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

pub(crate) const DEFAULT_CONFIG_FILE: &str = "appforge.toml";

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ServerConfig {
    pub(crate) listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:5000".to_string(),
        }
    }
}

impl ServerConfig {
    pub(crate) fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listen
            .parse()
            .with_context(|| format!("invalid listen address {:?}", self.listen))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppforgeConfig {
    pub(crate) generation: GenerationConfig,
    pub(crate) provider: ProviderConfig,
    pub(crate) sandbox: SandboxConfig,
    pub(crate) server: ServerConfig,
}

/// Read `path` (or `appforge.toml`), then apply process env overrides
pub(crate) fn load(path: Option<&Path>) -> anyhow::Result<AppforgeConfig> {
    let explicit = path.is_some();
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    let mut config = if path.exists() {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?
    } else if explicit {
        anyhow::bail!("config file {} does not exist", path.display());
    } else {
        AppforgeConfig::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Apply `APPFORGE_*` overrides read through `var`
pub(crate) fn apply_env_overrides<F>(config: &mut AppforgeConfig, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    let value = |key: &str| {
        var(key)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
    };

    if let Some(key) = value("APPFORGE_API_KEY") {
        config.provider.api_key = Some(key);
    }
    if let Some(url) = value("APPFORGE_BASE_URL") {
        config.provider.base_url = url;
    }
    if let Some(model) = value("APPFORGE_MODEL") {
        config.generation.model_id = model;
    }
    if let Some(listen) = value("APPFORGE_LISTEN") {
        config.server.listen = listen;
    }
}
