//! Configuration for the relay and the agent session.
//!
//! Settings are layered: built-in defaults, then `~/.omniverse/config.toml`, then
//! `./.omniverserc`, then environment variables. Each file is read as a [`ConfigLayer`] whose
//! present values override what came before.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the upstream API key for the relay.
pub const ENV_RELAY_API_KEY: &str = "OMNIVERSE_RELAY_API_KEY";
/// Environment variable overriding the relay's upstream URL.
pub const ENV_UPSTREAM_URL: &str = "OMNIVERSE_UPSTREAM_URL";
/// Environment variable overriding the agent's chat endpoint.
pub const ENV_ENDPOINT: &str = "OMNIVERSE_ENDPOINT";
/// Environment variable overriding the agent's model id.
pub const ENV_MODEL: &str = "OMNIVERSE_MODEL";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Chat relay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Address the relay listens on.
    pub address: SocketAddr,
    /// Chat-completions URL requests are forwarded to.
    pub upstream_url: String,
    /// Model id sent upstream regardless of what the client asked for.
    pub default_model: String,
    /// Bearer token for the upstream. Only ever read from config or environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_relay_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 54321))
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            address: default_relay_address(),
            upstream_url: "https://api.blackbox.ai/api/v1/chat/completions".to_string(),
            default_model: "deepseek-ai/DeepSeek-V3".to_string(),
            api_key: None,
        }
    }
}

/// Agent session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Chat-completions endpoint the agent talks to, usually a running relay.
    pub endpoint: String,
    /// Model id sent with each request.
    pub model: String,
    /// Upper bound on one model call.
    pub request_timeout_ms: u64,
    /// How long the simulated deploy takes.
    pub deploy_delay_ms: u64,
    /// URL reported once a deploy finishes.
    pub deploy_url: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: format!("http://{}/", default_relay_address()),
            model: "GPT-5.2".to_string(),
            request_timeout_ms: 120_000,
            deploy_delay_ms: 2_500,
            deploy_url: "https://omniverse-app.web.app/demo".to_string(),
        }
    }
}

impl AgentConfig {
    /// The model-call timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The deploy delay as a [`Duration`].
    #[must_use]
    pub fn deploy_delay(&self) -> Duration {
        Duration::from_millis(self.deploy_delay_ms)
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmniverseConfig {
    /// Relay section.
    pub relay: RelayConfig,
    /// Agent section.
    pub agent: AgentConfig,
    /// Log level used when the CLI flag is left at its default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// `[relay]` as it appears in a config file; every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayLayer {
    #[serde(default)]
    pub address: Option<SocketAddr>,
    #[serde(default)]
    pub upstream_url: Option<String>,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// `[agent]` as it appears in a config file; every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentLayer {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub deploy_delay_ms: Option<u64>,
    #[serde(default)]
    pub deploy_url: Option<String>,
}

/// One configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default)]
    pub relay: RelayLayer,
    #[serde(default)]
    pub agent: AgentLayer,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl ConfigLayer {
    /// Parses a layer from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] on malformed TOML or unknown keys.
    pub fn parse(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Loads a layer from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }
}

fn set<T: Clone>(target: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

impl OmniverseConfig {
    /// Default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".omniverse")
            .join("config.toml")
    }

    /// Default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".omniverserc")
    }

    /// Loads the global and local files over the defaults, then applies environment overrides.
    ///
    /// Missing files are skipped. A file that exists but cannot be parsed is an error so a typo
    /// does not silently fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn discover_and_load() -> ConfigResult<Self> {
        let mut config = Self::default();
        for path in [Self::default_global_path(), Self::default_local_path()] {
            config.load_optional(&path)?;
        }
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads `path` over the defaults, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let mut config = Self::default();
        config.merge(&ConfigLayer::load_from_file(path)?);
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_optional(&mut self, path: &Path) -> ConfigResult<()> {
        match ConfigLayer::load_from_file(path) {
            Ok(layer) => {
                tracing::debug!(path = %path.display(), "Loaded configuration file");
                self.merge(&layer);
                Ok(())
            }
            Err(ConfigError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Merges a layer into this configuration. Present values win.
    pub fn merge(&mut self, layer: &ConfigLayer) {
        let relay = &layer.relay;
        set(&mut self.relay.address, relay.address.as_ref());
        set(&mut self.relay.upstream_url, relay.upstream_url.as_ref());
        set(&mut self.relay.default_model, relay.default_model.as_ref());
        if relay.api_key.is_some() {
            self.relay.api_key.clone_from(&relay.api_key);
        }

        let agent = &layer.agent;
        set(&mut self.agent.endpoint, agent.endpoint.as_ref());
        set(&mut self.agent.model, agent.model.as_ref());
        set(&mut self.agent.request_timeout_ms, agent.request_timeout_ms.as_ref());
        set(&mut self.agent.deploy_delay_ms, agent.deploy_delay_ms.as_ref());
        set(&mut self.agent.deploy_url, agent.deploy_url.as_ref());

        if layer.log_level.is_some() {
            self.log_level.clone_from(&layer.log_level);
        }
    }

    /// Applies environment overrides through `lookup`. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_RELAY_API_KEY) {
            self.relay.api_key = Some(key);
        }
        if let Some(url) = get(ENV_UPSTREAM_URL) {
            self.relay.upstream_url = url;
        }
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            self.agent.endpoint = endpoint;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.agent.model = model;
        }
    }
}
