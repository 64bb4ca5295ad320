// src/infra/config.rs — Configuration loading (TOML + environment)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::errors::GenStreamError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Where the streaming endpoint lives. The default matches the proxy that
/// serves the host page, so requests stay same-origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub endpoint: String,
    pub connect_timeout_secs: u64,
    pub connect_retries: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            endpoint: "/api/generate".into(),
            connect_timeout_secs: 10,
            connect_retries: 2,
        }
    }
}

/// Initial values of the request form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: Option<String>,
    pub keep_alive: String,
    pub num_predict: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            keep_alive: "5m".into(),
            num_predict: 512,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub hard_timeout_secs: u64,
    pub silence_threshold_ms: u64,
    pub tick_interval_ms: u64,
    /// 0 disables escalation: malformed lines are dropped forever.
    pub max_consecutive_parse_failures: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hard_timeout_secs: 60,
            silence_threshold_ms: 4_000,
            tick_interval_ms: 100,
            max_consecutive_parse_failures: 16,
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults, then apply env overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `GENSTREAM_*` overrides. `lookup` is injectable so tests don't
    /// have to touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GENSTREAM_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.server.base_url = url.trim().to_string();
        }
        if let Some(model) = lookup("GENSTREAM_MODEL") {
            let model = model.trim();
            self.generation.model = (!model.is_empty()).then(|| model.to_string());
        }
        if let Some(keep_alive) = lookup("GENSTREAM_KEEP_ALIVE").filter(|v| !v.trim().is_empty()) {
            self.generation.keep_alive = keep_alive.trim().to_string();
        }
        if let Some(raw) = lookup("GENSTREAM_NUM_PREDICT") {
            match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => self.generation.num_predict = n,
                _ => tracing::warn!("Ignoring GENSTREAM_NUM_PREDICT={:?}: not a positive integer", raw),
            }
        }
    }

    /// Reject settings the client cannot work with.
    pub fn validate(&self) -> Result<(), GenStreamError> {
        let url = url::Url::parse(&self.server.base_url).map_err(|e| {
            GenStreamError::Config(format!("invalid base_url '{}': {}", self.server.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GenStreamError::Config(format!(
                "base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if !self.server.endpoint.starts_with('/') {
            return Err(GenStreamError::Config(format!(
                "endpoint must start with '/', got '{}'",
                self.server.endpoint
            )));
        }
        if self.session.tick_interval_ms == 0 {
            return Err(GenStreamError::Config("tick_interval_ms must be > 0".into()));
        }
        Ok(())
    }
}
