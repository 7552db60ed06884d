//! Configuration loaded from `config.toml` with environment overrides
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 5003
//!
//! [usage]
//! cooldown_secs = 0
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub usage: UsageSettings,
}

/// Bind address for the HTTP API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5003
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSettings {
    /// Usages of the same prompt closer together than this count once
    #[serde(default)]
    pub cooldown_secs: u64,
}

impl UsageSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

impl Settings {
    /// Read settings from `path` (defaults when the file is missing), then
    /// apply `PROMPTREPO_HOST`, `PROMPTREPO_PORT` and
    /// `PROMPTREPO_USAGE_COOLDOWN`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = Self::from_file(path)?;
        settings.apply_env()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write config file: {:?}", path))
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = env::var("PROMPTREPO_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PROMPTREPO_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid PROMPTREPO_PORT: {}", port))?;
        }
        if let Ok(cooldown) = env::var("PROMPTREPO_USAGE_COOLDOWN") {
            self.usage.cooldown_secs = cooldown
                .parse()
                .with_context(|| format!("Invalid PROMPTREPO_USAGE_COOLDOWN: {}", cooldown))?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
