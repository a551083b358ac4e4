use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::client::normalize_base_url;
use crate::session::store::FileStore;

pub const CONFIG_FILENAME: &str = ".vitals2coach.toml";
pub const DEFAULT_API_URL: &str = "https://visioncoachai-staging-api.azurewebsites.net";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub session_path: Option<PathBuf>,
    #[serde(default)]
    pub samples_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            session_path: None,
            samples_path: None,
        }
    }
}

impl Config {
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Configured session file, or the per-user default
    pub fn session_file(&self) -> Result<PathBuf> {
        match &self.session_path {
            Some(path) => Ok(path.clone()),
            None => FileStore::default_path()
                .ok_or_else(|| anyhow::anyhow!("No config directory; set session_path")),
        }
    }

    /// Apply command-line/env overrides and validate
    pub fn with_overrides(mut self, api_url: Option<String>, session: Option<PathBuf>) -> Result<Self> {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(path) = session {
            self.session_path = Some(path);
        }
        self.api_url = normalize_base_url(&self.api_url).map_err(anyhow::Error::msg)?;
        Ok(self)
    }
}

pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.as_ref().display()))?;
    Ok(config)
}

/// Load from `path` if it exists, defaults otherwise
pub fn load_or_default(path: impl AsRef<Path>) -> Result<Config> {
    if path.as_ref().exists() {
        load_config_from_path(path)
    } else {
        Ok(Config::default())
    }
}
