use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::PageSize;
use crate::error::{DashError, Result};

/// Default backend location
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Centralized configuration for regdash
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub view: ViewDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST backend; `${VAR}` references are expanded
    pub base_url: String,
    pub timeout_secs: u64,
    /// Accept invalid TLS certificates (local development only)
    pub insecure: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            insecure: false,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewDefaults {
    pub page_size: PageSize,
    pub refresh_interval_secs: u64,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self {
            page_size: PageSize::Ten,
            refresh_interval_secs: 60,
        }
    }
}

impl ViewDefaults {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

impl DashConfig {
    /// Load config from `$REGDASH_CONFIG` or ~/.regdash/config.toml.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.expand_variables();
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML text without touching the filesystem or the environment
    pub fn parse(content: &str) -> Result<Self> {
        let config = Self::from_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DashError::config(format!("invalid TOML: {}", e)))
    }

    /// Get config file path: $REGDASH_CONFIG or ~/.regdash/config.toml
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var("REGDASH_CONFIG") {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        Self::home_dir().join("config.toml")
    }

    /// ~/.regdash, also used for TUI logs
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".regdash")
    }

    /// Check values that serde alone cannot
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let url = self.api.base_url.trim();
        if url.is_empty() {
            errors.push("api.base_url is empty".to_string());
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("api.base_url must be http(s): {}", url));
        }
        if self.api.timeout_secs == 0 {
            errors.push("api.timeout_secs must be at least 1".to_string());
        }
        if self.view.refresh_interval_secs == 0 {
            errors.push("view.refresh_interval_secs must be at least 1".to_string());
        }

        if !errors.is_empty() {
            return Err(DashError::config(errors.join("; ")));
        }
        Ok(())
    }

    /// Expand ${var} references in the base URL from the environment
    fn expand_variables(&mut self) {
        let vars: HashMap<String, String> = env::vars().collect();
        self.api.base_url = Self::expand_string(&self.api.base_url, &vars);
    }

    /// Expand ${var} references in a string
    fn expand_string(s: &str, vars: &HashMap<String, String>) -> String {
        let mut result = s.to_string();

        for (key, value) in vars {
            let pattern = format!("${{{}}}", key);
            if result.contains(&pattern) {
                result = result.replace(&pattern, value);
            }
        }

        result
    }

    /// Save config to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| DashError::config(format!("failed to serialize config: {}", e)))?;

        fs::write(path, toml_str)?;
        Ok(())
    }
}
