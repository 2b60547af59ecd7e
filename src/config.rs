//! Process configuration.
//!
//! Loaded from a YAML file (path in `RAHL_CONFIG`) and then overridden by
//! `HOST` / `PORT` from the environment. Every section is optional:
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 10000
//! capabilities:
//!   enabled: [calculator, summarizer]
//!   settings:
//!     summarizer: { default_ratio: 0.4 }
//! detection:
//!   rules:
//!     - keywords: [search, find]
//!       capability: web_search
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::capabilities::detection::{DetectionRule, DetectionRules};

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "RAHL_CONFIG";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value is present but unusable.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RahlConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub capabilities: CapabilitiesConfig,

    #[serde(default)]
    pub detection: DetectionConfig,
}

/// HTTP bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which built-in capabilities to register and how to build them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilitiesConfig {
    /// Names to register, in order. `None` registers the whole catalog.
    #[serde(default)]
    pub enabled: Option<Vec<String>>,

    /// Per-capability settings passed to the constructor.
    #[serde(default)]
    pub settings: HashMap<String, Value>,
}

impl CapabilitiesConfig {
    /// Settings block for a capability, `Value::Null` when absent.
    pub fn settings_for(&self, name: &str) -> Value {
        self.settings.get(name).cloned().unwrap_or(Value::Null)
    }
}

/// Detection table override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Replaces the default table when present.
    #[serde(default)]
    pub rules: Option<Vec<DetectionRule>>,
}

impl DetectionConfig {
    /// The configured table, or the default one.
    pub fn table(&self) -> DetectionRules {
        match &self.rules {
            Some(rules) => DetectionRules::from_rules(rules.clone()),
            None => DetectionRules::default(),
        }
    }
}

impl RahlConfig {
    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: RahlConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load from `RAHL_CONFIG` if set, else defaults, then apply env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// `load` against an arbitrary variable lookup.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_ENV).filter(|p| !p.is_empty()) {
            Some(path) => {
                log::info!("Loading configuration from {}", path);
                Self::from_yaml_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Override server settings from `HOST` and `PORT`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST").filter(|h| !h.is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Validation(format!("Invalid PORT '{}'", port)))?;
        }
        Ok(())
    }

    /// Check detection rules and normalize their keywords to lowercase.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if let Some(rules) = self.detection.rules.as_mut() {
            for (i, rule) in rules.iter_mut().enumerate() {
                if rule.capability.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "Detection rule {} has no capability",
                        i
                    )));
                }
                rule.keywords = rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                if rule.keywords.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "Detection rule {} ({}) has no keywords",
                        i, rule.capability
                    )));
                }
            }
        }
        Ok(())
    }
}
