//! CLI configuration management.
//!
//! Precedence, lowest first: built-in defaults, the JSON config file, then
//! environment variables (including a `.env` file in the working directory).

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use propweave_engine::{ConflictPolicy, WeaverConfig};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "PROPWEAVE_CONFIG";

/// Application-wide configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Weaver settings.
    #[serde(flatten)]
    pub weaver: WeaverConfig,

    /// Module woven when `--module` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl Config {
    /// Load configuration from the config file and environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if missing)
        let _ = dotenvy::dotenv();

        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config from {}", path.display()))?;
                serde_json::from_str(&contents).with_context(|| "Failed to parse config file")?
            }
            _ => Self::default(),
        };

        if let Ok(value) = std::env::var("PROPWEAVE_DEFAULT_WEAVING") {
            config.weaver.default_weaving = parse_bool(&value)
                .with_context(|| "Invalid PROPWEAVE_DEFAULT_WEAVING")?;
        }
        if let Ok(value) = std::env::var("PROPWEAVE_NAMESPACES") {
            config.weaver.namespace_filters = split_list(&value);
        }
        if let Ok(value) = std::env::var("PROPWEAVE_EVENT_INVOKER") {
            config.weaver.event_invoker_name = value;
        }
        if let Ok(value) = std::env::var("PROPWEAVE_DISABLED") {
            config.weaver.disabled =
                parse_bool(&value).with_context(|| "Invalid PROPWEAVE_DISABLED")?;
        }
        if let Ok(value) = std::env::var("PROPWEAVE_MODULE") {
            config.module = Some(value);
        }

        Ok(config)
    }

    /// Save current configuration to the config file.
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::config_file_path() {
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
            let contents = serde_json::to_string_pretty(self)?;
            std::fs::write(&config_path, contents)
                .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
        }
        Ok(())
    }

    /// Get the path to the config file.
    pub fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("dev", "propweave", "pw")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "default-weaving" => self.weaver.default_weaving.to_string(),
            "namespaces" => self.weaver.namespace_filters.join(","),
            "event-invoker" => self.weaver.invoker_name().to_string(),
            "disabled" => self.weaver.disabled.to_string(),
            "conflict-policy" => policy_name(self.weaver.conflict_policy).to_string(),
            "module" => self.module.clone().unwrap_or_else(|| "(not set)".to_string()),
            _ => anyhow::bail!("Unknown config key: {}", key),
        };
        Ok(value)
    }

    /// Set a configuration value by key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "default-weaving" => self.weaver.default_weaving = parse_bool(value)?,
            "namespaces" => self.weaver.namespace_filters = split_list(value),
            "event-invoker" => self.weaver.event_invoker_name = value.to_string(),
            "disabled" => self.weaver.disabled = parse_bool(value)?,
            "conflict-policy" => {
                self.weaver.conflict_policy = match value {
                    "fail-fast" => ConflictPolicy::FailFast,
                    "collect-all" => ConflictPolicy::CollectAll,
                    _ => anyhow::bail!(
                        "Unknown conflict policy: {}. Use 'fail-fast' or 'collect-all'",
                        value
                    ),
                }
            }
            "module" => self.module = Some(value.to_string()),
            _ => anyhow::bail!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                Self::KEYS.join(", ")
            ),
        }
        Ok(())
    }

    /// Keys accepted by [`Config::get`] and [`Config::set`].
    pub const KEYS: [&'static str; 6] = [
        "default-weaving",
        "namespaces",
        "event-invoker",
        "disabled",
        "conflict-policy",
        "module",
    ];
}

fn policy_name(policy: ConflictPolicy) -> &'static str {
    match policy {
        ConflictPolicy::FailFast => "fail-fast",
        ConflictPolicy::CollectAll => "collect-all",
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("Expected a boolean, got '{}'", other),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips_keys() {
        let mut config = Config::default();
        config.set("default-weaving", "false").unwrap();
        config.set("namespaces", r"^App\.Models\., ^App\.Views\.").unwrap();
        config.set("conflict-policy", "collect-all").unwrap();
        config.set("module", "App").unwrap();

        assert_eq!(config.get("default-weaving").unwrap(), "false");
        assert_eq!(config.weaver.namespace_filters.len(), 2);
        assert_eq!(config.get("conflict-policy").unwrap(), "collect-all");
        assert_eq!(config.get("module").unwrap(), "App");
        assert_eq!(config.get("event-invoker").unwrap(), "OnPropertyChanged");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut config = Config::default();
        assert!(config.set("colour", "blue").is_err());
        assert!(config.get("colour").is_err());
        assert!(config.set("disabled", "maybe").is_err());
    }

    #[test]
    fn flattened_file_format() {
        let config: Config =
            serde_json::from_str(r#"{ "default_weaving": false, "module": "App" }"#).unwrap();
        assert!(!config.weaver.default_weaving);
        assert_eq!(config.module.as_deref(), Some("App"));
        assert_eq!(config.weaver.invoker_name(), "OnPropertyChanged");
    }
}
