use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for the settings appender
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppenderConfig {
    /// Where and how fragments are discovered
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Preference storage
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveryConfig {
    /// Directory holding one folder per installed plugin.
    /// Normally handed over by the host; this overrides it.
    #[serde(default)]
    pub plugin_root: Option<PathBuf>,

    /// File name suffix of definition fragments
    #[serde(default = "default_fragment_suffix")]
    pub fragment_suffix: String,

    /// Bundled demo fragment, only loaded when the example preference is on
    #[serde(default = "default_example_file_name")]
    pub example_file_name: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            plugin_root: None,
            fragment_suffix: default_fragment_suffix(),
            example_file_name: default_example_file_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "compact", "full"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PreferencesConfig {
    /// JSON file for persisted preferences; in-memory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_fragment_suffix() -> String {
    ".appendable.json".to_string()
}
fn default_example_file_name() -> String {
    "example_settings.appendable.json".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "compact".to_string()
}

/// Configuration manager with file lookup and environment overrides
pub struct ConfigManager {
    config: AppenderConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables
    /// 2. Config file (.printsettings.toml, then ~/.printsettings/config.toml)
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let (config, config_path) = Self::load_config_file()?;
        Self::finish(config, config_path)
    }

    /// Load an explicit config file, still applying environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_toml_file(path)?;
        Self::finish(config, Some(path.to_path_buf()))
    }

    fn finish(config: AppenderConfig, config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        match config_path {
            Some(ref path) => info!("Loaded appender configuration from {}", path.display()),
            None => info!("No appender config file found, using defaults"),
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    fn load_config_file() -> Result<(AppenderConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".printsettings.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".printsettings").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((AppenderConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<AppenderConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(mut config: AppenderConfig) -> AppenderConfig {
        if let Ok(root) = std::env::var("PRINTSETTINGS_PLUGIN_ROOT") {
            config.discovery.plugin_root = Some(PathBuf::from(root));
        }
        if let Ok(path) = std::env::var("PRINTSETTINGS_PREFERENCES") {
            config.preferences.path = Some(PathBuf::from(path));
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            // Only plain levels override; full filter directives go straight to EnvFilter
            if is_log_level(&level) {
                config.logging.level = level;
            }
        }
        if let Ok(format) = std::env::var("PRINTSETTINGS_LOG_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    fn validate_config(config: &AppenderConfig) -> Result<(), ConfigError> {
        if !is_log_level(&config.logging.level) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                config.logging.level
            )));
        }

        match config.logging.format.as_str() {
            "pretty" | "compact" | "full" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, compact, full",
                    other
                )))
            }
        }

        if !config.discovery.fragment_suffix.ends_with(".json") {
            return Err(ConfigError::ValidationError(format!(
                "Fragment suffix must end in .json: {}",
                config.discovery.fragment_suffix
            )));
        }

        Ok(())
    }

    pub fn config(&self) -> &AppenderConfig {
        &self.config
    }

    pub fn into_config(self) -> AppenderConfig {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Write a default config file, creating parent directories.
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = AppenderConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}

fn is_log_level(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppenderConfig::default();
        assert_eq!(config.discovery.fragment_suffix, ".appendable.json");
        assert_eq!(
            config.discovery.example_file_name,
            "example_settings.appendable.json"
        );
        assert!(config.discovery.plugin_root.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validation() {
        let config = AppenderConfig::default();
        assert!(ConfigManager::validate_config(&config).is_ok());

        let mut bad_level = config.clone();
        bad_level.logging.level = "loud".to_string();
        assert!(ConfigManager::validate_config(&bad_level).is_err());

        let mut bad_suffix = config.clone();
        bad_suffix.discovery.fragment_suffix = ".appendable.yaml".to_string();
        assert!(ConfigManager::validate_config(&bad_suffix).is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppenderConfig = toml::from_str(
            r#"
            [discovery]
            plugin_root = "/opt/cura/plugins"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.discovery.plugin_root.as_deref(),
            Some(Path::new("/opt/cura/plugins"))
        );
        assert_eq!(config.discovery.fragment_suffix, ".appendable.json");
        assert_eq!(config.logging, LoggingConfig::default());
    }
}
