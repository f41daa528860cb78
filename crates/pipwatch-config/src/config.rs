//! Application configuration

use pipwatch_foundation::{PipwatchError, PipwatchResult, DEFAULT_MAPPINGS_URL};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Mapping registry configuration
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Package installer configuration
    #[serde(default)]
    pub installer: InstallerConfig,
}

/// Mapping registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Read and write the local mapping cache
    pub use_cache: bool,
    /// Where fresh mapping tables are fetched from
    pub remote_url: String,
    /// Cache file location (defaults to ~/.pipwatch/mappings_cache.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,
    /// Remote fetch timeout in seconds
    pub timeout_seconds: u64,
    /// Replace the embedded mapping table with a file on disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundled_path: Option<PathBuf>,
}

/// Log output format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// Structured JSON format
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

/// Package installer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallerConfig {
    /// Python interpreter used to run pip
    pub python: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            remote_url: DEFAULT_MAPPINGS_URL.to_string(),
            cache_path: None,
            timeout_seconds: 5,
            bundled_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
        }
    }
}

/// Prefix for environment variable overrides, e.g. `PIPWATCH__REGISTRY__USE_CACHE`
pub const ENV_PREFIX: &str = "PIPWATCH__";

impl AppConfig {
    /// Files consulted by [`AppConfig::load`], first match wins
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("pipwatch.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".pipwatch").join("config.toml"));
        }
        paths
    }

    /// Load configuration from environment and config files
    ///
    /// Configuration is loaded in the following priority order (highest to lowest):
    /// 1. Environment variables (PIPWATCH__*)
    /// 2. `pipwatch.toml` in the working directory, or `~/.pipwatch/config.toml`
    /// 3. Default values
    pub fn load() -> PipwatchResult<Self> {
        Self::load_from(&Self::default_config_paths())
    }

    /// Load configuration using an explicit list of candidate TOML files
    pub fn load_from(paths: &[PathBuf]) -> PipwatchResult<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Toml},
            Figment,
        };

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if let Some(path) = paths.iter().find(|p| p.exists()) {
            tracing::debug!(path = %path.display(), "Loading TOML configuration");
            figment = figment.merge(Toml::file(path));
        }

        let figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: AppConfig = figment
            .extract()
            .map_err(|e| PipwatchError::config(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;

        tracing::debug!(
            use_cache = config.registry.use_cache,
            remote_url = %config.registry.remote_url,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> PipwatchResult<()> {
        let url = self.registry.remote_url.trim();
        if url.is_empty() {
            return Err(PipwatchError::config("Remote mappings URL cannot be empty"));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(PipwatchError::config(format!(
                "Remote mappings URL must be http(s): '{}'",
                url
            )));
        }

        if self.registry.timeout_seconds == 0 {
            return Err(PipwatchError::config("Registry timeout cannot be 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(PipwatchError::config(format!(
                "Invalid log level '{}', must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        if self.installer.python.trim().is_empty() {
            return Err(PipwatchError::config("Python executable cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.registry.use_cache);
        assert_eq!(config.registry.timeout_seconds, 5);
        assert_eq!(config.registry.remote_url, DEFAULT_MAPPINGS_URL);
        assert_eq!(config.installer.python, "python3");
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.registry.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = AppConfig::default();
        config.registry.remote_url = "ftp://example.com/mappings.json".to_string();
        assert!(config.validate().is_err());

        config.registry.remote_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }
}
