//! Configuration management for pipwatch

pub mod config;
pub mod logging;

pub use config::{AppConfig, InstallerConfig, LogFormat, LoggingConfig, RegistryConfig};
