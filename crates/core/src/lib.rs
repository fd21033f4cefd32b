//! Shared foundation for schemawatch: configuration loading and
//! build metadata.

pub mod build;
pub mod config;

pub use build::BuildInfo;
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
