//! # Configuration Module
//!
//! Startup configuration, read once before the application context is built.
//!
//! ## Sources
//!
//! 1. A YAML file ([`AppConfig::load`]) or string ([`AppConfig::from_yaml_str`])
//! 2. Environment overrides, applied on top:
//!
//! | Variable                 | Field            |
//! |--------------------------|------------------|
//! | `MINIMVC_SCAN_PACKAGE`   | `scan_package`   |
//! | `MINIMVC_IDENTITY_PARAM` | `identity_param` |
//!
//! ## Example
//!
//! ```yaml
//! scan_package: app
//! identity_param: username
//! log:
//!   level: debug
//!   format: json
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::interceptor::DEFAULT_IDENTITY_PARAM;
use crate::logging::LogFormat;

pub const ENV_SCAN_PACKAGE: &str = "MINIMVC_SCAN_PACKAGE";
pub const ENV_IDENTITY_PARAM: &str = "MINIMVC_IDENTITY_PARAM";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root of the type paths scanned for components (e.g. `app` or `app::demo`).
    pub scan_package: String,
    /// Request parameter holding the caller identity for authorization.
    pub identity_param: String,
    pub log: LogSettings,
}

/// Optional logging overrides; unset fields fall back to the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scan_package: String::new(),
            identity_param: DEFAULT_IDENTITY_PARAM.to_string(),
            log: LogSettings::default(),
        }
    }
}

impl AppConfig {
    #[must_use]
    pub fn new(scan_package: impl Into<String>) -> Self {
        Self {
            scan_package: scan_package.into(),
            ..Self::default()
        }
    }

    /// Read a YAML file, then apply environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content)?;
        debug!(path = %path.display(), "Config file loaded");
        config.with_overrides(|k| std::env::var(k).ok()).validated()
    }

    /// Parse YAML without consulting the environment.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validated()
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default()
            .with_overrides(|k| std::env::var(k).ok())
            .validated()
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Blank values are ignored.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(scan) = value(ENV_SCAN_PACKAGE) {
            self.scan_package = scan;
        }
        if let Some(param) = value(ENV_IDENTITY_PARAM) {
            self.identity_param = param;
        }
        self
    }

    /// Normalise and check the configuration.
    ///
    /// `scan_package` may use `.` or `::` as separator; it is stored with
    /// `::`. A blank identity parameter falls back to the default.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let scan = self.scan_package.trim().replace('.', "::");
        if scan.is_empty() {
            return Err(ConfigError::MissingScanPackage);
        }
        self.scan_package = scan;
        if self.identity_param.trim().is_empty() {
            self.identity_param = DEFAULT_IDENTITY_PARAM.to_string();
        }
        Ok(self)
    }
}
