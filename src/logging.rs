//! Structured logging setup.
//!
//! Installs a global `tracing-subscriber` fmt subscriber, JSON for
//! production and pretty-print for development.
//!
//! ## Environment Variables
//!
//! - `MINIMVC_LOG_LEVEL`: trace/debug/info/warn/error (default `info`)
//! - `MINIMVC_LOG_FORMAT`: `json` or `pretty` (default `pretty`)
//! - `MINIMVC_LOG_TARGET_FILTER`: extra comma-separated filter directives,
//!   e.g. `minimvc::router=debug`
//!
//! `RUST_LOG`, when set, replaces the level.

use std::env;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LogSettings;

pub const ENV_LOG_LEVEL: &str = "MINIMVC_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "MINIMVC_LOG_FORMAT";
pub const ENV_LOG_TARGET_FILTER: &str = "MINIMVC_LOG_TARGET_FILTER";

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Extra filter directives (comma-separated)
    pub target_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Pretty,
            target_filter: None,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Build from an arbitrary variable source.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            log_level: lookup(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            format: lookup(ENV_LOG_FORMAT)
                .map(|f| LogFormat::parse(&f))
                .unwrap_or(defaults.format),
            target_filter: lookup(ENV_LOG_TARGET_FILTER).filter(|f| !f.trim().is_empty()),
        }
    }

    /// Let the config file's `log` section take precedence.
    #[must_use]
    pub fn with_settings(mut self, settings: &LogSettings) -> Self {
        if let Some(level) = &settings.level {
            self.log_level = level.clone();
        }
        if let Some(format) = settings.format {
            self.format = format;
        }
        self
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));
        if let Some(targets) = &self.target_filter {
            for directive in targets.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                match directive.parse() {
                    Ok(d) => filter = filter.add_directive(d),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {directive}"),
                }
            }
        }
        filter
    }
}

/// Install the global subscriber.
///
/// Fails when a global subscriber is already installed.
///
/// ```no_run
/// use minimvc::logging::{init_logging, LogConfig};
///
/// init_logging(&LogConfig::from_env()).expect("logging");
/// ```
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("bogus"), LogFormat::Pretty);
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = LogConfig::from_lookup(|_| None);
        assert_eq!(config, LogConfig::default());
        assert_eq!(config.level(), Level::INFO);
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let config = LogConfig::from_lookup(|k| match k {
            ENV_LOG_LEVEL => Some("debug".into()),
            ENV_LOG_FORMAT => Some("json".into()),
            ENV_LOG_TARGET_FILTER => Some("minimvc::router=trace".into()),
            _ => None,
        });
        assert_eq!(config.level(), Level::DEBUG);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.target_filter.as_deref(), Some("minimvc::router=trace"));
    }

    #[test]
    fn test_file_settings_take_precedence() {
        let settings = LogSettings {
            level: Some("warn".into()),
            format: Some(LogFormat::Json),
        };
        let config = LogConfig::default().with_settings(&settings);
        assert_eq!(config.level(), Level::WARN);
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_second_init_is_an_error() {
        let config = LogConfig::default();
        // whichever call comes first may win; the later one must fail cleanly
        let _first = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
