//! Error taxonomy shared by the startup and dispatch phases.
//!
//! Startup errors ([`ContainerError`], [`ConfigError`], [`BootstrapError`]) abort
//! initialisation. [`RouteCompilationError`] is local to a single route and is
//! reported without stopping compilation of the rest. [`DispatchError`] is the
//! only error that crosses the dispatch boundary back to the transport layer.
//!
//! Handler and interceptor hook failures are plain [`anyhow::Error`] values;
//! they are recovered inside the dispatcher.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the component registry.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// A component with this name is already registered.
    #[error("component '{name}' is already registered")]
    DuplicateComponent { name: String },

    /// A declared dependency has no matching registered component.
    ///
    /// Wiring is all-or-nothing: this aborts startup.
    #[error("component '{component}' requires '{target}' for field '{field}', but no such component is registered")]
    UnresolvedDependency {
        component: String,
        field: String,
        target: String,
    },

    /// The owning component cannot take the target instance (type mismatch,
    /// unknown field, or a field declared twice). Detected before anything is
    /// bound.
    #[error("failed to inject '{target}' into '{component}.{field}': {reason}")]
    InjectionFailed {
        component: String,
        field: String,
        target: String,
        reason: String,
    },

    /// `resolve_dependencies` was called twice.
    #[error("dependencies have already been resolved")]
    AlreadyWired,
}

/// A single route that could not be compiled. Compilation of the other routes
/// continues.
#[derive(Debug, Clone, Error)]
pub enum RouteCompilationError {
    #[error("route {controller}::{method} has an invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        controller: String,
        method: String,
        pattern: String,
        reason: String,
    },

    /// Two parameters of the handler collapse onto the same mapping key.
    #[error("route {controller}::{method} declares parameter key '{key}' at both index {first} and {second}")]
    AmbiguousSignature {
        controller: String,
        method: String,
        key: String,
        first: usize,
        second: usize,
    },
}

impl RouteCompilationError {
    /// `controller::method` of the offending route.
    #[must_use]
    pub fn handler(&self) -> String {
        match self {
            Self::InvalidPattern {
                controller, method, ..
            }
            | Self::AmbiguousSignature {
                controller, method, ..
            } => format!("{controller}::{method}"),
        }
    }
}

/// The cleanup phase broke down outside the per-hook isolation.
///
/// Failing or panicking cleanup hooks never produce this; they are logged and
/// discarded.
#[derive(Debug, Clone, Error)]
#[error("cleanup phase aborted: {reason}")]
pub struct CleanupError {
    pub reason: String,
}

/// Escalated failure surfaced to the transport layer.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The cleanup phase itself failed while completing a request.
    #[error("dispatch of '{path}' failed fatally: {reason}")]
    Fatal { path: String, reason: String },
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("configuration property 'scan_package' is missing or blank")]
    MissingScanPackage,
}

/// Anything that stops the application context from starting.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("startup wiring failed: {0}")]
    Wiring(#[from] ContainerError),

    #[error("component factory for '{type_name}' failed: {reason}")]
    Instantiation { type_name: String, reason: String },
}
