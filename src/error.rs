//! Error types for configuration and type resolution.

use thiserror::Error;

/// Recoverable errors raised by the crate's fallible entry points.
///
/// Contract violations (using a closed context, an empty context description)
/// are not represented here: they panic.
#[derive(Debug, Error)]
pub enum HostRefError {
    #[error("invalid scope configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid value `{value}` for {var}: expected {expected}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("a process-wide context manager is already installed")]
    ManagerAlreadyInstalled,
}

/// Failure of a single loader to produce a type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("type `{name}` not found")]
    NotFound { name: String },

    #[error("type `{name}` failed to link: {reason}")]
    Linkage { name: String, reason: String },
}

impl LoadError {
    pub fn not_found(name: impl Into<String>) -> Self {
        LoadError::NotFound { name: name.into() }
    }

    /// Name of the type that failed to load.
    pub fn type_name(&self) -> &str {
        match self {
            LoadError::NotFound { name } | LoadError::Linkage { name, .. } => name,
        }
    }
}

/// One loader's failure during a registry scan, handed to the caller's sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("loader `{loader}`: {error}")]
pub struct ResolutionFailure {
    /// Diagnostic name of the loader that failed.
    pub loader: String,
    pub error: LoadError,
}
