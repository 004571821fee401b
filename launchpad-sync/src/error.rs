//! Error types for launchpad-sync.

use std::path::PathBuf;

use thiserror::Error;

use launchpad_core::ConfigError;

/// Failures reported by a [`HostingClient`](crate::HostingClient) implementation.
///
/// The engine never retries and never rewrites these; they reach the caller
/// as [`SyncError::Transport`] exactly as the transport produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The service answered with a non-success status.
    #[error("{method} {url} failed with HTTP {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// The named application does not exist on the target.
    #[error("application '{name}' not found")]
    NotFound { name: String },

    /// Connection, TLS, proxy or timeout failure before a response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// A response arrived but its body could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),
}

/// All errors that can arise from synchronization operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A bundle entry resolves outside the bundle root.
    #[error("Can't deploy application containing links '{}' that reach outside its root", path.display())]
    ContainmentViolation { path: PathBuf },

    /// A chain of symbolic links loops or exceeds the resolution bound.
    #[error("symbolic link cycle detected at '{}'", path.display())]
    LinkCycleDetected { path: PathBuf },

    /// The source application of a clone has an empty environment.
    #[error("No environment variables to clone from application '{app}'")]
    NoEnvironmentVariablesToClone { app: String },

    /// `env unset` named a key the application does not have.
    #[error("environment variable '{key}' is not set on application '{app}'")]
    UnknownEnvironmentVariable { app: String, key: String },

    /// The bundle root is missing or not a directory.
    #[error("invalid bundle at {}: {reason}", path.display())]
    InvalidBundle { path: PathBuf, reason: String },

    /// A failure reported by the hosting-service transport.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (resource manifest).
    #[error("resource manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
