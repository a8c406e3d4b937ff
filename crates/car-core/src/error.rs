//! Error types for CAR Core
//!
//! Provides error handling for:
//! - Backend collaborator failures (transport, malformed payloads, timeouts)
//! - Requests the controller refuses to hand off
//! - Configuration loading
//!
//! Key classification and session edits never fail; only collaborator
//! hand-offs do.

use crate::types::UploadKind;
use std::path::PathBuf;

/// Failure reported by a backend collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The request did not reach the server or got no usable response
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with something that is not the expected payload
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// No answer within the configured budget
    #[error("request timed out after {secs}s")]
    Timeout {
        /// Budget that elapsed
        secs: u64,
    },

    /// The server refused the request
    #[error("rejected by server: {0}")]
    Rejected(String),
}

impl BackendError {
    /// Create transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create malformed payload error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload(message.into())
    }

    /// Check if retrying the same request could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. })
    }
}

/// Main controller error type
#[derive(Debug, thiserror::Error)]
pub enum CarError {
    /// Collaborator failure
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Save needs a session file name
    #[error("missing a filename, use save as to set one")]
    MissingFilename,

    /// Save needs a selected default table
    #[error("no default table selected")]
    NoTableSelected,

    /// Render needs a selected template
    #[error("no template selected")]
    NoTemplateSelected,

    /// Upload file does not carry the extension its kind requires
    #[error("only {expected} files can be uploaded as {kind}, got '{file_name}'")]
    WrongFileType {
        /// Upload target
        kind: UploadKind,
        /// Required extension
        expected: &'static str,
        /// Offered file
        file_name: String,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CarError {
    /// Check if the error is a local precondition rather than a server failure
    #[inline]
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingFilename
                | Self::NoTableSelected
                | Self::NoTemplateSelected
                | Self::WrongFileType { .. }
        )
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for [`crate::CarConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
