//! Controller configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! request_timeout_secs = 10
//! legacy_remove_marks_changed = true
//! read_retries = 2
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// CAR controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarConfig {
    /// Budget for one backend request in seconds
    pub request_timeout_secs: u64,
    /// Extra attempts for key, image and session reads that failed with a
    /// retryable error; saves, renders and uploads are never repeated
    pub read_retries: u32,
    /// Raise the dirty flag when removing a key that was never set
    ///
    /// Older saved sessions were produced by an editor that behaved this way.
    pub legacy_remove_marks_changed: bool,
    /// Deselect the figure key after a default table reset
    pub clear_selection_on_reset: bool,
    /// Maximum queued user notices, oldest dropped first; the newest is always kept
    pub notice_capacity: usize,
}

impl CarConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// With read retries
    #[inline]
    #[must_use]
    pub fn with_read_retries(mut self, retries: u32) -> Self {
        self.read_retries = retries;
        self
    }

    /// With legacy remove semantics
    #[inline]
    #[must_use]
    pub fn with_legacy_remove_marks_changed(mut self, enabled: bool) -> Self {
        self.legacy_remove_marks_changed = enabled;
        self
    }

    /// With selection clearing on reset
    #[inline]
    #[must_use]
    pub fn with_clear_selection_on_reset(mut self, enabled: bool) -> Self {
        self.clear_selection_on_reset = enabled;
        self
    }

    /// With notice capacity
    #[inline]
    #[must_use]
    pub fn with_notice_capacity(mut self, capacity: usize) -> Self {
        self.notice_capacity = capacity;
        self
    }

    /// Request budget as a duration
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

impl Default for CarConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            read_retries: 1,
            legacy_remove_marks_changed: false,
            clear_selection_on_reset: true,
            notice_capacity: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(CarConfig::from_toml_str("").unwrap(), CarConfig::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let config = CarConfig::from_toml_str("request_timeout_secs = 5\nnotice_capacity = 4\n")
            .unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.notice_capacity, 4);
        assert!(config.clear_selection_on_reset);
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let err = CarConfig::from_toml_str("request_timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "legacy_remove_marks_changed = true").unwrap();

        let config = CarConfig::load(file.path()).unwrap();
        assert!(config.legacy_remove_marks_changed);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CarConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn builder() {
        let config = CarConfig::new()
            .with_request_timeout_secs(1)
            .with_read_retries(0)
            .with_legacy_remove_marks_changed(true)
            .with_clear_selection_on_reset(false)
            .with_notice_capacity(2);
        assert_eq!(config.request_timeout_secs, 1);
        assert_eq!(config.read_retries, 0);
        assert!(config.legacy_remove_marks_changed);
        assert!(!config.clear_selection_on_reset);
        assert_eq!(config.notice_capacity, 2);
    }
}
