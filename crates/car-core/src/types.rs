//! Core types for CAR
//!
//! Defines the values exchanged with the UI layer and the backend:
//! - image descriptions from a figures directory
//! - upload targets and payloads
//! - user notices and toolbar state
//! - the figure selection view

use car_keys::FigureArity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One image available in a figures directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// File name, also the value bound to figure keys
    pub name: String,
    /// Path relative to the figures root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Full size image URL
    pub url: String,
    /// Thumbnail URL
    #[serde(default)]
    pub thumb_url: String,
    /// Width in pixels
    #[serde(default)]
    pub width: u32,
    /// Height in pixels
    #[serde(default)]
    pub height: u32,
}

impl ImageInfo {
    /// Create with name and URL only
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            url: url.into(),
            thumb_url: String::new(),
            width: 0,
            height: 0,
        }
    }

    /// With thumbnail URL
    #[inline]
    #[must_use]
    pub fn with_thumb_url(mut self, thumb_url: impl Into<String>) -> Self {
        self.thumb_url = thumb_url.into();
        self
    }

    /// With pixel size
    #[inline]
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// What an uploaded file becomes on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    /// A `.docx` report template
    Template,
    /// A `.properties` default table
    DefaultTable,
}

impl UploadKind {
    /// Extension the server accepts for this kind
    #[inline]
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Template => ".docx",
            Self::DefaultTable => ".properties",
        }
    }

    /// Upload route segment
    #[inline]
    #[must_use]
    pub fn route(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::DefaultTable => "default_table",
        }
    }

    /// True when `file_name` carries the accepted extension
    #[must_use]
    pub fn accepts(self, file_name: &str) -> bool {
        file_name.ends_with(self.extension())
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template => f.write_str("template"),
            Self::DefaultTable => f.write_str("default table"),
        }
    }
}

/// File handed to the upload collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    /// Original file name
    pub file_name: String,
    /// File content
    pub bytes: Vec<u8>,
}

impl UploadPayload {
    /// Create payload
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Severity of a user notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Server message or confirmation
    Info,
    /// Failed request
    Error,
}

/// Message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Display text
    pub text: String,
}

impl Notice {
    /// Informational notice
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    /// Error notice
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    /// True for error notices
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Enabled state of the session toolbar
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolbarState {
    /// Save needs a default table and a file name
    pub save_enabled: bool,
    /// Save-as needs a default table
    pub save_as_enabled: bool,
    /// Displayed session name
    pub session_name: String,
}

/// Which images show as checked for the selected figure key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionView {
    /// Selected figure key, `None` when the chooser is empty
    pub figure_key: Option<String>,
    /// Arity of the selected key
    pub arity: Option<FigureArity>,
    /// Checked image names, at most one for single-figure keys
    pub checked: Vec<String>,
}

impl SelectionView {
    /// True when `name` shows as checked
    #[must_use]
    pub fn is_checked(&self, name: &str) -> bool {
        self.checked.iter().any(|n| n == name)
    }
}

/// How a completion was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State updated from the response
    Applied,
    /// A newer request superseded this one, nothing changed
    Ignored,
    /// The collaborator failed, a notice was raised, nothing changed
    Failed,
}
