//! Backend collaborator
//!
//! The server side of the tool is an opaque set of request/response calls.
//! Implementations own the transport; the controller only sees typed results.

use crate::error::BackendError;
use crate::types::{ImageInfo, UploadKind, UploadPayload};
use async_trait::async_trait;
use car_keys::KeyMap;
use car_session::PropertyMap;

/// Request/response calls the controller hands work to
///
/// Every call may fail with a [`BackendError`]; the controller turns failures
/// into user notices and never applies partial results.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportBackend: Send + Sync {
    /// Keys declared by a default table
    ///
    /// An empty table path yields an empty mapping.
    async fn fetch_document_keys(&self, table_path: &str) -> Result<KeyMap, BackendError>;

    /// Images available in a figures directory
    async fn fetch_images(&self, directory: &str) -> Result<Vec<ImageInfo>, BackendError>;

    /// Property mapping of a saved session
    async fn load_session(&self, filename: &str) -> Result<PropertyMap, BackendError>;

    /// Store a session, returning the server's message
    async fn save_session(&self, properties: &PropertyMap) -> Result<String, BackendError>;

    /// Upload a template or default table, returning the server's message
    async fn upload_file(
        &self,
        kind: UploadKind,
        payload: &UploadPayload,
    ) -> Result<String, BackendError>;

    /// Render the report for a session, returning the server's message
    async fn render_document(&self, properties: &PropertyMap) -> Result<String, BackendError>;
}
