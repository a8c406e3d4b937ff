//! Requests the controller hands to the backend
//!
//! A request carries everything its completion needs, so the controller can
//! apply a response without remembering what it asked for.

use crate::sequence::Ticket;
use crate::types::{UploadKind, UploadPayload};
use car_session::PropertyMap;

/// Fetch the keys of a default table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysRequest {
    /// Sequencing ticket
    pub ticket: Ticket,
    /// Selected default table
    pub table_path: String,
}

/// List the images of a figures directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagesRequest {
    /// Sequencing ticket
    pub ticket: Ticket,
    /// Selected directory
    pub directory: String,
}

/// Load a saved session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLoadRequest {
    /// Sequencing ticket
    pub ticket: Ticket,
    /// Session file to load
    pub filename: String,
}

/// Store the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    /// Snapshot of the properties being saved
    pub properties: PropertyMap,
}

/// Render the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Snapshot of the properties being rendered
    pub properties: PropertyMap,
}

/// Upload a template or default table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Upload target
    pub kind: UploadKind,
    /// File to upload
    pub payload: UploadPayload,
}

/// Any request the controller produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// See [`KeysRequest`]
    Keys(KeysRequest),
    /// See [`ImagesRequest`]
    Images(ImagesRequest),
    /// See [`SessionLoadRequest`]
    LoadSession(SessionLoadRequest),
    /// See [`SaveRequest`]
    Save(SaveRequest),
    /// See [`RenderRequest`]
    Render(RenderRequest),
    /// See [`UploadRequest`]
    Upload(UploadRequest),
}
