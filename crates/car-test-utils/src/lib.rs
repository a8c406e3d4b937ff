//! Testing utilities for CAR workspace
//!
//! Shared fixtures and an in-memory [`ReportBackend`] with per-request delays
//! and injected failures.

#![allow(missing_docs)]

use async_trait::async_trait;
use car_core::wire::decode_key_payload;
use car_core::{
    BackendError, CarConfig, ImageInfo, ReportBackend, SessionController, UploadKind,
    UploadPayload,
};
use car_keys::KeyMap;
use car_session::PropertyMap;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

pub const SESSION_STORED: &str = "Session successfully stored";

pub fn keys(pairs: &[(&str, &str)]) -> KeyMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

pub fn properties(pairs: &[(&str, &str)]) -> PropertyMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Sea surface temperature table with one of every key kind
pub fn sst_keys() -> KeyMap {
    keys(&[
        ("figure.a", ""),
        ("figure.a.default", "X"),
        ("figure.a.scale", "1.5"),
        ("figures.b", ""),
        ("comment.fig_a", ""),
        ("paragraph.summary", ""),
        ("paragraph.summary.default", "No anomalies."),
        ("word.region", ""),
    ])
}

/// Sea ice table sharing no figure keys with [`sst_keys`]
pub fn ice_keys() -> KeyMap {
    keys(&[
        ("figures.extent", ""),
        ("figures.extent.default", "arctic.png"),
        ("comment.extent", ""),
    ])
}

pub fn sst_images() -> Vec<ImageInfo> {
    ["anomaly.png", "trend.png", "climatology.png"]
        .into_iter()
        .map(|name| {
            ImageInfo::new(name, format!("/figures/sst/{name}"))
                .with_thumb_url(format!("/thumbs/sst/{name}"))
                .with_size(800, 600)
        })
        .collect()
}

pub fn setup_controller() -> SessionController {
    SessionController::new(CarConfig::default())
}

#[derive(Debug, Clone)]
enum TableSource {
    Keys(KeyMap),
    Raw(String),
}

/// In-memory server
///
/// Delays and failures are keyed by the request argument (table path,
/// directory or session file name).
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: HashMap<String, TableSource>,
    images: HashMap<String, Vec<ImageInfo>>,
    sessions: Mutex<HashMap<String, PropertyMap>>,
    delays: HashMap<String, Duration>,
    failures: HashMap<String, BackendError>,
    saved: Mutex<Vec<PropertyMap>>,
    uploads: Mutex<Vec<(UploadKind, String)>>,
    renders: Mutex<Vec<PropertyMap>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, path: &str, keys: KeyMap) -> Self {
        self.tables.insert(path.to_string(), TableSource::Keys(keys));
        self
    }

    /// Table answered with a raw payload, decoded like a server response
    pub fn with_raw_table(mut self, path: &str, payload: &str) -> Self {
        self.tables
            .insert(path.to_string(), TableSource::Raw(payload.to_string()));
        self
    }

    pub fn with_images(mut self, directory: &str, images: Vec<ImageInfo>) -> Self {
        self.images.insert(directory.to_string(), images);
        self
    }

    pub fn with_session(mut self, filename: &str, properties: PropertyMap) -> Self {
        self.sessions
            .get_mut()
            .insert(filename.to_string(), properties);
        self
    }

    pub fn with_delay(mut self, argument: &str, delay: Duration) -> Self {
        self.delays.insert(argument.to_string(), delay);
        self
    }

    pub fn with_failure(mut self, argument: &str, error: BackendError) -> Self {
        self.failures.insert(argument.to_string(), error);
        self
    }

    pub async fn saved(&self) -> Vec<PropertyMap> {
        self.saved.lock().await.clone()
    }

    pub async fn uploads(&self) -> Vec<(UploadKind, String)> {
        self.uploads.lock().await.clone()
    }

    pub async fn renders(&self) -> Vec<PropertyMap> {
        self.renders.lock().await.clone()
    }

    async fn enter(&self, argument: &str) -> Result<(), BackendError> {
        if let Some(delay) = self.delays.get(argument) {
            tokio::time::sleep(*delay).await;
        }
        match self.failures.get(argument) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ReportBackend for InMemoryBackend {
    async fn fetch_document_keys(&self, table_path: &str) -> Result<KeyMap, BackendError> {
        self.enter(table_path).await?;
        if table_path.is_empty() {
            return Ok(KeyMap::new());
        }
        match self.tables.get(table_path) {
            Some(TableSource::Keys(keys)) => Ok(keys.clone()),
            Some(TableSource::Raw(payload)) => decode_key_payload(payload),
            None => Err(BackendError::Rejected(format!(
                "unknown default table {table_path}"
            ))),
        }
    }

    async fn fetch_images(&self, directory: &str) -> Result<Vec<ImageInfo>, BackendError> {
        self.enter(directory).await?;
        Ok(self.images.get(directory).cloned().unwrap_or_default())
    }

    async fn load_session(&self, filename: &str) -> Result<PropertyMap, BackendError> {
        self.enter(filename).await?;
        self.sessions
            .lock()
            .await
            .get(filename)
            .cloned()
            .ok_or_else(|| BackendError::Rejected(format!("no session named {filename}")))
    }

    async fn save_session(&self, properties: &PropertyMap) -> Result<String, BackendError> {
        let filename = properties.get("filename").cloned().unwrap_or_default();
        self.enter(&filename).await?;
        self.sessions
            .lock()
            .await
            .insert(filename, properties.clone());
        self.saved.lock().await.push(properties.clone());
        Ok(SESSION_STORED.to_string())
    }

    async fn upload_file(
        &self,
        kind: UploadKind,
        payload: &UploadPayload,
    ) -> Result<String, BackendError> {
        self.enter(&payload.file_name).await?;
        self.uploads
            .lock()
            .await
            .push((kind, payload.file_name.clone()));
        Ok(format!("Uploaded {kind} {}", payload.file_name))
    }

    async fn render_document(&self, properties: &PropertyMap) -> Result<String, BackendError> {
        let template = properties.get("template_path").cloned().unwrap_or_default();
        self.enter(&template).await?;
        self.renders.lock().await.push(properties.clone());
        Ok(format!("<a href=\"/documents/{template}\">Download report</a>"))
    }
}
