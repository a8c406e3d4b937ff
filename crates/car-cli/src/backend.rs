//! File system backend
//!
//! Serves default tables and sessions from flat JSON files below a root
//! directory. Rendering and uploads need the report server and are rejected.

use async_trait::async_trait;
use car_core::wire::{decode_key_payload, decode_session_payload, encode_properties};
use car_core::{BackendError, ImageInfo, ReportBackend, UploadKind, UploadPayload};
use car_keys::KeyMap;
use car_session::{PropertyMap, FILENAME_KEY};
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "svg"];

/// [`ReportBackend`] over local files
#[derive(Debug, Clone)]
pub(crate) struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    async fn read(&self, relative: &str) -> Result<String, BackendError> {
        let path = self.resolve(relative);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| io_failure(&path, &e))
    }
}

fn io_failure(path: &Path, error: &std::io::Error) -> BackendError {
    BackendError::transport(format!("{}: {error}", path.display()))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

#[async_trait]
impl ReportBackend for FileBackend {
    async fn fetch_document_keys(&self, table_path: &str) -> Result<KeyMap, BackendError> {
        if table_path.trim().is_empty() {
            return Ok(KeyMap::new());
        }
        decode_key_payload(&self.read(table_path).await?)
    }

    async fn fetch_images(&self, directory: &str) -> Result<Vec<ImageInfo>, BackendError> {
        let dir = self.resolve(directory);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| io_failure(&dir, &e))?;

        let mut images = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_failure(&dir, &e))?
        {
            let path = entry.path();
            if !is_image(&path) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let relative = format!("{}/{name}", directory.trim_end_matches('/'));
            let mut image = ImageInfo::new(name, relative.as_str());
            image.path = Some(relative);
            images.push(image);
        }

        images.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::debug!(directory, count = images.len(), "images listed");
        Ok(images)
    }

    async fn load_session(&self, filename: &str) -> Result<PropertyMap, BackendError> {
        decode_session_payload(&self.read(filename).await?)
    }

    async fn save_session(&self, properties: &PropertyMap) -> Result<String, BackendError> {
        let filename = properties
            .get(FILENAME_KEY)
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| BackendError::Rejected("session has no file name".into()))?;

        let path = self.resolve(&format!("{filename}.json"));
        let text = encode_properties(properties)?;
        tokio::fs::write(&path, text)
            .await
            .map_err(|e| io_failure(&path, &e))?;
        Ok(format!("Session stored in {}", path.display()))
    }

    async fn upload_file(
        &self,
        kind: UploadKind,
        _payload: &UploadPayload,
    ) -> Result<String, BackendError> {
        Err(BackendError::Rejected(format!(
            "{kind} uploads need the report server's {} route",
            kind.route()
        )))
    }

    async fn render_document(&self, _properties: &PropertyMap) -> Result<String, BackendError> {
        Err(BackendError::Rejected(
            "rendering needs the report server".into(),
        ))
    }
}
