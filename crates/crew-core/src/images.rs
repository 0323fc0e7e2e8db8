//! Subida y limpieza de imágenes del catálogo.
//!
//! Un blob se nombra `<carpeta>/<millis>-<8 hex>.<ext>` dentro del bucket de
//! su carpeta. Las subidas fallidas abortan la acción; los borrados de
//! limpieza se registran en el log y se ignoran.
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use crew_domain::StoredImage;
use log::{debug, warn};
use uuid::Uuid;

use crate::boundary::{BlobFile, BlobStorage};
use crate::clock::{Clock, SystemClock};
use crate::errors::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFolder {
    Products,
    Categories,
}

impl ImageFolder {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFolder::Products => "products",
            ImageFolder::Categories => "categories",
        }
    }
}

impl fmt::Display for ImageFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ruta del blob para `file_name` subido en `now`.
pub fn blob_path(folder: ImageFolder, file_name: &str, now: DateTime<Utc>) -> String {
    let ext = file_name.rsplit_once('.')
                       .map(|(_, ext)| ext.trim().to_ascii_lowercase())
                       .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
                       .unwrap_or_else(|| "bin".to_string());
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{folder}/{}-{}.{ext}", now.timestamp_millis(), &suffix[..8])
}

#[derive(Clone)]
pub struct ImageAttachments {
    storage: Arc<dyn BlobStorage>,
    clock: Arc<dyn Clock>,
}

impl ImageAttachments {
    pub fn new(storage: Arc<dyn BlobStorage>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: Arc<dyn BlobStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub async fn attach_image(&self, folder: ImageFolder, file: &BlobFile) -> Result<StoredImage, CoreError> {
        if file.bytes.is_empty() {
            return Err(CoreError::invalid("image", format!("{} is empty", file.file_name)));
        }
        let path = blob_path(folder, &file.file_name, self.clock.now());
        let stored = self.storage.upload_blob(folder.as_str(), &path, file).await?;
        debug!("uploaded {} ({} bytes)", stored.path, file.bytes.len());
        Ok(stored)
    }

    /// Sube el reemplazo y, si la subida tuvo éxito, libera `old_path`.
    pub async fn replace_image(&self, folder: ImageFolder, file: &BlobFile, old_path: Option<&str>)
                               -> Result<StoredImage, CoreError> {
        let stored = self.attach_image(folder, file).await?;
        if let Some(old) = old_path.filter(|old| *old != stored.path) {
            self.release_image(folder, old).await;
        }
        Ok(stored)
    }

    /// Borrado best-effort.
    pub async fn release_image(&self, folder: ImageFolder, path: &str) {
        if path.is_empty() {
            return;
        }
        match self.storage.delete_blob(folder.as_str(), path).await {
            Ok(()) => debug!("released {path}"),
            Err(err) => warn!("Failed to delete image {path}: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::memory::InMemoryBlobStorage;

    #[test]
    fn blob_path_shape() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let path = blob_path(ImageFolder::Products, "Burger.PNG", now);
        assert!(path.starts_with("products/1700000000123-"), "{path}");
        assert!(path.ends_with(".png"));
        let hex = path.trim_start_matches("products/1700000000123-").trim_end_matches(".png");
        assert_eq!(hex.len(), 8);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));

        assert!(blob_path(ImageFolder::Categories, "noext", now).ends_with(".bin"));
    }

    #[tokio::test]
    async fn empty_file_is_rejected_before_upload() {
        let storage = Arc::new(InMemoryBlobStorage::default());
        let images = ImageAttachments::new(storage.clone());
        let err = images.attach_image(ImageFolder::Products, &BlobFile::new("a.png", Vec::new()))
                        .await
                        .unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
        assert!(storage.paths().is_empty());
    }

    #[tokio::test]
    async fn replace_uploads_first_then_releases_old() {
        let storage = Arc::new(InMemoryBlobStorage::default());
        let images = ImageAttachments::new(storage.clone());
        let first = images.attach_image(ImageFolder::Categories, &BlobFile::new("a.png", vec![1]))
                          .await
                          .unwrap();

        storage.set_upload_failure(Some("bucket full"));
        let err = images.replace_image(ImageFolder::Categories, &BlobFile::new("b.png", vec![2]), Some(&first.path))
                        .await
                        .unwrap_err();
        assert_eq!(err, CoreError::remote("bucket full"));
        assert!(storage.contains(&first.path));

        storage.set_upload_failure(None);
        let second = images.replace_image(ImageFolder::Categories, &BlobFile::new("b.png", vec![2]), Some(&first.path))
                           .await
                           .unwrap();
        assert!(!storage.contains(&first.path));
        assert!(storage.contains(&second.path));
    }

    #[tokio::test]
    async fn release_swallows_failures() {
        let storage = Arc::new(InMemoryBlobStorage::default());
        storage.set_delete_failure(Some("forbidden"));
        let images = ImageAttachments::new(storage);
        images.release_image(ImageFolder::Products, "products/x.png").await;
    }
}
