//! Media object storage.
//!
//! Stands in for the external object-storage service: binary payloads go
//! in, durable locator URLs come out, and locators can later be deleted
//! when their objects are orphaned (e.g. replaced product images).
//! Objects live on the local filesystem under one subdirectory per
//! category and are served back through `GET /media/{category}/{file}`.
//!
//! Uploads within one request are issued sequentially; a failed write
//! surfaces to the caller and nothing already written is rolled back.

use std::path::PathBuf;
use std::str::FromStr;

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ServerError;

/// Storage categories, one directory each.  A closed set so request
/// input can never name an arbitrary path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    /// Vendor compliance documents (certificates, licenses).
    Documents,
    /// Product images.
    Images,
    /// Product catalogues (PDF).
    Catalogues,
}

impl MediaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Documents => "documents",
            MediaCategory::Images => "images",
            MediaCategory::Catalogues => "catalogues",
        }
    }
}

impl FromStr for MediaCategory {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "documents" => Ok(MediaCategory::Documents),
            "images" => Ok(MediaCategory::Images),
            "catalogues" => Ok(MediaCategory::Catalogues),
            other => Err(ServerError::NotFound(format!(
                "Unknown media category: {other}"
            ))),
        }
    }
}

/// Reject any file name that could escape its category directory.
/// Stored names are server-generated UUIDs plus an extension, so the
/// allowed alphabet is tight.
fn validate_file_name(name: &str) -> Result<(), ServerError> {
    let ok = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ServerError::Validation(
            "Invalid media file name".to_string(),
        ))
    }
}

/// Filesystem-backed object store.
#[derive(Debug, Clone)]
pub struct MediaStore {
    base_path: PathBuf,
    max_size: usize,
    /// Prefix for locators handed to clients, e.g. `http://localhost:5000`.
    public_base: String,
}

impl MediaStore {
    pub async fn new(
        base_path: PathBuf,
        max_size: usize,
        public_base: String,
    ) -> Result<Self, ServerError> {
        for category in [
            MediaCategory::Documents,
            MediaCategory::Images,
            MediaCategory::Catalogues,
        ] {
            let dir = base_path.join(category.as_str());
            fs::create_dir_all(&dir).await.map_err(|e| {
                ServerError::Storage(format!(
                    "Failed to create media directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        info!(path = %base_path.display(), "Media store initialized");

        Ok(Self {
            base_path,
            max_size,
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    /// Store one object and return its durable locator URL.
    ///
    /// The extension of the client's original file name (if any) is kept
    /// so browsers render the served object correctly.
    pub async fn put(
        &self,
        category: MediaCategory,
        original_name: Option<&str>,
        data: &[u8],
    ) -> Result<String, ServerError> {
        if data.is_empty() {
            return Err(ServerError::Validation("Empty upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::Validation(format!(
                "Upload too large: {} bytes (max {})",
                data.len(),
                self.max_size
            )));
        }

        let file_name = match original_name.and_then(extension_of) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        let path = self.base_path.join(category.as_str()).join(&file_name);
        fs::write(&path, data)
            .await
            .map_err(|e| ServerError::Storage(format!("write '{}': {}", path.display(), e)))?;

        debug!(
            category = category.as_str(),
            file = %file_name,
            size = data.len(),
            "stored media object"
        );

        Ok(format!(
            "{}/media/{}/{}",
            self.public_base,
            category.as_str(),
            file_name
        ))
    }

    /// Read an object back for serving.
    pub async fn get(&self, category: MediaCategory, file_name: &str) -> Result<Vec<u8>, ServerError> {
        validate_file_name(file_name)?;
        let path = self.base_path.join(category.as_str()).join(file_name);
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ServerError::NotFound(
                "Media object not found".to_string(),
            )),
            Err(e) => Err(ServerError::Storage(format!(
                "read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    /// Delete a previously stored object by its locator URL.
    ///
    /// Best-effort: locators from other deployments (different base URL)
    /// and already-deleted objects are ignored.
    pub async fn delete_by_locator(&self, locator: &str) {
        let Some((category, file_name)) = self.parse_locator(locator) else {
            debug!(locator, "ignoring foreign media locator");
            return;
        };
        if validate_file_name(&file_name).is_err() {
            return;
        }

        let path = self.base_path.join(category.as_str()).join(&file_name);
        match fs::remove_file(&path).await {
            Ok(()) => debug!(locator, "deleted orphaned media object"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(locator, error = %e, "failed to delete media object"),
        }
    }

    /// Split a locator URL into its category and file name, if it points
    /// at this store.
    fn parse_locator(&self, locator: &str) -> Option<(MediaCategory, String)> {
        let rest = locator.strip_prefix(&self.public_base)?;
        let rest = rest.strip_prefix("/media/")?;
        let (category, file_name) = rest.split_once('/')?;
        let category = MediaCategory::from_str(category).ok()?;
        Some((category, file_name.to_string()))
    }
}

/// Extract a short, safe extension from a client-supplied file name.
fn extension_of(name: &str) -> Option<String> {
    let ext = name.rsplit_once('.')?.1;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, MediaStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(
            dir.path().to_path_buf(),
            1024,
            "http://localhost:5000".to_string(),
        )
        .await
        .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn put_then_get_round_trip() {
        let (_dir, store) = store().await;
        let locator = store
            .put(MediaCategory::Documents, Some("gst.pdf"), b"certificate")
            .await
            .unwrap();
        assert!(locator.starts_with("http://localhost:5000/media/documents/"));
        assert!(locator.ends_with(".pdf"));

        let file = locator.rsplit('/').next().unwrap();
        let data = store.get(MediaCategory::Documents, file).await.unwrap();
        assert_eq!(data, b"certificate");
    }

    #[tokio::test]
    async fn oversized_upload_rejected() {
        let (_dir, store) = store().await;
        let big = vec![0u8; 2048];
        assert!(matches!(
            store
                .put(MediaCategory::Images, None, &big)
                .await
                .unwrap_err(),
            ServerError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn traversal_names_rejected() {
        let (_dir, store) = store().await;
        assert!(store.get(MediaCategory::Images, "../secret").await.is_err());
        assert!(store.get(MediaCategory::Images, ".hidden").await.is_err());
    }

    #[tokio::test]
    async fn delete_by_locator_removes_object() {
        let (_dir, store) = store().await;
        let locator = store
            .put(MediaCategory::Images, Some("a.jpg"), b"img")
            .await
            .unwrap();
        store.delete_by_locator(&locator).await;

        let file = locator.rsplit('/').next().unwrap();
        assert!(matches!(
            store.get(MediaCategory::Images, file).await.unwrap_err(),
            ServerError::NotFound(_)
        ));

        // Foreign and repeated deletes are silently ignored.
        store.delete_by_locator(&locator).await;
        store.delete_by_locator("https://elsewhere/media/images/x.jpg").await;
    }

    #[test]
    fn extension_extraction() {
        assert_eq!(extension_of("photo.JPG"), Some("jpg".to_string()));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(extension_of("no-extension"), None);
        assert_eq!(extension_of("weird.<>?"), None);
    }
}
