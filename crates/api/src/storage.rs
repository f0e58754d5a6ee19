//! Local-disk [`FileStorage`] implementation.
//!
//! Files are written under the configured upload directory with a random
//! name and served back, behind authentication, at [`UPLOADS_ROUTE`].

use std::path::PathBuf;

use async_trait::async_trait;
use lms_core::error::CoreError;
use lms_core::storage::{is_safe_file_name, safe_extension, FileStorage, StoredFile};
use uuid::Uuid;

/// URL prefix under which stored files are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// The stored name inside a `/uploads/{name}` URL, if it is one of ours.
pub fn stored_name(url: &str) -> Option<&str> {
    url.strip_prefix(UPLOADS_ROUTE)?
        .strip_prefix('/')
        .filter(|name| is_safe_file_name(name))
}

/// Extension for common content types when the file name has none.
fn extension_for(content_type: Option<&str>) -> Option<&'static str> {
    match content_type? {
        "application/pdf" => Some("pdf"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "video/mp4" => Some("mp4"),
        "audio/mpeg" => Some("mp3"),
        _ => None,
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(
        &self,
        data: &[u8],
        content_type: Option<&str>,
        original_name: &str,
    ) -> Result<StoredFile, CoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to create upload directory: {e}")))?;

        let extension =
            safe_extension(original_name).or_else(|| extension_for(content_type).map(String::from));
        let stored_name = match extension {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };

        tokio::fs::write(self.root.join(&stored_name), data)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to write upload: {e}")))?;

        tracing::debug!(file = %stored_name, size = data.len(), "Stored upload");

        Ok(StoredFile {
            url: format!("{UPLOADS_ROUTE}/{stored_name}"),
            file_name: original_name.to_string(),
            size_bytes: data.len() as i64,
        })
    }

    async fn remove(&self, url: &str) -> Result<(), CoreError> {
        let name = stored_name(url)
            .ok_or_else(|| CoreError::Validation(format!("Not a stored upload: {url}")))?;
        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => {
                tracing::debug!(file = %name, "Removed upload");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Internal(format!("Failed to remove upload: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_writes_file_under_random_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let stored = storage
            .store(b"%PDF-1.4", Some("application/pdf"), "Week 1 Notes.PDF")
            .await
            .unwrap();

        assert_eq!(stored.file_name, "Week 1 Notes.PDF");
        assert_eq!(stored.size_bytes, 8);
        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.url.ends_with(".pdf"));

        let name = stored.url.trim_start_matches("/uploads/");
        let on_disk = std::fs::read(dir.path().join(name)).unwrap();
        assert_eq!(on_disk, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_remove_deletes_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let stored = storage.store(b"data", None, "notes.txt").await.unwrap();
        let name = stored_name(&stored.url).unwrap().to_string();
        assert!(dir.path().join(&name).exists());

        storage.remove(&stored.url).await.unwrap();
        assert!(!dir.path().join(&name).exists());
        storage.remove(&stored.url).await.unwrap();

        assert!(storage.remove("/uploads/../Cargo.toml").await.is_err());
        assert!(storage.remove("https://cdn.example.com/a.png").await.is_err());
    }

    #[tokio::test]
    async fn test_extension_falls_back_to_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().join("nested"));

        let stored = storage.store(b"png", Some("image/png"), "blob").await.unwrap();
        assert!(stored.url.ends_with(".png"));

        let stored = storage.store(b"raw", None, "blob").await.unwrap();
        assert!(!stored.url.contains('.'));
    }
}
