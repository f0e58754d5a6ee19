//! File storage collaborator interface and upload limits.
//!
//! The backend persists only the URL, name and size returned by a
//! [`FileStorage`] implementation, never raw bytes.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreError;

/// Default upload ceiling (100 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Metadata of a file accepted by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    /// Retrievable URL.
    pub url: String,
    /// Original (client-supplied) file name.
    pub file_name: String,
    pub size_bytes: i64,
}

/// Stores binary payloads and returns a retrievable location.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store(
        &self,
        data: &[u8],
        content_type: Option<&str>,
        original_name: &str,
    ) -> Result<StoredFile, CoreError>;

    /// Delete a previously stored file by its URL. Missing files are not an
    /// error.
    async fn remove(&self, url: &str) -> Result<(), CoreError>;
}

/// Whether `name` is a bare stored file name with no path components.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}

/// Reject payloads larger than `max_bytes`.
pub fn check_upload_size(len: usize, max_bytes: u64) -> Result<(), CoreError> {
    if len as u64 > max_bytes {
        return Err(CoreError::Validation(format!(
            "File exceeds the maximum upload size of {max_bytes} bytes"
        )));
    }
    if len == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".into()));
    }
    Ok(())
}

/// Whether a content type is accepted for inline editor media.
pub fn is_editor_media(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with("image/") || ct.starts_with("video/"))
}

/// Lowercased extension of `name` when it is short and alphanumeric.
pub fn safe_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
