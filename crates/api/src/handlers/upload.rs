//! Multipart form reading and the editor media upload endpoint.

use std::collections::HashMap;
use std::str::FromStr;

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::Json;
use lms_core::error::CoreError;
use lms_core::storage::{check_upload_size, is_editor_media, StoredFile};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuthor;
use crate::state::AppState;

/// A file part of a multipart form.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A multipart form split into its file part and its text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    file: Option<UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Drain `multipart`. Parts carrying a file name, or named in
    /// `file_fields`, are taken as the file; the last one wins.
    pub async fn read(multipart: &mut Multipart, file_fields: &[&str]) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);

            if file_name.is_some() || file_fields.contains(&name.as_str()) {
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.file = Some(UploadedFile {
                    file_name: file_name.unwrap_or_else(|| name.clone()),
                    content_type,
                    data,
                });
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// A trimmed, non-empty text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// A text field parsed as `T`; `None` when absent or blank.
    pub fn parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>, CoreError> {
        self.text(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| CoreError::Validation(format!("Invalid value for '{name}'")))
            })
            .transpose()
    }

    pub fn take_file(&mut self) -> Result<UploadedFile, CoreError> {
        self.file
            .take()
            .ok_or_else(|| CoreError::Validation("A file is required".into()))
    }
}

/// Enforce the size ceiling and hand the file to the storage collaborator.
pub async fn store_upload(state: &AppState, file: &UploadedFile) -> AppResult<StoredFile> {
    check_upload_size(file.data.len(), state.config.max_upload_bytes)?;
    let stored = state
        .storage
        .store(&file.data, file.content_type.as_deref(), &file.file_name)
        .await?;
    Ok(stored)
}

/// Remove a stored file whose database row could not be written.
///
/// Failures are logged, not returned, so the caller reports the original
/// error.
pub async fn discard_upload(state: &AppState, stored: &StoredFile) {
    if let Err(e) = state.storage.remove(&stored.url).await {
        tracing::warn!(url = %stored.url, error = %e, "Failed to remove orphaned upload");
    }
}

/// Response shape expected by the editor's image tool.
#[derive(Debug, Serialize)]
pub struct EditorUploadResponse {
    pub success: u8,
    pub file: EditorFile,
}

#[derive(Debug, Serialize)]
pub struct EditorFile {
    pub url: String,
    pub name: String,
    pub size: i64,
}

/// POST /api/v1/uploads/image
///
/// Inline image or video for a block document. Replies in the editor's own
/// `{ success, file: { url } }` format rather than the data envelope.
pub async fn upload_editor_media(
    RequireAuthor(auth): RequireAuthor,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<EditorUploadResponse>> {
    let mut form = UploadForm::read(&mut multipart, &["image", "file"]).await?;
    let file = form.take_file()?;
    if !is_editor_media(file.content_type.as_deref()) {
        return Err(AppError::Core(CoreError::Validation(
            "Only image or video files can be embedded".into(),
        )));
    }

    let stored = store_upload(&state, &file).await?;
    tracing::info!(
        user_id = auth.user_id,
        url = %stored.url,
        size = stored.size_bytes,
        "Editor media uploaded",
    );

    Ok(Json(EditorUploadResponse {
        success: 1,
        file: EditorFile {
            url: stored.url,
            name: stored.file_name,
            size: stored.size_bytes,
        },
    }))
}
