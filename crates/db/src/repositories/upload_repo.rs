//! Lookup of the content rows that reference a stored file.

use lms_core::approval::ContentKind;
use sqlx::PgPool;

use crate::models::upload::UploadOwner;

/// Resolves stored file URLs to their owning material or lesson.
pub struct UploadRepo;

impl UploadRepo {
    /// The material or lesson referencing `url`, materials first.
    ///
    /// Files referenced by neither (inline editor media) return `None`.
    pub async fn find_owner(
        pool: &PgPool,
        url: &str,
    ) -> Result<Option<(ContentKind, UploadOwner)>, sqlx::Error> {
        let material = sqlx::query_as::<_, UploadOwner>(
            "SELECT id AS entity_id, course_id, created_by, is_published
             FROM materials WHERE file_url = $1
             LIMIT 1",
        )
        .bind(url)
        .fetch_optional(pool)
        .await?;
        if let Some(owner) = material {
            return Ok(Some((ContentKind::Material, owner)));
        }

        let lesson = sqlx::query_as::<_, UploadOwner>(
            "SELECT id AS entity_id, course_id, created_by, is_published
             FROM lessons
             WHERE video_url = $1
                OR thumbnail_url = $1
                OR resources @> jsonb_build_array(jsonb_build_object('url', $1::TEXT))
             LIMIT 1",
        )
        .bind(url)
        .fetch_optional(pool)
        .await?;
        Ok(lesson.map(|owner| (ContentKind::Lesson, owner)))
    }
}
