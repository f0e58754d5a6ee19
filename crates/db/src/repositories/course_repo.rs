//! Repository for the `courses` table.

use sqlx::PgPool;
use lms_core::types::DbId;

use crate::models::course::{Course, CreateCourse};

/// Column list for courses queries.
const COLUMNS: &str = "id, title, description, category, thumbnail_url, price_cents, \
    created_by, module_ids, total_modules, total_lessons, total_materials, total_exams, \
    created_at, updated_at";

/// Provides CRUD operations for courses.
pub struct CourseRepo;

impl CourseRepo {
    /// Insert a new course, returning the created row.
    pub async fn create(
        pool: &PgPool,
        created_by: DbId,
        input: &CreateCourse,
    ) -> Result<Course, sqlx::Error> {
        let query = format!(
            "INSERT INTO courses (title, description, category, thumbnail_url, price_cents, created_by)
             VALUES ($1, $2, $3, $4, COALESCE($5, 0), $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&query)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.thumbnail_url)
            .bind(input.price_cents)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a course by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Course>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM courses WHERE id = $1");
        sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all courses, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM courses ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Course>(&query).fetch_all(pool).await
    }

    /// Recompute every denormalized counter and id list of a course from the
    /// child tables. Returns `None` if the course does not exist.
    pub async fn recount(pool: &PgPool, id: DbId) -> Result<Option<Course>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE modules m SET lesson_ids = COALESCE(
                (SELECT array_agg(l.id ORDER BY l.sort_order)
                   FROM lessons l WHERE l.module_id = m.id),
                '{}')
             WHERE m.course_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE courses c SET
                module_ids = COALESCE(
                    (SELECT array_agg(m.id ORDER BY m.sort_order)
                       FROM modules m WHERE m.course_id = c.id),
                    '{{}}'),
                total_modules = (SELECT COUNT(*) FROM modules WHERE course_id = c.id),
                total_lessons = (SELECT COUNT(*) FROM lessons WHERE course_id = c.id),
                total_materials = (SELECT COUNT(*) FROM materials WHERE course_id = c.id),
                total_exams = (SELECT COUNT(*) FROM exams WHERE course_id = c.id)
             WHERE c.id = $1
             RETURNING {COLUMNS}"
        );
        let course = sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(course)
    }
}
