//! Integration tests for the enrollment ledger and progress tracking.

use assert_matches::assert_matches;
use serde_json::json;
use sqlx::PgPool;
use lms_core::approval::{Actor, Transition};
use lms_core::enrollment::EnrollmentStatus;
use lms_core::error::CoreError;
use lms_core::roles::{ROLE_ADMIN, ROLE_STUDENT};
use lms_db::models::course::CreateCourse;
use lms_db::models::module::CreateModule;
use lms_db::models::progress::RecordProgress;
use lms_db::models::user::CreateUser;
use lms_db::repositories::{
    CourseRepo, EnrollmentRepo, ModuleKind, ModuleRepo, ProgressRepo, UserRepo, WorkflowRepo,
};
use lms_db::RepoError;

async fn seed_user(pool: &PgPool, name: &str, role: &str) -> Actor {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            role: role.to_string(),
        },
    )
    .await
    .unwrap();
    Actor::new(user.id, role)
}

async fn seed_course(pool: &PgPool, admin: &Actor, title: &str) -> i64 {
    CourseRepo::create(
        pool,
        admin.user_id,
        &CreateCourse {
            title: title.to_string(),
            description: Some("A course".to_string()),
            category: None,
            thumbnail_url: None,
            price_cents: Some(4900),
        },
    )
    .await
    .unwrap()
    .id
}

/// Create and approve a module with the given duration.
async fn approved_module(pool: &PgPool, admin: &Actor, course_id: i64, duration_mins: Option<i32>) -> i64 {
    let module = ModuleRepo::create(
        pool,
        course_id,
        admin.user_id,
        &CreateModule {
            title: "Module".to_string(),
            description: None,
            content: None,
            duration_mins,
        },
        &json!({"blocks": [{"type": "paragraph", "data": {"text": "x"}}]}),
    )
    .await
    .unwrap();
    WorkflowRepo::<ModuleKind>::transition(pool, module.id, admin, &Transition::Approve { remarks: None })
        .await
        .unwrap();
    module.id
}

fn record(course_id: i64, module_id: i64, secs: i64) -> RecordProgress {
    RecordProgress {
        course_id,
        module_id,
        time_spent_secs: secs,
    }
}

// ---------------------------------------------------------------------------
// Enrollment
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_enroll_twice_conflicts_until_withdrawn(pool: PgPool) {
    let admin = seed_user(&pool, "admin", ROLE_ADMIN).await;
    let student = seed_user(&pool, "student", ROLE_STUDENT).await;
    let course_id = seed_course(&pool, &admin, "Rust 101").await;

    let first = EnrollmentRepo::enroll(&pool, student.user_id, course_id).await.unwrap();
    assert_eq!(first.status_id, EnrollmentStatus::Active.id());
    assert_eq!(first.percent_complete, 0);
    assert!(!first.completed);

    let again = EnrollmentRepo::enroll(&pool, student.user_id, course_id).await;
    assert_matches!(again, Err(RepoError::Core(CoreError::Conflict(_))));

    let withdrawn = EnrollmentRepo::withdraw(&pool, first.id, &student).await.unwrap();
    assert_eq!(withdrawn.status_id, EnrollmentStatus::Withdrawn.id());
    assert!(withdrawn.withdrawn_at.is_some());

    let second = EnrollmentRepo::enroll(&pool, student.user_id, course_id).await.unwrap();
    assert_ne!(second.id, first.id);

    // The denormalized set holds the course once.
    let courses = EnrollmentRepo::course_ids_for_student(&pool, student.user_id).await.unwrap();
    assert_eq!(courses, vec![course_id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_enroll_in_missing_course_is_not_found(pool: PgPool) {
    let student = seed_user(&pool, "student", ROLE_STUDENT).await;
    let result = EnrollmentRepo::enroll(&pool, student.user_id, 777).await;
    assert_matches!(
        result,
        Err(RepoError::Core(CoreError::NotFound { entity: "Course", id: 777 }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_current_index_rejects_duplicate_insert(pool: PgPool) {
    let admin = seed_user(&pool, "admin", ROLE_ADMIN).await;
    let student = seed_user(&pool, "student", ROLE_STUDENT).await;
    let course_id = seed_course(&pool, &admin, "Rust 101").await;
    EnrollmentRepo::enroll(&pool, student.user_id, course_id).await.unwrap();

    // Bypass the pre-check, as a racing request would.
    let err = sqlx::query("INSERT INTO enrollments (student_id, course_id) VALUES ($1, $2)")
        .bind(student.user_id)
        .bind(course_id)
        .execute(&pool)
        .await
        .unwrap_err();
    let constraint = err.as_database_error().and_then(|e| e.constraint()).map(str::to_owned);
    assert_eq!(constraint.as_deref(), Some("uq_enrollments_current_student_course"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_for_student_includes_course_summary(pool: PgPool) {
    let admin = seed_user(&pool, "admin", ROLE_ADMIN).await;
    let student = seed_user(&pool, "student", ROLE_STUDENT).await;
    let older = seed_course(&pool, &admin, "Rust 101").await;
    let newer = seed_course(&pool, &admin, "Async Rust").await;
    EnrollmentRepo::enroll(&pool, student.user_id, older).await.unwrap();
    EnrollmentRepo::enroll(&pool, student.user_id, newer).await.unwrap();

    let list = EnrollmentRepo::list_for_student(&pool, student.user_id).await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].course_id, newer);
    assert_eq!(list[0].course_title, "Async Rust");
    assert_eq!(list[1].course_price_cents, 4900);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_other_student_cannot_withdraw(pool: PgPool) {
    let admin = seed_user(&pool, "admin", ROLE_ADMIN).await;
    let student = seed_user(&pool, "student", ROLE_STUDENT).await;
    let other = seed_user(&pool, "other", ROLE_STUDENT).await;
    let course_id = seed_course(&pool, &admin, "Rust 101").await;
    let enrollment = EnrollmentRepo::enroll(&pool, student.user_id, course_id).await.unwrap();

    let result = EnrollmentRepo::withdraw(&pool, enrollment.id, &other).await;
    assert_matches!(result, Err(RepoError::Core(CoreError::Forbidden(_))));

    EnrollmentRepo::withdraw(&pool, enrollment.id, &admin).await.unwrap();
    let result = EnrollmentRepo::withdraw(&pool, enrollment.id, &admin).await;
    assert_matches!(result, Err(RepoError::Core(CoreError::Validation(_))));
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_time_accumulates_until_completion(pool: PgPool) {
    let admin = seed_user(&pool, "admin", ROLE_ADMIN).await;
    let student = seed_user(&pool, "student", ROLE_STUDENT).await;
    let course_id = seed_course(&pool, &admin, "Rust 101").await;
    let first = approved_module(&pool, &admin, course_id, None).await;
    let second = approved_module(&pool, &admin, course_id, None).await;
    EnrollmentRepo::enroll(&pool, student.user_id, course_id).await.unwrap();

    let update = ProgressRepo::record_time(&pool, student.user_id, &record(course_id, first, 300))
        .await
        .unwrap();
    assert_eq!(update.time_spent_secs, 300);
    assert!(!update.completed);
    assert_eq!(update.next_module_id, None);

    let update = ProgressRepo::record_time(&pool, student.user_id, &record(course_id, first, 300))
        .await
        .unwrap();
    assert_eq!(update.time_spent_secs, 600);
    assert!(update.completed);
    assert!(update.newly_completed);
    assert_eq!(update.percent_complete, 50);
    assert_eq!(update.next_module_id, Some(second));

    let summary = ProgressRepo::summary(&pool, student.user_id, course_id).await.unwrap();
    assert_eq!(summary.completed_module_ids, vec![first]);
    assert_eq!(summary.modules.len(), 1);

    let enrollment = EnrollmentRepo::find_current(&pool, student.user_id, course_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.percent_complete, 50);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_completing_every_module_completes_enrollment(pool: PgPool) {
    let admin = seed_user(&pool, "admin", ROLE_ADMIN).await;
    let student = seed_user(&pool, "student", ROLE_STUDENT).await;
    let course_id = seed_course(&pool, &admin, "Rust 101").await;
    let only = approved_module(&pool, &admin, course_id, Some(1)).await;
    let enrollment = EnrollmentRepo::enroll(&pool, student.user_id, course_id).await.unwrap();

    let update = ProgressRepo::record_time(&pool, student.user_id, &record(course_id, only, 60))
        .await
        .unwrap();
    assert_eq!(update.percent_complete, 100);
    assert_eq!(update.next_module_id, None);

    let enrollment = EnrollmentRepo::find_by_id(&pool, enrollment.id).await.unwrap().unwrap();
    assert_eq!(enrollment.status_id, EnrollmentStatus::Completed.id());
    assert!(enrollment.completed);

    // A completed student keeps access.
    ProgressRepo::record_time(&pool, student.user_id, &record(course_id, only, 5))
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_completed_enrollment_still_counts_as_enrolled(pool: PgPool) {
    let admin = seed_user(&pool, "admin", ROLE_ADMIN).await;
    let student = seed_user(&pool, "student", ROLE_STUDENT).await;
    let course_id = seed_course(&pool, &admin, "Rust 101").await;
    let module = approved_module(&pool, &admin, course_id, None).await;
    let enrollment = EnrollmentRepo::enroll(&pool, student.user_id, course_id).await.unwrap();

    let update = ProgressRepo::record_time(&pool, student.user_id, &record(course_id, module, 600))
        .await
        .unwrap();
    assert_eq!(update.percent_complete, 100);

    let current = EnrollmentRepo::find_current(&pool, student.user_id, course_id)
        .await
        .unwrap()
        .expect("completed enrollment is current");
    assert_eq!(current.id, enrollment.id);
    assert_eq!(current.status_id, EnrollmentStatus::Completed.id());

    let again = EnrollmentRepo::enroll(&pool, student.user_id, course_id).await;
    assert_matches!(again, Err(RepoError::Core(CoreError::Conflict(_))));

    // A completed enrollment cannot be withdrawn either.
    let result = EnrollmentRepo::withdraw(&pool, enrollment.id, &student).await;
    assert_matches!(result, Err(RepoError::Core(CoreError::Validation(_))));

    let (records,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM enrollments WHERE student_id = $1 AND course_id = $2",
    )
    .bind(student.user_id)
    .bind(course_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(records, 1);

    let err = sqlx::query(
        "INSERT INTO enrollments (student_id, course_id, status_id) VALUES ($1, $2, 1)",
    )
    .bind(student.user_id)
    .bind(course_id)
    .execute(&pool)
    .await
    .unwrap_err();
    let constraint = err.as_database_error().and_then(|e| e.constraint()).map(str::to_owned);
    assert_eq!(constraint.as_deref(), Some("uq_enrollments_current_student_course"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_progress_requires_enrollment_and_matching_course(pool: PgPool) {
    let admin = seed_user(&pool, "admin", ROLE_ADMIN).await;
    let student = seed_user(&pool, "student", ROLE_STUDENT).await;
    let course_id = seed_course(&pool, &admin, "Rust 101").await;
    let other_course = seed_course(&pool, &admin, "Go 101").await;
    let module = approved_module(&pool, &admin, course_id, None).await;

    let result = ProgressRepo::record_time(&pool, student.user_id, &record(course_id, module, 10)).await;
    assert_matches!(result, Err(RepoError::Core(CoreError::Forbidden(_))));

    EnrollmentRepo::enroll(&pool, student.user_id, other_course).await.unwrap();
    let result = ProgressRepo::record_time(&pool, student.user_id, &record(other_course, module, 10)).await;
    assert_matches!(result, Err(RepoError::Core(CoreError::Validation(_))));

    let result = ProgressRepo::record_time(&pool, student.user_id, &record(course_id, 9999, 10)).await;
    assert_matches!(
        result,
        Err(RepoError::Core(CoreError::NotFound { entity: "Module", .. }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_updates_do_not_lose_time(pool: PgPool) {
    let admin = seed_user(&pool, "admin", ROLE_ADMIN).await;
    let student = seed_user(&pool, "student", ROLE_STUDENT).await;
    let course_id = seed_course(&pool, &admin, "Rust 101").await;
    let module = approved_module(&pool, &admin, course_id, Some(60)).await;
    EnrollmentRepo::enroll(&pool, student.user_id, course_id).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        let student_id = student.user_id;
        handles.push(tokio::spawn(async move {
            ProgressRepo::record_time(&pool, student_id, &record(course_id, module, 25)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let summary = ProgressRepo::summary(&pool, student.user_id, course_id).await.unwrap();
    assert_eq!(summary.modules.len(), 1);
    assert_eq!(summary.modules[0].time_spent_secs, 200);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_summary_without_record_is_empty(pool: PgPool) {
    let admin = seed_user(&pool, "admin", ROLE_ADMIN).await;
    let student = seed_user(&pool, "student", ROLE_STUDENT).await;
    let course_id = seed_course(&pool, &admin, "Rust 101").await;

    let summary = ProgressRepo::summary(&pool, student.user_id, course_id).await.unwrap();
    assert_eq!(summary.percent_complete, 0);
    assert!(summary.modules.is_empty());
    assert!(summary.last_accessed_at.is_none());
}
