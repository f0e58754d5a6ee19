//! HTTP-level tests for exam eligibility and attempts.

mod common;

use axum::http::StatusCode;
use common::{approve, body_json, create_course, create_module, get, post_json, seed_user, TestUser};
use lms_core::types::DbId;
use sqlx::PgPool;

struct Fixture {
    admin: TestUser,
    staff: TestUser,
    student: TestUser,
    course_id: DbId,
    module_id: DbId,
    exam_id: DbId,
}

/// A course with one approved 10-minute module and an approved exam that
/// unlocks at `activation_threshold` percent and passes at 50.
async fn fixture(pool: &PgPool, activation_threshold: i32) -> Fixture {
    let admin = seed_user(pool, "admin").await;
    let staff = seed_user(pool, "staff").await;
    let student = seed_user(pool, "student").await;
    let course_id = create_course(pool, &admin, "Concurrency in Rust").await;
    let module_id = create_module(pool, &staff, course_id, "Send and Sync").await;
    approve(pool, &admin, "modules", module_id).await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/courses/{course_id}/exams"),
        &staff.token,
        serde_json::json!({
            "title": "Final exam",
            "passing_score": 50,
            "activation_threshold": activation_threshold,
            "questions": [
                {"question_text": "Is Rc Send?", "options": ["no", "yes"], "correct_option_indices": [0]},
                {"question_text": "Which are Sync?", "options": ["Cell", "Arc", "Mutex"], "correct_option_indices": [1, 2]}
            ]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let exam_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    Fixture {
        admin,
        staff,
        student,
        course_id,
        module_id,
        exam_id,
    }
}

async fn enroll(pool: &PgPool, fx: &Fixture) {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/enrollments",
        &fx.student.token,
        serde_json::json!({"course_id": fx.course_id}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn finish_course(pool: &PgPool, fx: &Fixture) {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/progress",
        &fx.student.token,
        serde_json::json!({"course_id": fx.course_id, "module_id": fx.module_id, "time_spent_secs": 600}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["percent_complete"], 100);
}

async fn submit(pool: &PgPool, fx: &Fixture, token: &str, answers: serde_json::Value) -> axum::http::Response<axum::body::Body> {
    post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/exams/{}/attempts", fx.exam_id),
        token,
        serde_json::json!({"answers": answers}),
    )
    .await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_exam_locked_until_eligible(pool: PgPool) {
    let fx = fixture(&pool, 100).await;
    let answers = serde_json::json!([[0], [1, 2]]);

    // Draft exam, student not enrolled.
    let response = submit(&pool, &fx, &fx.student.token, answers.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    approve(&pool, &fx.admin, "exams", fx.exam_id).await;
    let response = submit(&pool, &fx, &fx.student.token, answers.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Enrolled, but below the activation threshold.
    enroll(&pool, &fx).await;
    let response = submit(&pool, &fx, &fx.student.token, answers.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_json(response).await["error"].as_str().unwrap().contains("100%"));

    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/courses/{}/exam-eligibility", fx.course_id),
        &fx.student.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["exam_id"], fx.exam_id);
    assert_eq!(json["data"][0]["eligible"], false);
    assert_eq!(json["data"][0]["percent_complete"], 0);

    // Staff never sit exams.
    let response = submit(&pool, &fx, &fx.staff.token, answers).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_attempts_are_graded_and_recorded(pool: PgPool) {
    let fx = fixture(&pool, 100).await;
    approve(&pool, &fx.admin, "exams", fx.exam_id).await;
    enroll(&pool, &fx).await;
    finish_course(&pool, &fx).await;

    let response = submit(&pool, &fx, &fx.student.token, serde_json::json!([[1], [1]])).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["correct_count"], 0);
    assert_eq!(json["data"]["score_percent"], 0);
    assert_eq!(json["data"]["passed"], false);

    // Order and duplicates in a multi-answer do not matter.
    let response = submit(&pool, &fx, &fx.student.token, serde_json::json!([[0], [2, 1, 1]])).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["correct_count"], 2);
    assert_eq!(json["data"]["total_questions"], 2);
    assert_eq!(json["data"]["score_percent"], 100);
    assert_eq!(json["data"]["passed"], true);
    let passing_attempt = json["data"]["id"].clone();

    let response = submit(&pool, &fx, &fx.student.token, serde_json::json!([[0]])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/exams/{}/attempts", fx.exam_id),
        &fx.student.token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"][0]["id"], passing_attempt);

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/courses/{}/exam-eligibility", fx.course_id),
        &fx.student.token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["eligible"], true);
    assert!(json["data"][0]["reason"].is_null());
    assert_eq!(json["data"][0]["attempts"], 2);
    assert_eq!(json["data"][0]["best_score"], 100);
    assert_eq!(json["data"][0]["passed"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_half_marks_meet_passing_score(pool: PgPool) {
    let fx = fixture(&pool, 0).await;
    approve(&pool, &fx.admin, "exams", fx.exam_id).await;
    enroll(&pool, &fx).await;

    // A zero threshold unlocks the exam on enrollment.
    let response = submit(&pool, &fx, &fx.student.token, serde_json::json!([[0], [1]])).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["score_percent"], 50);
    assert_eq!(json["data"]["passed"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_attempt_on_missing_exam_returns_404(pool: PgPool) {
    let student = seed_user(&pool, "student").await;
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/exams/999999/attempts",
        &student.token,
        serde_json::json!({"answers": [[0]]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
