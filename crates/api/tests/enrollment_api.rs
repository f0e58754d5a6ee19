//! HTTP-level tests for enrollments and progress tracking.

mod common;

use axum::http::StatusCode;
use common::{approve, body_json, create_course, create_module, get, post_json, seed_user};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_enroll_check_and_withdraw(pool: PgPool) {
    let admin = seed_user(&pool, "admin").await;
    let student = seed_user(&pool, "student").await;
    let course_id = create_course(&pool, &admin, "Async Rust").await;
    let body = serde_json::json!({"course_id": course_id});

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/enrollments",
        &student.token,
        body.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status_id"], 1);
    assert_eq!(json["data"]["percent_complete"], 0);
    let enrollment_id = json["data"]["id"].as_i64().unwrap();

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/enrollments",
        &student.token,
        body.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");

    let check_uri = format!("/api/v1/enrollments/check/{course_id}");
    let response = get(common::build_test_app(pool.clone()), &check_uri, &student.token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["is_enrolled"], true);
    assert_eq!(json["data"]["enrollment"]["id"], enrollment_id);

    let response = get(
        common::build_test_app(pool.clone()),
        "/api/v1/enrollments/mine",
        &student.token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["course_title"], "Async Rust");

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/enrollments/{enrollment_id}/withdraw"),
        &student.token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status_id"], 2);

    let response = get(common::build_test_app(pool.clone()), &check_uri, &student.token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["is_enrolled"], false);
    assert!(json["data"]["enrollment"].is_null());

    // A withdrawn student may enroll again.
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/enrollments",
        &student.token,
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Two enrollment records, one course in the history.
    let response = get(
        common::build_test_app(pool),
        "/api/v1/enrollments/courses",
        &student.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], serde_json::json!([course_id]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_only_students_enroll(pool: PgPool) {
    let admin = seed_user(&pool, "admin").await;
    let staff = seed_user(&pool, "staff").await;
    let course_id = create_course(&pool, &admin, "Macros").await;

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/enrollments",
        &staff.token,
        serde_json::json!({"course_id": course_id}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_enroll_in_missing_course_returns_404(pool: PgPool) {
    let student = seed_user(&pool, "student").await;
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/enrollments",
        &student.token,
        serde_json::json!({"course_id": 999999}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_progress_completes_module_and_course(pool: PgPool) {
    let admin = seed_user(&pool, "admin").await;
    let staff = seed_user(&pool, "staff").await;
    let student = seed_user(&pool, "student").await;
    let course_id = create_course(&pool, &admin, "Unsafe Rust").await;
    let module_id = create_module(&pool, &staff, course_id, "Raw pointers").await;
    approve(&pool, &admin, "modules", module_id).await;

    post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/enrollments",
        &student.token,
        serde_json::json!({"course_id": course_id}),
    )
    .await;

    let delta = serde_json::json!({
        "course_id": course_id,
        "module_id": module_id,
        "time_spent_secs": 300
    });

    // 10 minute module: completion needs 480 seconds.
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/progress",
        &student.token,
        delta.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["time_spent_secs"], 300);
    assert_eq!(json["data"]["completed"], false);
    assert_eq!(json["data"]["percent_complete"], 0);

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/progress",
        &student.token,
        delta,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["time_spent_secs"], 600);
    assert_eq!(json["data"]["completed"], true);
    assert_eq!(json["data"]["newly_completed"], true);
    assert_eq!(json["data"]["percent_complete"], 100);
    assert!(json["data"]["next_module_id"].is_null());

    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/progress/{course_id}"),
        &student.token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["percent_complete"], 100);
    assert_eq!(json["data"]["completed_module_ids"], serde_json::json!([module_id]));

    let response = get(
        common::build_test_app(pool.clone()),
        "/api/v1/enrollments/mine",
        &student.token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["completed"], true);
    assert_eq!(json["data"][0]["percent_complete"], 100);
    assert_eq!(json["data"][0]["status_id"], 3);

    // Finishing the course keeps the student enrolled.
    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/enrollments/check/{course_id}"),
        &student.token,
    )
    .await;
    assert_eq!(body_json(response).await["data"]["is_enrolled"], true);

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/enrollments",
        &student.token,
        serde_json::json!({"course_id": course_id}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get(
        common::build_test_app(pool),
        "/api/v1/enrollments/mine",
        &student.token,
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_progress_requires_enrolled_student(pool: PgPool) {
    let admin = seed_user(&pool, "admin").await;
    let staff = seed_user(&pool, "staff").await;
    let student = seed_user(&pool, "student").await;
    let course_id = create_course(&pool, &admin, "Embedded Rust").await;
    let module_id = create_module(&pool, &staff, course_id, "No std").await;
    let delta = serde_json::json!({
        "course_id": course_id,
        "module_id": module_id,
        "time_spent_secs": 60
    });

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/progress",
        &student.token,
        delta.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/progress",
        &staff.token,
        delta,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/progress",
        &student.token,
        serde_json::json!({"course_id": course_id, "module_id": module_id, "time_spent_secs": -5}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_progress_for_untouched_course_is_empty(pool: PgPool) {
    let admin = seed_user(&pool, "admin").await;
    let student = seed_user(&pool, "student").await;
    let course_id = create_course(&pool, &admin, "Rust for Pythonistas").await;

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/progress/{course_id}"),
        &student.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["percent_complete"], 0);
    assert_eq!(json["data"]["completed_module_ids"], serde_json::json!([]));
}
