#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use lms_api::auth::jwt::{generate_access_token, JwtConfig};
use lms_api::config::ServerConfig;
use lms_api::router::build_app_router;
use lms_api::state::AppState;
use lms_api::storage::LocalFileStorage;
use lms_core::types::DbId;
use lms_db::models::user::CreateUser;
use lms_db::repositories::UserRepo;
use sqlx::PgPool;
use tower::ServiceExt;

const MULTIPART_BOUNDARY: &str = "lms-test-boundary";

/// Upload directory shared by every test in the binary.
pub fn upload_dir() -> PathBuf {
    static DIR: OnceLock<tempfile::TempDir> = OnceLock::new();
    DIR.get_or_init(|| tempfile::tempdir().expect("create upload tempdir"))
        .path()
        .to_path_buf()
}

/// Build a test `ServerConfig` with safe defaults and a 1 KiB upload cap.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        upload_dir: upload_dir(),
        max_upload_bytes: 1024,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// The full application router over `pool`, with the production middleware
/// stack.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        storage: Arc::new(LocalFileStorage::new(config.upload_dir.clone())),
    };
    build_app_router(state, &config)
}

/// A seeded user with a valid access token.
pub struct TestUser {
    pub id: DbId,
    pub token: String,
}

pub async fn seed_user(pool: &PgPool, role: &str) -> TestUser {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            name: format!("Test {role}"),
            email: format!("{role}-{}@example.com", uuid::Uuid::new_v4()),
            role: role.to_string(),
        },
    )
    .await
    .expect("seed user");
    let token = generate_access_token(user.id, role, &test_config().jwt).expect("sign token");
    TestUser { id: user.id, token }
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("router is infallible")
}

fn request(method: Method, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
}

pub async fn get(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, token).body(Body::empty()).unwrap()).await
}

/// GET without an `Authorization` header.
pub async fn get_anonymous(app: Router, uri: &str) -> Response<Body> {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, req).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::DELETE, uri, token).body(Body::empty()).unwrap()).await
}

async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let req = request(method, uri, token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn post_json(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response<Body> {
    send_json(app, Method::POST, uri, token, body).await
}

pub async fn put_json(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response<Body> {
    send_json(app, Method::PUT, uri, token, body).await
}

/// One part of a multipart form.
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }

    pub fn file(name: &'a str, file_name: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            content_type: Some(content_type),
            data,
        }
    }
}

pub async fn post_multipart(app: Router, uri: &str, token: &str, parts: &[Part<'_>]) -> Response<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(file_name) = part.file_name {
            disposition.push_str(&format!("; filename=\"{file_name}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    let req = request(Method::POST, uri, token)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, req).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A block document with one paragraph.
pub fn document(text: &str) -> serde_json::Value {
    serde_json::json!({
        "blocks": [{"type": "paragraph", "data": {"text": text}}]
    })
}

/// Create a course as `admin` and return its id.
pub async fn create_course(pool: &PgPool, admin: &TestUser, title: &str) -> DbId {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/courses",
        &admin.token,
        serde_json::json!({"title": title}),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create a module with one paragraph as `author` and return its id.
pub async fn create_module(pool: &PgPool, author: &TestUser, course_id: DbId, title: &str) -> DbId {
    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/courses/{course_id}/modules"),
        &author.token,
        serde_json::json!({"title": title, "content": document(title), "duration_mins": 10}),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Approve `/{kind}/{id}` as `admin`.
pub async fn approve(pool: &PgPool, admin: &TestUser, kind: &str, id: DbId) {
    let response = put_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/{kind}/{id}/approve"),
        &admin.token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}
