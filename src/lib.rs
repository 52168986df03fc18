//! Backend for the mini applications dashboard: the tool catalogue, the
//! suggestion board with per-user up/down votes, and PDF to Word conversion.

use axum::{
    Router,
    extract::{DefaultBodyLimit, Extension},
    http::{
        Method,
        header::{ACCEPT, CONTENT_TYPE},
    },
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub mod applications;
pub mod config;
pub mod convert;
pub mod db;
pub mod error;
pub mod pagination;
pub mod sse;
pub mod startup;
pub mod suggestions;
pub mod votes;

use error::ApiError;
use startup::AppState;

pub fn build_router(app_state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(app_state.max_upload_bytes);

    Router::new()
        .route("/health", get(health))
        .route(
            "/applications",
            get(applications::list_applications).post(applications::create_application),
        )
        .route(
            "/suggestions",
            get(suggestions::list_suggestions).post(suggestions::create_suggestion),
        )
        .route("/suggestions/stream", get(sse::suggestions_sse))
        .route("/suggestions/:id/vote", post(suggestions::vote_suggestion))
        .route(
            "/convert/pdf-to-word",
            post(convert::pdf_to_word).layer(upload_limit),
        )
        .layer(Extension(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::mirror_request())
                .allow_credentials(true)
                .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE, ACCEPT]),
        )
        .fallback(handler_404)
}

async fn health() -> impl IntoResponse {
    axum::Json(json!({ "status": "ok" }))
}

async fn handler_404() -> ApiError {
    ApiError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    // Every request below fails validation before any query runs, so the
    // pool never has to reach a server.
    fn test_app() -> Router {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://postgres@127.0.0.1:1/unused".to_string()),
            "MAX_UPLOAD_BYTES" => Some("1024".to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        build_router(AppState::new(pool, &config))
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = test_app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn post_empty(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload(file_name: &str, content: &[u8]) -> Request<Body> {
        let disposition = format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n"
        );
        let mut body = Vec::new();
        body.extend_from_slice(b"--BOUNDARY\r\n");
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n--BOUNDARY--\r\n");

        Request::builder()
            .method("POST")
            .uri("/convert/pdf-to-word")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }

    #[tokio::test]
    async fn test_vote_rejects_unknown_type() {
        let request = post_empty("/suggestions/1/vote?vote_type=sideways&user_id=abc");
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid vote type");
    }

    #[tokio::test]
    async fn test_vote_requires_user() {
        let (status, body) = send(post_empty("/suggestions/1/vote?vote_type=up")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");
    }

    #[tokio::test]
    async fn test_vote_rejects_non_numeric_id() {
        let request = post_empty("/suggestions/abc/vote?vote_type=up&user_id=u");
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");
        let details = body["details"].as_str().unwrap();
        assert!(details.starts_with("Invalid request:"));
    }

    #[tokio::test]
    async fn test_malformed_json_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/suggestions")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{\"text\": "))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");
    }

    #[tokio::test]
    async fn test_json_body_without_content_type() {
        let request = Request::builder()
            .method("POST")
            .uri("/suggestions")
            .body(Body::from(r#"{"text":"Dark mode"}"#))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");
    }

    #[tokio::test]
    async fn test_blank_suggestion() {
        let (status, body) = send(post_json("/suggestions", json!({ "text": "  \n " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"], "Invalid request: text must not be empty");
    }

    #[tokio::test]
    async fn test_negative_paging() {
        let request = Request::builder()
            .uri("/suggestions?skip=-5")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_numeric_paging() {
        let request = Request::builder()
            .uri("/applications?limit=ten")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");
    }

    #[tokio::test]
    async fn test_application_without_name() {
        let payload = json!({ "name": "", "category": "Utility", "icon": "x", "url": "#" });
        let (status, _) = send(post_json("/applications", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_convert_rejects_non_pdf() {
        let (status, body) = send(upload("notes.txt", b"just some text")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["details"],
            "Invalid request: uploaded file is not a PDF"
        );
    }

    #[tokio::test]
    async fn test_convert_enforces_upload_limit() {
        let mut content = b"%PDF-1.4\n".to_vec();
        content.resize(4096, b'0');
        let (status, _) = send(upload("big.pdf", &content)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
