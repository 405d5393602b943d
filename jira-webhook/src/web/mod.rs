//! Web server module for handling inbound Jira webhooks.
//!
//! This module provides a thin web server that:
//! - Receives Jira issue events
//! - Verifies the HMAC signature
//! - Logs a human-readable summary
//! - Returns a status code

pub mod handlers;
pub mod signature;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    authenticate_and_parse, health, jira_event, AppState, HealthResponse, IssuePath,
    WebhookResponse,
};
pub use signature::{compute_signature, verify_signature, SIGNATURE_HEADER};

/// Route receiving Jira issue events.
pub const JIRA_EVENT_ROUTE: &str =
    "/webhooks/jira/projects/:projectId/issues/:issueId/on-event";

/// Build the application router.
///
/// Request bodies are capped at [`crate::Config::max_body_size`].
pub fn router(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::new()
        .route("/health", get(health))
        .route(JIRA_EVENT_ROUTE, post(jira_event))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::config::{CheckOrder, WebhookSecret};
    use crate::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use tracing_subscriber::fmt::MakeWriter;

    const SECRET: &str = "router-secret";
    const EVENT_URI: &str = "/webhooks/jira/projects/10000/issues/10042/on-event";
    const CREATED: &str = r#"{"webhookEvent":"jira:issue_created","issue":{"key":"PROJ-1","fields":{"project":{"key":"PROJ"}}}}"#;
    const UPDATED: &str = r#"{"webhookEvent":"jira:issue_updated","issue":{"key":"PROJ-1"},"changelog":{"items":[{"fieldId":"status","fromString":"Open","toString":"Done"}]}}"#;

    fn config(check_order: CheckOrder) -> Config {
        let mut config = Config::new(WebhookSecret::new(SECRET).unwrap());
        config.check_order = check_order;
        config
    }

    fn app(check_order: CheckOrder) -> Router {
        router(AppState::new(config(check_order)))
    }

    fn event_request(body: impl Into<String>, signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(EVENT_URI)
            .header("Content-Type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(body.into())).unwrap()
    }

    fn sign(body: &str) -> String {
        compute_signature(SECRET.as_bytes(), body.as_bytes()).unwrap()
    }

    /// A JSON issue payload whose description pads it to `size` bytes or more.
    fn large_issue_body(size: usize) -> String {
        format!(
            r#"{{"webhookEvent":"jira:issue_updated","issue":{{"key":"PROJ-9","fields":{{"description":"{}"}}}}}}"#,
            "a".repeat(size)
        )
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let label = serde_json::from_slice::<serde_json::Value>(&bytes)
            .ok()
            .and_then(|v| v["status"].as_str().map(str::to_string))
            .unwrap_or_default();
        (status, label)
    }

    async fn status_of(body: &str, signature: Option<&str>, order: CheckOrder) -> (StatusCode, String) {
        send(app(order), event_request(body, signature)).await
    }

    /// Log sink shared between the test and a scoped fmt subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Send one request with a thread-local subscriber installed and return
    /// the status together with everything logged while handling it.
    async fn send_capturing_logs(request: Request<Body>) -> (StatusCode, String) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (status, _) = send(app(CheckOrder::SignatureFirst), request).await;
        (status, logs.contents())
    }

    #[tokio::test]
    async fn test_signed_event_returns_ok() {
        let signature = sign(CREATED);
        let (status, label) = status_of(CREATED, Some(&signature), CheckOrder::SignatureFirst).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(label, "processed");
    }

    #[tokio::test]
    async fn test_same_request_twice_same_status() {
        let signature = sign(CREATED);
        let app = app(CheckOrder::SignatureFirst);
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(event_request(CREATED, Some(&signature)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_wrong_signature_returns_unauthorized() {
        let (status, label) =
            status_of(CREATED, Some("sha256=deadbeef"), CheckOrder::SignatureFirst).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(label, "unauthorized");
    }

    #[tokio::test]
    async fn test_missing_signature_returns_unauthorized() {
        let (status, _) = status_of(CREATED, None, CheckOrder::ParseFirst).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_not_json_returns_bad_request() {
        let signature = sign("not json");
        let (status, label) = status_of("not json", Some(&signature), CheckOrder::SignatureFirst).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(label, "malformed_payload");

        let (status, _) = status_of("not json", Some("sha256=deadbeef"), CheckOrder::ParseFirst).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_not_json_unsigned_is_unauthorized_when_signature_first() {
        let (status, _) = status_of("not json", Some("sha256=deadbeef"), CheckOrder::SignatureFirst).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_changelog_event_returns_ok() {
        let signature = sign(UPDATED);
        let (status, _) = status_of(UPDATED, Some(&signature), CheckOrder::SignatureFirst).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_signed_body_above_axum_default_limit_returns_ok() {
        let body = large_issue_body(3 * 1024 * 1024);
        assert!(body.len() > 2 * 1024 * 1024);
        assert!(body.len() < 4 * 1024 * 1024);
        let signature = sign(&body);

        let (status, label) = status_of(&body, Some(&signature), CheckOrder::SignatureFirst).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(label, "processed");
    }

    #[tokio::test]
    async fn test_body_above_configured_limit_is_rejected() {
        let mut config = config(CheckOrder::SignatureFirst);
        config.max_body_size = 1024;
        let body = large_issue_body(2048);
        let signature = sign(&body);

        let (status, _) = send(
            router(AppState::new(config)),
            event_request(body, Some(&signature)),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_created_event_logs_summary() {
        let signature = sign(CREATED);
        let (status, logs) = send_capturing_logs(event_request(CREATED, Some(&signature))).await;

        assert_eq!(status, StatusCode::OK);
        assert!(logs.contains("jira_issue_event"));
        assert!(logs.contains("💡 issue PROJ-1 (10042) in project PROJ (id: 10000)"));
    }

    #[tokio::test]
    async fn test_updated_event_logs_changes() {
        let signature = sign(UPDATED);
        let (status, logs) = send_capturing_logs(event_request(UPDATED, Some(&signature))).await;

        assert_eq!(status, StatusCode::OK);
        assert!(logs.contains("🛠️"));
        assert!(logs.contains("jira_issue_change"));
        assert!(logs.contains("status : Open -> Done"));
    }

    #[tokio::test]
    async fn test_unauthorized_event_logs_no_content() {
        let (status, logs) =
            send_capturing_logs(event_request(UPDATED, Some("sha256=deadbeef"))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(logs.contains("jira_signature_invalid"));
        assert_eq!(logs.matches("jira_signature_invalid").count(), 1);
        assert!(!logs.contains("PROJ-1"));
        assert!(!logs.contains("Open -> Done"));
        assert!(!logs.contains("jira_issue_event"));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(CheckOrder::SignatureFirst)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_on_event_route_not_allowed() {
        let response = app(CheckOrder::SignatureFirst)
            .oneshot(Request::builder().uri(EVENT_URI).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
