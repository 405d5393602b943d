//! Webhook endpoint handlers.
//!
//! The Jira event handler is stateless: it authenticates the request,
//! projects a few fields out of the body, logs a summary and responds.
//! Nothing is stored or forwarded.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::CheckOrder;
use crate::error::WebhookError;
use crate::event::ParsedEvent;
use crate::web::signature::{verify_signature, SIGNATURE_HEADER, SIGNATURE_PREFIX};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Jira Webhook
// =============================================================================

/// Path parameters of the Jira event route.
#[derive(Debug, Deserialize)]
pub struct IssuePath {
    #[serde(rename = "projectId")]
    pub project_id: String,
    #[serde(rename = "issueId")]
    pub issue_id: String,
}

/// Webhook response.
#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

impl WebhookResponse {
    fn new(status: &'static str) -> Json<Self> {
        Json(Self { status })
    }
}

/// Jira issue event endpoint.
///
/// This endpoint:
/// 1. Verifies the `X-Hub-Signature` header against the raw body (401)
/// 2. Parses the body as JSON (400)
/// 3. Logs a summary line and one line per changelog item
/// 4. Returns 200 OK
///
/// Steps 1 and 2 swap when the configured [`CheckOrder`] is `ParseFirst`.
pub async fn jira_event(
    State(state): State<AppState>,
    Path(path): Path<IssuePath>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    info!(
        project_id = %path.project_id,
        issue_id = %path.issue_id,
        body_length = body.len(),
        has_signature = signature.is_some(),
        "jira_event_received"
    );

    match authenticate_and_parse(&state.config, signature, &body) {
        Ok(event) => {
            log_event(&event, &path);
            (StatusCode::OK, WebhookResponse::new("processed"))
        }
        Err(e) => (e.status(), WebhookResponse::new(e.status_label())),
    }
}

/// Run the signature and JSON checks in the configured order.
pub fn authenticate_and_parse(
    config: &Config,
    signature: Option<&str>,
    body: &[u8],
) -> Result<ParsedEvent, WebhookError> {
    match config.check_order {
        CheckOrder::SignatureFirst => {
            authenticate(config, signature, body)?;
            parse(body)
        }
        CheckOrder::ParseFirst => {
            let event = parse(body)?;
            authenticate(config, signature, body)?;
            Ok(event)
        }
    }
}

fn authenticate(config: &Config, signature: Option<&str>, body: &[u8]) -> Result<(), WebhookError> {
    if verify_signature(config.webhook_secret.as_bytes(), body, signature) {
        return Ok(());
    }

    warn!(
        has_signature = signature.is_some_and(|s| !s.is_empty()),
        signature_length = signature.map(str::len).unwrap_or(0),
        has_prefix = signature.is_some_and(|s| s.starts_with(SIGNATURE_PREFIX)),
        check_order = %config.check_order,
        "jira_signature_invalid"
    );
    Err(WebhookError::AuthenticationFailure)
}

fn parse(body: &[u8]) -> Result<ParsedEvent, WebhookError> {
    ParsedEvent::parse(body).map_err(|e| {
        warn!(
            error = %e,
            body_length = body.len(),
            "jira_payload_malformed"
        );
        WebhookError::MalformedPayload
    })
}

fn log_event(event: &ParsedEvent, path: &IssuePath) {
    info!(
        webhook_event = event.webhook_event.as_deref().unwrap_or_default(),
        issue_key = event.issue_key.as_deref().unwrap_or_default(),
        project_key = event.project_key.as_deref().unwrap_or_default(),
        project_id = %path.project_id,
        issue_id = %path.issue_id,
        change_count = event.changes.len(),
        summary = %event.summary_line(&path.project_id, &path.issue_id),
        "jira_issue_event"
    );

    for change in &event.changes {
        info!(
            field_id = change.field_id.as_deref().unwrap_or_default(),
            issue_id = %path.issue_id,
            change = %change.change_line(),
            "jira_issue_change"
        );
    }
}
