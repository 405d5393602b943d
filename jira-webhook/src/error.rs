//! Error types for startup configuration and webhook request handling.
//!
//! [`ConfigError`] is fatal and stops the process before the server binds.
//! [`WebhookError`] is local to a single request and maps to an HTTP status.
//! A missing payload field is not an error at all: it surfaces as `None` on
//! [`crate::event::ParsedEvent`].

use axum::http::StatusCode;
use thiserror::Error;

/// Errors raised while loading [`crate::Config`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The shared webhook secret is absent or blank.
    #[error("{0} not set")]
    MissingSecret(&'static str),

    /// The listen port could not be parsed.
    #[error("invalid port {value:?}: expected an integer between 0 and 65535")]
    InvalidPort { value: String },

    /// The maximum body size is not a positive integer.
    #[error("invalid max body size {value:?}: expected a positive number of bytes")]
    InvalidBodySize { value: String },

    /// The check order is not one of the recognised values.
    #[error("invalid check order {value:?}: expected \"signature-first\" or \"parse-first\"")]
    InvalidCheckOrder { value: String },
}

/// Per-request failures of the Jira event endpoint.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    /// The request body is not valid JSON.
    #[error("request body malformed")]
    MalformedPayload,

    /// The `X-Hub-Signature` header is missing or does not match the body.
    #[error("hmac signature not matching")]
    AuthenticationFailure,
}

impl WebhookError {
    /// HTTP status returned to the caller for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::MalformedPayload => StatusCode::BAD_REQUEST,
            WebhookError::AuthenticationFailure => StatusCode::UNAUTHORIZED,
        }
    }

    /// Short machine-readable status placed in the response body.
    pub fn status_label(&self) -> &'static str {
        match self {
            WebhookError::MalformedPayload => "malformed_payload",
            WebhookError::AuthenticationFailure => "unauthorized",
        }
    }
}
