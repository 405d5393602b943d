//! Jira webhook receiver.
//!
//! Authenticates Jira issue events with an HMAC-SHA256 signature, projects a
//! few fields out of the payload and logs a human-readable summary.
//!
//! ## Request Flow
//!
//! ```text
//! POST → signature check → JSON projection → log lines → status code
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod web;

// Re-export commonly used types
pub use config::{CheckOrder, Config, WebhookSecret};
pub use error::{ConfigError, WebhookError};
pub use event::{ChangelogItem, ParsedEvent};
pub use web::{router, AppState};
