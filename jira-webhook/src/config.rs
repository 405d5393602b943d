//! Configuration module for environment variable parsing.
//!
//! The handler never reads the environment itself: [`Config`] is loaded once
//! at startup and handed to [`crate::AppState::new`].

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Environment variable holding the shared HMAC secret.
pub const SECRET_ENV: &str = "JIRA_WEBHOOK_SECRET";

/// Environment variable holding the listen port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable selecting the request check order.
pub const CHECK_ORDER_ENV: &str = "JIRA_WEBHOOK_CHECK_ORDER";

/// Environment variable holding the maximum request body size in bytes.
pub const MAX_BODY_SIZE_ENV: &str = "MAX_BODY_SIZE";

const DEFAULT_PORT: u16 = 3000;

/// Jira issue payloads with long descriptions or changelogs exceed axum's
/// 2 MiB default.
const DEFAULT_MAX_BODY_SIZE: usize = 4 * 1024 * 1024;

/// Order in which the Jira event endpoint validates a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckOrder {
    /// Verify the HMAC signature over the raw bytes, then parse the body.
    /// Unauthenticated callers always get 401.
    #[default]
    SignatureFirst,
    /// Parse the body, then verify the signature. A malformed body yields
    /// 400 even when the signature is wrong.
    ParseFirst,
}

impl FromStr for CheckOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signature-first" => Ok(CheckOrder::SignatureFirst),
            "parse-first" => Ok(CheckOrder::ParseFirst),
            _ => Err(ConfigError::InvalidCheckOrder {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for CheckOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOrder::SignatureFirst => f.write_str("signature-first"),
            CheckOrder::ParseFirst => f.write_str("parse-first"),
        }
    }
}

/// Shared webhook secret. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSecret(String);

impl WebhookSecret {
    /// Wrap a secret, rejecting empty or whitespace-only values.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret(SECRET_ENV));
        }
        Ok(Self(secret))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(<redacted>)")
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret used to verify the `X-Hub-Signature` header
    pub webhook_secret: WebhookSecret,

    /// Whether the signature or the JSON body is checked first
    pub check_order: CheckOrder,

    /// Maximum accepted request body size in bytes
    pub max_body_size: usize,
}

impl Config {
    /// Build a configuration with the given secret and default settings.
    pub fn new(webhook_secret: WebhookSecret) -> Self {
        Config {
            port: DEFAULT_PORT,
            webhook_secret,
            check_order: CheckOrder::default(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(SECRET_ENV).ok_or(ConfigError::MissingSecret(SECRET_ENV))?;
        let webhook_secret = WebhookSecret::new(secret)?;

        let port = match lookup(PORT_ENV) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { value: raw })?,
            None => DEFAULT_PORT,
        };

        let check_order = match lookup(CHECK_ORDER_ENV) {
            Some(raw) => raw.parse()?,
            None => CheckOrder::default(),
        };

        let max_body_size = match lookup(MAX_BODY_SIZE_ENV) {
            Some(raw) => {
                let parsed = raw.trim().parse::<usize>();
                match parsed {
                    Ok(size) if size > 0 => size,
                    _ => return Err(ConfigError::InvalidBodySize { value: raw }),
                }
            }
            None => DEFAULT_MAX_BODY_SIZE,
        };

        Ok(Config {
            port,
            webhook_secret,
            check_order,
            max_body_size,
        })
    }
}
