//! Jira webhook signature verification.
//!
//! Jira signs webhook requests with HMAC-SHA256 over the raw request body and
//! sends the result in the `X-Hub-Signature` header as `sha256=<hex>`.
//! Reference: https://developer.atlassian.com/server/jira/platform/webhooks/#secure-admin-webhooks

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";

/// Algorithm tag prefixed to the hex digest.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute `sha256=<hex>` for a body, exactly as Jira does.
///
/// Returns `None` only if the key is rejected by the HMAC implementation,
/// which does not happen for HMAC-SHA256.
pub fn compute_signature(secret: &[u8], body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(body);
    Some(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Verify a Jira webhook signature.
///
/// # Arguments
///
/// * `secret` - The shared webhook secret
/// * `body` - The raw request body, exactly as received
/// * `signature` - The `X-Hub-Signature` header value, if present
///
/// # Returns
///
/// `true` if the header equals `sha256=hex(HMAC-SHA256(secret, body))`,
/// `false` otherwise, including when the header is absent or empty.
pub fn verify_signature(secret: &[u8], body: &[u8], signature: Option<&str>) -> bool {
    let signature = match signature {
        Some(s) if !s.is_empty() => s,
        _ => return false,
    };

    if secret.is_empty() {
        return false;
    }

    let expected_signature = match compute_signature(secret, body) {
        Some(s) => s,
        None => return false,
    };

    // Constant-time comparison; differing lengths compare unequal
    expected_signature
        .as_bytes()
        .ct_eq(signature.as_bytes())
        .into()
}
