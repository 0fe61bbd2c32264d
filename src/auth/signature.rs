//! Webhook signature verification.
//!
//! Proves an inbound payload was produced by the holder of an
//! installation's webhook secret. Pure functions over their inputs; a
//! rejection is never distinguishable by panic or error type, only by
//! the boolean result.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a base64 HMAC-SHA256 signature over the exact raw body bytes.
///
/// Returns `false` on a malformed header, empty secret, or mismatch.
/// The comparison is constant-time (`Mac::verify_slice`), so invalid
/// signatures cannot be probed byte-by-byte through response latency.
#[must_use]
pub fn verify(raw_body: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    if secret.is_empty() {
        return false;
    }

    let Ok(presented) = base64::engine::general_purpose::STANDARD.decode(signature_header.trim())
    else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&presented).is_ok()
}

/// Compute the base64 HMAC-SHA256 signature for a body.
///
/// Counterpart of [`verify`]; used to sign outbound test deliveries and
/// by the test suite to produce valid headers.
#[must_use]
pub fn sign(raw_body: &[u8], secret: &[u8]) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        // HMAC accepts keys of any length; this arm is unreachable but
        // keeps the function total.
        return String::new();
    };
    mac.update(raw_body);
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}
