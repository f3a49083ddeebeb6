//! Webhook signature verification
//!
//! The provider signs the raw request body with HMAC-SHA256 over the shared
//! secret and sends the hex digest in the `ElevenLabs-Signature` header.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a webhook signature against the configured secret.
///
/// An empty secret disables verification. Comparison is constant-time.
pub fn verify_signature(secret: &str, raw_body: &[u8], signature: Option<&str>) -> bool {
    if secret.is_empty() {
        return true;
    }
    let Some(signature) = signature else {
        return false;
    };
    let Ok(digest) = hex::decode(signature.trim()) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(raw_body);
    mac.verify_slice(&digest).is_ok()
}
