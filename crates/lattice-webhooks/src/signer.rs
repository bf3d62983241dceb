//! HMAC-SHA256 payload authentication for webhook deliveries.
//!
//! The signature covers the payload bytes exactly as they will be POSTed;
//! receivers recompute it from the request body and the shared secret and
//! compare against the `X-Webhook-Signature: sha256=<hex>` header.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the HMAC-SHA256 signature of a payload.
///
/// Returns a 64-character lowercase hex string.
#[must_use]
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");

    mac.update(payload);

    hex::encode(mac.finalize().into_bytes())
}

/// Verify a signature using constant-time comparison after a length check.
#[must_use]
pub fn verify(payload: &[u8], signature: &str, secret: &str) -> bool {
    let computed = sign(payload, secret);
    constant_time_eq(signature.as_bytes(), computed.as_bytes())
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_64_char_lowercase_hex() {
        let sig = sign(b"payload", "secret");
        assert_eq!(sig.len(), 64);
        assert!(sig
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_signature_deterministic() {
        assert_eq!(sign(b"payload", "secret"), sign(b"payload", "secret"));
    }

    #[test]
    fn test_signature_changes_with_secret() {
        assert_ne!(sign(b"payload", "secret1"), sign(b"payload", "secret2"));
    }

    #[test]
    fn test_signature_changes_with_payload() {
        assert_ne!(sign(b"payload1", "secret"), sign(b"payload2", "secret"));
    }

    #[test]
    fn test_known_vector() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        let sig = sign(b"The quick brown fox jumps over the lazy dog", "key");
        assert_eq!(
            sig,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn test_verify_round_trip() {
        let sig = sign(b"body", "s");
        assert!(verify(b"body", &sig, "s"));
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let sig = sign(b"body", "s");
        assert!(!verify(b"tampered", &sig, "s"));
    }

    #[test]
    fn test_verify_rejects_wrong_length() {
        assert!(!verify(b"body", "deadbeef", "s"));
        assert!(!verify(b"body", "", "s"));
    }

    #[test]
    fn test_empty_payload_signs() {
        let sig = sign(b"", "s");
        assert_eq!(sig.len(), 64);
        assert!(verify(b"", &sig, "s"));
    }
}
