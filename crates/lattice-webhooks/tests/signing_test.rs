//! Payload signing contract.
//!
//! Receivers verify `X-Webhook-Signature: sha256=<hex>` by recomputing
//! HMAC-SHA256 over the request body with the shared secret; these tests pin
//! both sides of that contract.

use lattice_webhooks::signer;

#[test]
fn test_header_value_shape() {
    let signature = signer::sign(br#"{"event":"user.created"}"#, "whsec_test");
    let header_value = format!("sha256={signature}");

    assert!(header_value.starts_with("sha256="));
    assert_eq!(header_value.len(), "sha256=".len() + 64);
}

#[test]
fn test_receiver_can_verify_sender_signature() {
    let payload = br#"{"event":"invoice.paid","amount":125}"#;
    let secret = "whsec_shared";

    let signature = signer::sign(payload, secret);
    assert!(signer::verify(payload, &signature, secret));
}

#[test]
fn test_verification_fails_across_secrets() {
    let payload = b"payload";
    let signature = signer::sign(payload, "secret-a");
    assert!(!signer::verify(payload, &signature, "secret-b"));
}

#[test]
fn test_signature_binds_to_exact_payload_bytes() {
    let signature = signer::sign(b"{\"a\":1}", "s");
    // Whitespace changes the bytes, so the signature no longer verifies.
    assert!(!signer::verify(b"{\"a\": 1}", &signature, "s"));
}
