//! SSRF predicate acceptance vectors.
//!
//! Delivery against a live endpoint is covered by integration tests; the
//! predicate itself is pure and locked down here.

use lattice_webhooks::{validate_url, WebhookError};

/// Every URL in the reject set must be refused.
#[test]
fn test_reject_vectors() {
    let rejected = [
        "http://localhost/x",
        "http://127.0.0.1/",
        "http://10.0.0.1/",
        "http://192.168.1.1/",
        "http://172.20.0.1/",
        "http://169.254.169.254/meta",
        "http://example.com:22/",
        "ftp://example.com/",
    ];

    for url in rejected {
        assert!(validate_url(url).is_err(), "{url} must be rejected");
    }
}

/// Every URL in the accept set must pass.
#[test]
fn test_accept_vectors() {
    let accepted = ["https://api.example.com/hook", "http://example.com:8080/h"];

    for url in accepted {
        assert!(validate_url(url).is_ok(), "{url} must be accepted");
    }
}

/// A blocked destination is classified as SSRF, not a parse failure.
#[test]
fn test_metadata_endpoint_is_ssrf_classified() {
    let result = validate_url("http://169.254.169.254/latest/meta-data/");
    assert!(matches!(result, Err(WebhookError::SsrfDetected(_))));
}

/// A bad scheme is a structural rejection, not SSRF.
#[test]
fn test_scheme_rejection_is_invalid_url() {
    let result = validate_url("ftp://example.com/");
    assert!(matches!(result, Err(WebhookError::InvalidUrl(_))));
}

/// The predicate is textual: it never resolves DNS, so a hostname aliased
/// to a private address passes. This limitation is intentional and must not
/// be changed without updating this test.
#[test]
fn test_dns_aliasing_limitation_is_preserved() {
    assert!(validate_url("https://looks-public.example.com/hook").is_ok());
}
