//! Tests for refresh-token structure and parsing.
//!
//! The rotation and reuse-detection flows require Redis and Postgres and
//! live in integration tests; the opaque token format is testable here.

use lattice_api_auth::TokenService;
use uuid::Uuid;

/// Tokens are `<user-id>:<256-bit hex>` and round-trip through the parser.
#[test]
fn test_refresh_token_round_trip() {
    let user_id = Uuid::new_v4();
    let token = TokenService::generate_refresh_token(user_id);

    let (parsed, random) = TokenService::parse_refresh_token(&token).expect("well-formed token");
    assert_eq!(parsed, user_id);
    assert_eq!(random.len(), 64);
    assert!(random.chars().all(|c| c.is_ascii_hexdigit()));
}

/// Two tokens for the same user never collide.
#[test]
fn test_refresh_tokens_unique() {
    let user_id = Uuid::new_v4();
    let a = TokenService::generate_refresh_token(user_id);
    let b = TokenService::generate_refresh_token(user_id);
    assert_ne!(a, b);
}

/// A token without the colon separator is rejected.
#[test]
fn test_missing_separator_rejected() {
    assert!(TokenService::parse_refresh_token("deadbeefcafe").is_none());
}

/// The user part must be a UUID.
#[test]
fn test_non_uuid_user_part_rejected() {
    assert!(TokenService::parse_refresh_token("admin:deadbeef").is_none());
}
