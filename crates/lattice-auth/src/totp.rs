//! RFC 6238 TOTP second factor and single-use backup codes.
//!
//! Secrets are 160 bits from the OS CSPRNG, stored base32-encoded. Codes are
//! six decimal digits over 30-second periods (SHA-1 truncation per RFC 4226);
//! validation accepts a configurable window of adjacent periods to absorb
//! clock skew. Backup codes are `XXXX-XXXX` decimal strings stored only as
//! SHA-256 hex digests.

use crate::error::AuthError;
use data_encoding::BASE32_NOPAD;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use totp_rs::{Algorithm, TOTP};

/// TOTP secret length in bytes (160 bits).
const SECRET_LENGTH: usize = 20;

/// Number of digits in a TOTP code.
const CODE_DIGITS: usize = 6;

/// TOTP period in seconds.
const PERIOD_SECS: u64 = 30;

/// Generate a new TOTP secret, base32-encoded without padding.
///
/// 160 bits encode to exactly 32 base32 characters, so no padding is needed
/// by downstream consumers.
#[must_use]
pub fn generate_secret() -> String {
    let mut secret = [0u8; SECRET_LENGTH];
    OsRng.fill_bytes(&mut secret);
    BASE32_NOPAD.encode(&secret)
}

/// Build the `otpauth://totp/...` provisioning URI for an authenticator app.
///
/// The issuer and account are URL-encoded; the URI pins SHA1, 6 digits, and
/// a 30-second period.
///
/// # Errors
///
/// Returns `AuthError::Totp` if the secret is not valid base32.
pub fn provisioning_uri(secret: &str, email: &str, issuer: &str) -> Result<String, AuthError> {
    Ok(build_totp(secret, 1, Some(issuer), email)?.get_url())
}

/// Validate a TOTP code against a secret.
///
/// Anything that is not exactly six ASCII digits is rejected before any
/// crypto runs. Otherwise the code is accepted if it matches the RFC 4226
/// truncation for any counter in `[now/30 - window, now/30 + window]`.
#[must_use]
pub fn validate(secret: &str, code: &str, window: u8) -> bool {
    if code.len() != CODE_DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let Ok(totp) = build_totp(secret, window, None, "account") else {
        return false;
    };

    totp.check_current(code).unwrap_or(false)
}

/// Generate `count` random backup codes in `XXXX-XXXX` decimal format.
#[must_use]
pub fn generate_backup_codes(count: usize) -> Vec<String> {
    let mut codes = Vec::with_capacity(count);

    for _ in 0..count {
        let mut bytes = [0u8; 4];
        OsRng.fill_bytes(&mut bytes);
        let value = u32::from_be_bytes(bytes);

        codes.push(format!(
            "{:04}-{:04}",
            value % 10_000,
            (value / 10_000) % 10_000
        ));
    }

    codes
}

/// Hash a backup code for storage: SHA-256, lowercase hex.
#[must_use]
pub fn hash_backup_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// Verify a backup code against a stored hash.
#[must_use]
pub fn verify_backup_code(code: &str, hash: &str) -> bool {
    hash_backup_code(code) == hash
}

/// Construct the underlying TOTP instance from a base32 secret.
fn build_totp(
    secret: &str,
    window: u8,
    issuer: Option<&str>,
    account: &str,
) -> Result<TOTP, AuthError> {
    let secret_bytes = BASE32_NOPAD
        .decode(secret.trim_end_matches('=').as_bytes())
        .map_err(|e| AuthError::Totp(format!("Invalid base32 secret: {e}")))?;

    // new_unchecked: enrolled secrets are always 160 bits, but secrets
    // imported from other systems may be shorter than the RFC-recommended
    // minimum and must still validate.
    Ok(TOTP::new_unchecked(
        Algorithm::SHA1,
        CODE_DIGITS,
        window,
        PERIOD_SECS,
        secret_bytes,
        issuer.map(String::from),
        account.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Shared secret from the interoperability examples: "Hello!..." is not it;
    // this is the base32 of the ASCII bytes "Hello!" + 0xDE 0xAD 0xBE 0xEF etc.
    // used widely in authenticator demos.
    const DEMO_SECRET: &str = "JBSWY3DPEHPK3PXP";

    #[test]
    fn test_generate_secret_is_32_chars_base32() {
        let secret = generate_secret();
        assert_eq!(secret.len(), 32);
        assert!(!secret.contains('='));
        assert!(BASE32_NOPAD.decode(secret.as_bytes()).is_ok());
        assert_eq!(BASE32_NOPAD.decode(secret.as_bytes()).unwrap().len(), 20);
    }

    #[test]
    fn test_secrets_are_unique() {
        assert_ne!(generate_secret(), generate_secret());
    }

    #[test]
    fn test_provisioning_uri_shape() {
        let uri = provisioning_uri(DEMO_SECRET, "u@x.io", "Lattice").unwrap();

        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("secret=JBSWY3DPEHPK3PXP"));
        assert!(uri.contains("issuer=Lattice"));
        assert!(uri.contains("algorithm=SHA1"));
        assert!(uri.contains("digits=6"));
        assert!(uri.contains("period=30"));
    }

    #[test]
    fn test_provisioning_uri_rejects_bad_secret() {
        assert!(provisioning_uri("not base32 at all!", "u@x.io", "Lattice").is_err());
    }

    #[test]
    fn test_validate_accepts_current_code() {
        let totp = build_totp(DEMO_SECRET, 1, None, "account").unwrap();
        let code = totp.generate_current().unwrap();

        // Window 1 absorbs a period boundary between generate and check.
        assert!(validate(DEMO_SECRET, &code, 1));
    }

    #[test]
    fn test_validate_rejects_wrong_code() {
        let totp = build_totp(DEMO_SECRET, 1, None, "account").unwrap();
        let code = totp.generate_current().unwrap();
        // Flip one digit
        let wrong: String = code
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if i == 0 {
                    char::from_digit((c.to_digit(10).unwrap() + 1) % 10, 10).unwrap()
                } else {
                    c
                }
            })
            .collect();

        assert!(!validate(DEMO_SECRET, &wrong, 1));
    }

    #[test]
    fn test_validate_rejects_non_six_digit_input() {
        assert!(!validate(DEMO_SECRET, "12345", 1));
        assert!(!validate(DEMO_SECRET, "1234567", 1));
        assert!(!validate(DEMO_SECRET, "12a456", 1));
        assert!(!validate(DEMO_SECRET, "", 1));
        assert!(!validate(DEMO_SECRET, "12345６", 1)); // full-width digit
    }

    #[test]
    fn test_validate_rejects_garbage_secret() {
        assert!(!validate("!!!", "123456", 1));
    }

    #[test]
    fn test_rfc6238_vector() {
        // RFC 6238 appendix B, adapted to 6 digits: secret is the ASCII bytes
        // "12345678901234567890"; at T=59s the expected code is 287082.
        let secret_b32 = BASE32_NOPAD.encode(b"12345678901234567890");
        let totp = build_totp(&secret_b32, 1, None, "account").unwrap();
        assert_eq!(totp.generate(59), "287082");
    }

    #[test]
    fn test_backup_codes_format() {
        let codes = generate_backup_codes(10);
        assert_eq!(codes.len(), 10);

        for code in &codes {
            assert_eq!(code.len(), 9);
            let (left, rest) = code.split_at(4);
            assert!(left.bytes().all(|b| b.is_ascii_digit()));
            assert_eq!(&rest[..1], "-");
            assert!(rest[1..].bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_backup_code_hash_round_trip() {
        let code = "1234-5678";
        let hash = hash_backup_code(code);

        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(verify_backup_code(code, &hash));
        assert!(!verify_backup_code("8765-4321", &hash));
    }

    #[test]
    fn test_backup_code_hash_is_deterministic() {
        assert_eq!(hash_backup_code("0000-0000"), hash_backup_code("0000-0000"));
    }
}
