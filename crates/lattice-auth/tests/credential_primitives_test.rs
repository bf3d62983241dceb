//! Cross-cutting properties of the credential primitives.

use lattice_auth::totp;
use lattice_auth::PasswordHasher;

/// Every password verifies against its own hash and (overwhelmingly) fails
/// against any other password's hash.
#[test]
fn test_hash_verify_round_trip_and_separation() {
    let hasher = PasswordHasher::with_params(4096, 1, 1).unwrap();

    let passwords = ["p!42", "correct horse battery staple", "密码🔑"];
    let hashes: Vec<String> = passwords.iter().map(|p| hasher.hash(p).unwrap()).collect();

    for (i, password) in passwords.iter().enumerate() {
        for (j, hash) in hashes.iter().enumerate() {
            assert_eq!(hasher.verify(password, hash), i == j);
        }
    }
}

/// Malformed stored hashes fail verification without panicking.
#[test]
fn test_malformed_hash_is_false() {
    let hasher = PasswordHasher::new();
    for garbage in ["", "x", "$argon2id$", "$2b$12$legacybcrypthash"] {
        assert!(!hasher.verify("password", garbage));
    }
}

/// A backup code verifies once against its stored hash, and distinct codes
/// do not cross-verify.
#[test]
fn test_backup_code_hashing() {
    let codes = totp::generate_backup_codes(10);
    let hashes: Vec<String> = codes.iter().map(|c| totp::hash_backup_code(c)).collect();

    for (i, code) in codes.iter().enumerate() {
        for (j, hash) in hashes.iter().enumerate() {
            assert_eq!(totp::verify_backup_code(code, hash), i == j);
        }
    }
}

/// Provisioning URIs carry the parameters authenticator apps expect.
#[test]
fn test_provisioning_uri_parameters() {
    let secret = totp::generate_secret();
    let uri = totp::provisioning_uri(&secret, "person@example.com", "Lattice").unwrap();

    assert!(uri.starts_with("otpauth://totp/"));
    for param in ["algorithm=SHA1", "digits=6", "period=30", "issuer=Lattice"] {
        assert!(uri.contains(param), "missing {param} in {uri}");
    }
    assert!(uri.contains(&format!("secret={secret}")));
}

/// Codes that are not exactly six ASCII digits are rejected before any
/// crypto runs.
#[test]
fn test_totp_input_hygiene() {
    let secret = totp::generate_secret();
    for bad in ["", "1", "12345", "1234567", "12 456", "abcdef", "１２３４５６"] {
        assert!(!totp::validate(&secret, bad, 1), "{bad:?} must be rejected");
    }
}
