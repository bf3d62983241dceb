//! Password hashing with Argon2id.
//!
//! Memory-hard hashing used for both user passwords and API key material:
//! 64 MiB memory, 3 passes, parallelism 4, 32-byte output, 16-byte random
//! salt per hash. The PHC-encoded output embeds algorithm, parameters, and
//! salt so verification is self-describing.

use crate::error::AuthError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Password hasher configuration.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    /// Create a new password hasher with the platform parameters.
    ///
    /// Parameters:
    /// - Memory: 65536 KiB (64 MiB)
    /// - Iterations: 3
    /// - Parallelism: 4
    /// - Output: 32 bytes
    #[must_use]
    pub fn new() -> Self {
        // Hardcoded constants that are always valid; failure would indicate a
        // bug in the argon2 crate, not a runtime condition.
        let params = Params::new(
            65536, // m_cost: memory in KiB
            3,     // t_cost: iterations
            4,     // p_cost: parallelism
            Some(32),
        )
        .expect("platform Argon2 parameters are valid constants");

        Self { params }
    }

    /// Create a password hasher with custom parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid.
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, parallelism, Some(32))
            .map_err(|e| AuthError::HashingFailed(format!("Invalid parameters: {e}")))?;

        Ok(Self { params })
    }

    /// Hash a password using Argon2id with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::HashingFailed` if hashing fails.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingFailed(format!("Hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a PHC-encoded hash.
    ///
    /// Returns `false` for a non-matching password AND for malformed input;
    /// this function never panics or errors on attacker-controlled bytes.
    #[must_use]
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash a password with the platform parameters.
///
/// Convenience function using the default [`PasswordHasher`].
///
/// # Example
///
/// ```rust
/// use lattice_auth::hash_password;
///
/// let hash = hash_password("my-secure-password").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    PasswordHasher::new().hash(password)
}

/// Verify a password against an Argon2id hash.
///
/// Convenience function using the default [`PasswordHasher`]. Malformed
/// hashes verify as `false`.
///
/// # Example
///
/// ```rust
/// use lattice_auth::{hash_password, verify_password};
///
/// let hash = hash_password("my-password").unwrap();
/// assert!(verify_password("my-password", &hash));
/// assert!(!verify_password("wrong-password", &hash));
/// ```
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHasher::new().verify(password, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The platform parameters make each hash deliberately slow; tests that
    // only exercise plumbing use a cheap hasher instead.
    fn fast() -> PasswordHasher {
        PasswordHasher::with_params(4096, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_is_phc_argon2id() {
        let hash = fast().hash("test-password").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
    }

    #[test]
    fn test_platform_params_in_encoded_hash() {
        let hash = hash_password("p").unwrap();
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_verify_correct_password() {
        let hasher = fast();
        let hash = hasher.hash("correct-password").unwrap();
        assert!(hasher.verify("correct-password", &hash));
    }

    #[test]
    fn test_verify_incorrect_password() {
        let hasher = fast();
        let hash = hasher.hash("correct-password").unwrap();
        assert!(!hasher.verify("wrong-password", &hash));
    }

    #[test]
    fn test_verify_malformed_hash_is_false_not_error() {
        let hasher = fast();
        assert!(!hasher.verify("password", "not-a-valid-hash"));
        assert!(!hasher.verify("password", ""));
        assert!(!hasher.verify("password", "$argon2id$garbage"));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = fast();
        let hash1 = hasher.hash("same-password").unwrap();
        let hash2 = hasher.hash("same-password").unwrap();

        // Same password, different salts, different hashes
        assert_ne!(hash1, hash2);
        assert!(hasher.verify("same-password", &hash1));
        assert!(hasher.verify("same-password", &hash2));
    }

    #[test]
    fn test_empty_password() {
        let hasher = fast();
        let hash = hasher.hash("").unwrap();
        assert!(hasher.verify("", &hash));
        assert!(!hasher.verify("non-empty", &hash));
    }

    #[test]
    fn test_unicode_password() {
        let hasher = fast();
        let password = "пароль日本語🔐";
        let hash = hasher.hash(password).unwrap();

        assert!(hasher.verify(password, &hash));
        assert!(!hasher.verify("wrong", &hash));
    }

    #[test]
    fn test_api_key_material_hashes_like_passwords() {
        let hasher = fast();
        let key = "sk_0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
        let hash = hasher.hash(key).unwrap();
        assert!(hasher.verify(key, &hash));
    }
}
