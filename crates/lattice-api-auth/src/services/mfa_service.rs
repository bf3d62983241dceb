//! TOTP enrollment, verification, disablement, and backup-code lifecycle.
//!
//! Enrollment writes the secret and the hashed backup codes in one
//! transaction and returns the plaintext codes exactly once. Disabling
//! re-verifies the caller's password before destroying the secret and every
//! backup code.

use lattice_auth::{totp, PasswordHasher};
use sqlx::PgPool;
use uuid::Uuid;

use lattice_db::models::{BackupCode, User};

use crate::error::ApiAuthError;

/// Number of backup codes issued per enrollment.
const BACKUP_CODE_COUNT: usize = 10;

/// TOTP validation window for standalone verification.
const TOTP_WINDOW: u8 = 1;

/// Result of a TOTP enrollment: secrets the caller sees exactly once.
#[derive(Debug)]
pub struct TotpEnrollment {
    /// Base32-encoded shared secret.
    pub secret: String,
    /// `otpauth://totp/...` provisioning URI for authenticator apps.
    pub provisioning_uri: String,
    /// Plaintext backup codes; only hashes are stored.
    pub backup_codes: Vec<String>,
}

/// Service for the TOTP second factor.
#[derive(Clone)]
pub struct MfaService {
    pool: PgPool,
    hasher: PasswordHasher,
    issuer: String,
}

impl MfaService {
    /// Create a new MFA service. `issuer` labels provisioning URIs.
    #[must_use]
    pub fn new(pool: PgPool, issuer: String) -> Self {
        Self {
            pool,
            hasher: PasswordHasher::new(),
            issuer,
        }
    }

    /// Enroll a user in TOTP.
    ///
    /// Generates a fresh 160-bit secret and ten backup codes; the secret
    /// write and the hashed-code inserts commit together.
    pub async fn enroll(&self, user_id: Uuid) -> Result<TotpEnrollment, ApiAuthError> {
        let mut tx = self.pool.begin().await?;

        let user = User::find_by_id(&mut *tx, user_id)
            .await?
            .ok_or_else(|| ApiAuthError::NotFound("User".to_string()))?;

        let secret = totp::generate_secret();
        let provisioning_uri = totp::provisioning_uri(&secret, &user.email, &self.issuer)
            .map_err(|e| ApiAuthError::Internal(format!("Provisioning URI failed: {e}")))?;

        let backup_codes = totp::generate_backup_codes(BACKUP_CODE_COUNT);
        let code_hashes: Vec<String> = backup_codes
            .iter()
            .map(|c| totp::hash_backup_code(c))
            .collect();

        User::set_totp_secret(&mut *tx, user_id, &secret).await?;
        // Replace any leftover codes from a prior enrollment.
        BackupCode::delete_for_user(&mut *tx, user_id).await?;
        BackupCode::insert_many(&mut *tx, user_id, &code_hashes).await?;

        tx.commit().await?;

        tracing::info!(user_id = %user_id, "TOTP enrolled");

        Ok(TotpEnrollment {
            secret,
            provisioning_uri,
            backup_codes,
        })
    }

    /// Verify a TOTP code against the user's enrolled secret.
    pub async fn verify(&self, user_id: Uuid, code: &str) -> Result<bool, ApiAuthError> {
        let user = User::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| ApiAuthError::NotFound("User".to_string()))?;

        let Some(secret) = &user.totp_secret else {
            return Err(ApiAuthError::TotpNotEnrolled);
        };

        Ok(totp::validate(secret, code, TOTP_WINDOW))
    }

    /// Disable TOTP after re-verifying the caller's password.
    ///
    /// Destroys the secret and every backup code in one transaction.
    pub async fn disable(&self, user_id: Uuid, password: &str) -> Result<(), ApiAuthError> {
        let mut tx = self.pool.begin().await?;

        let user = User::find_by_id(&mut *tx, user_id)
            .await?
            .ok_or_else(|| ApiAuthError::NotFound("User".to_string()))?;

        let Some(hash) = &user.password_hash else {
            // A federated-only account has no password to re-verify with.
            return Err(ApiAuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, hash) {
            return Err(ApiAuthError::InvalidCredentials);
        }

        User::clear_totp_secret(&mut *tx, user_id).await?;
        BackupCode::delete_for_user(&mut *tx, user_id).await?;

        tx.commit().await?;

        tracing::info!(user_id = %user_id, "TOTP disabled");
        Ok(())
    }

    /// Replace every backup code for a user in one transaction.
    ///
    /// Returns the new plaintext codes exactly once.
    pub async fn regenerate_backup_codes(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<String>, ApiAuthError> {
        let mut tx = self.pool.begin().await?;

        let user = User::find_by_id(&mut *tx, user_id)
            .await?
            .ok_or_else(|| ApiAuthError::NotFound("User".to_string()))?;

        if user.totp_secret.is_none() {
            return Err(ApiAuthError::TotpNotEnrolled);
        }

        let backup_codes = totp::generate_backup_codes(BACKUP_CODE_COUNT);
        let code_hashes: Vec<String> = backup_codes
            .iter()
            .map(|c| totp::hash_backup_code(c))
            .collect();

        BackupCode::delete_for_user(&mut *tx, user_id).await?;
        BackupCode::insert_many(&mut *tx, user_id, &code_hashes).await?;

        tx.commit().await?;

        tracing::info!(user_id = %user_id, "Backup codes regenerated");
        Ok(backup_codes)
    }
}
