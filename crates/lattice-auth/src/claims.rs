//! Access-token claims with standard and lattice-specific fields.
//!
//! Provides the [`AccessClaims`] struct containing the RFC 7519 standard
//! claims plus the custom claims the platform relies on (`tenant_id`,
//! `email`, `roles`).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use lattice_core::TenantId;

/// Claims carried by a lattice access token.
///
/// # Standard Claims (RFC 7519)
///
/// - `sub`: Subject (the user ID)
/// - `iss`: Issuer
/// - `exp`: Expiration time (Unix timestamp)
/// - `iat`: Issued at (Unix timestamp)
/// - `jti`: Token ID — 128-bit hex, keyed into the blacklist on revocation
///
/// # Custom Claims
///
/// - `tenant_id`: Tenant for multi-tenant isolation
/// - `email`: User email
/// - `roles`: Role list, possibly empty
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    /// Subject - the user ID.
    pub sub: String,

    /// Issuer - who created the token.
    pub iss: String,

    /// Expiration time as Unix timestamp.
    pub exp: i64,

    /// Issued at as Unix timestamp.
    pub iat: i64,

    /// Token ID - unique identifier for this token.
    pub jti: String,

    /// Tenant ID for multi-tenant isolation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<Uuid>,

    /// User email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// User roles for authorization.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl AccessClaims {
    /// Create a new builder for constructing claims.
    #[must_use]
    pub fn builder() -> AccessClaimsBuilder {
        AccessClaimsBuilder::default()
    }

    /// Check if the token is expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Seconds until natural expiry; zero when already expired.
    #[must_use]
    pub fn remaining_lifetime_secs(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }

    /// Get the tenant ID if present.
    #[must_use]
    pub fn tenant(&self) -> Option<TenantId> {
        self.tenant_id.map(TenantId::from_uuid)
    }

    /// Check if the claims contain a specific role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Builder for constructing access-token claims.
#[derive(Debug, Default)]
pub struct AccessClaimsBuilder {
    sub: Option<String>,
    iss: Option<String>,
    exp: Option<i64>,
    iat: Option<i64>,
    jti: Option<String>,
    tenant_id: Option<Uuid>,
    email: Option<String>,
    roles: Vec<String>,
}

impl AccessClaimsBuilder {
    /// Set the subject (user ID).
    #[must_use]
    pub fn subject(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Set the issuer.
    #[must_use]
    pub fn issuer(mut self, iss: impl Into<String>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Set expiration time as Unix timestamp.
    #[must_use]
    pub fn expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Set expiration time as seconds from now.
    #[must_use]
    pub fn expires_in_secs(mut self, secs: i64) -> Self {
        self.exp = Some(Utc::now().timestamp() + secs);
        self
    }

    /// Set the issued-at time.
    #[must_use]
    pub fn issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Set the token ID.
    #[must_use]
    pub fn token_id(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// Set the tenant ID.
    #[must_use]
    pub fn tenant_id(mut self, tid: TenantId) -> Self {
        self.tenant_id = Some(*tid.as_uuid());
        self
    }

    /// Set the tenant ID from a UUID.
    #[must_use]
    pub fn tenant_uuid(mut self, tid: Uuid) -> Self {
        self.tenant_id = Some(tid);
        self
    }

    /// Set the user's email address.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the roles.
    #[must_use]
    pub fn roles(mut self, roles: Vec<impl Into<String>>) -> Self {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Build the claims.
    ///
    /// # Defaults
    ///
    /// - `iss`: "lattice" if not set
    /// - `exp`: 15 minutes from now if not set
    /// - `iat`: current time if not set
    /// - `jti`: fresh 128-bit hex if not set
    #[must_use]
    pub fn build(self) -> AccessClaims {
        let now = Utc::now().timestamp();

        AccessClaims {
            sub: self.sub.unwrap_or_default(),
            iss: self.iss.unwrap_or_else(|| "lattice".to_string()),
            exp: self.exp.unwrap_or(now + 900),
            iat: self.iat.unwrap_or(now),
            jti: self
                .jti
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
            tenant_id: self.tenant_id,
            email: self.email,
            roles: self.roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let claims = AccessClaims::builder().subject("user-123").build();

        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.iss, "lattice");
        assert!(claims.roles.is_empty());
        // Default expiry is 15 minutes out
        let remaining = claims.remaining_lifetime_secs();
        assert!(remaining > 890 && remaining <= 900);
    }

    #[test]
    fn test_default_jti_is_128_bit_hex() {
        let claims = AccessClaims::builder().build();
        assert_eq!(claims.jti.len(), 32);
        assert!(claims.jti.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_jti_unique_per_build() {
        let a = AccessClaims::builder().build();
        let b = AccessClaims::builder().build();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_is_expired() {
        let expired = AccessClaims::builder()
            .expiration(Utc::now().timestamp() - 10)
            .build();
        assert!(expired.is_expired());
        assert_eq!(expired.remaining_lifetime_secs(), 0);

        let live = AccessClaims::builder().expires_in_secs(900).build();
        assert!(!live.is_expired());
    }

    #[test]
    fn test_tenant_round_trip() {
        let tenant = TenantId::new();
        let claims = AccessClaims::builder().tenant_id(tenant).build();
        assert_eq!(claims.tenant(), Some(tenant));
    }

    #[test]
    fn test_has_role() {
        let claims = AccessClaims::builder()
            .roles(vec!["admin", "user"])
            .build();
        assert!(claims.has_role("admin"));
        assert!(!claims.has_role("auditor"));
    }

    #[test]
    fn test_roles_default_on_deserialize() {
        // A token minted without the roles claim deserializes to an empty list.
        let json = r#"{"sub":"u","iss":"lattice","exp":1,"iat":1,"jti":"x"}"#;
        let claims: AccessClaims = serde_json::from_str(json).unwrap();
        assert!(claims.roles.is_empty());
    }
}
