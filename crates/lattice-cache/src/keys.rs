//! Cache key builders and the authoritative TTL table.
//!
//! Every cache-resident structure of the platform is keyed through one of
//! these functions so the key shapes live in exactly one place:
//!
//! | key                         | TTL                                    |
//! |-----------------------------|----------------------------------------|
//! | `refresh:<user-id>`         | 30 days                                |
//! | `blacklist:<jti>`           | remaining access-token lifetime        |
//! | `otp:<email>:<purpose>`     | 600 s                                  |
//! | `otp:rate:<email>`          | 60 s                                   |
//! | `oauth:state:<state>`       | 600 s                                  |
//! | `idempotency:<tenant>:<key>`| 86 400 s                               |
//! | `session:<id>`              | caller-specified                       |

use std::time::Duration;

/// Refresh-token binding TTL: 30 days.
pub const REFRESH_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

/// OTP code TTL: 10 minutes.
pub const OTP_TTL: Duration = Duration::from_secs(600);

/// OTP rate-limit window: 60 seconds.
pub const OTP_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Maximum OTP sends per address per window.
pub const OTP_RATE_MAX: i64 = 3;

/// OAuth state nonce TTL: 10 minutes.
pub const OAUTH_STATE_TTL: Duration = Duration::from_secs(600);

/// Idempotency key TTL: 24 hours.
pub const IDEMPOTENCY_TTL: Duration = Duration::from_secs(86_400);

/// Key for the single refresh-token binding of a user.
#[must_use]
pub fn refresh(user_id: &str) -> String {
    format!("refresh:{user_id}")
}

/// Key for a blacklisted access-token jti.
#[must_use]
pub fn blacklist(jti: &str) -> String {
    format!("blacklist:{jti}")
}

/// Key for a pending OTP code.
#[must_use]
pub fn otp(email: &str, purpose: &str) -> String {
    format!("otp:{email}:{purpose}")
}

/// Key for the OTP send-rate counter of an address.
#[must_use]
pub fn otp_rate(email: &str) -> String {
    format!("otp:rate:{email}")
}

/// Key for an OAuth CSRF state nonce.
#[must_use]
pub fn oauth_state(state: &str) -> String {
    format!("oauth:state:{state}")
}

/// Key for an idempotency claim.
#[must_use]
pub fn idempotency(tenant_id: &str, key: &str) -> String {
    format!("idempotency:{tenant_id}:{key}")
}

/// Key for an opaque session blob.
#[must_use]
pub fn session(id: &str) -> String {
    format!("session:{id}")
}
