//! # lattice-auth
//!
//! Authentication primitives shared by the lattice services:
//!
//! - RS256 JWT encoding and validation with typed claims
//! - Argon2id password hashing (also used for API key material)
//! - RFC 6238 TOTP generation/validation and single-use backup codes

pub mod claims;
pub mod error;
pub mod jwt;
pub mod password;
pub mod totp;

pub use claims::{AccessClaims, AccessClaimsBuilder};
pub use error::AuthError;
pub use jwt::{decode_token, encode_token, ValidationConfig};
pub use password::{hash_password, verify_password, PasswordHasher};
