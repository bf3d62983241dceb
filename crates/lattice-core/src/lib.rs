//! # lattice-core
//!
//! Core types shared by every lattice service crate:
//!
//! - Strongly typed identifiers ([`TenantId`], [`UserId`]) that prevent
//!   accidental cross-use of raw UUIDs at compile time.
//! - The base error type ([`CoreError`]) with the platform-wide status
//!   taxonomy.

pub mod error;
pub mod ids;

pub use error::{CoreError, Result};
pub use ids::{ParseIdError, TenantId, UserId};
