//! HTTP handlers for the auth API. Thin adapters over the services.

pub mod api_keys;
pub mod auth;
pub mod mfa;
pub mod oauth;
pub mod otp;
