//! Request and response DTOs for the auth API.

pub mod requests;
