//! # lattice-db
//!
//! `PostgreSQL` access layer for the lattice platform: a configurable
//! connection pool wrapper, embedded migrations, and typed models for every
//! table the core services own.
//!
//! All durable state is coordinated through this crate; related statements
//! that must commit together are wrapped in a single transaction obtained
//! from [`DbPool::begin`].

pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;

pub use error::DbError;
pub use migrations::run_migrations;
pub use pool::{DbPool, DbPoolOptions};
