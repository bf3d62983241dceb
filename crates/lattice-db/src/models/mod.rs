//! Typed models for the tables owned by the lattice core services.
//!
//! Each model is a `FromRow` struct with inherent async query functions.
//! Functions that must participate in a caller-owned transaction take an
//! `impl PgExecutor` so they can run on either a pool or `&mut *tx`.

pub mod api_key;
pub mod backup_code;
pub mod email_message;
pub mod email_suppression;
pub mod oauth_account;
pub mod user;
pub mod webhook;
pub mod webhook_delivery;

pub use api_key::{ApiKey, CreateApiKey};
pub use backup_code::BackupCode;
pub use email_message::{BounceType, CreateEmail, EmailMessage, EmailStatus};
pub use email_suppression::EmailSuppression;
pub use oauth_account::OauthAccount;
pub use user::User;
pub use webhook::{CreateWebhook, Webhook, WebhookStatus};
pub use webhook_delivery::{CreateWebhookDelivery, WebhookDelivery, WebhookDeliveryStatus};
