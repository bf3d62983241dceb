//! Application configuration loaded from environment variables.
//!
//! Fail-fast: required variables must be present and valid or the process
//! exits with a clear error. The loaded [`Config`] is a plain value passed
//! explicitly to whatever needs it — no process-wide mutable state.

use std::env;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use lattice_webhooks::WebhookSecretMode;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: &'static str, message: String },

    #[error("Failed to read {path}: {message}")]
    Unreadable { path: String, message: String },
}

/// Application environment mode.
///
/// - `Development`: insecure conveniences (mock secrets, plaintext
///   transport) are allowed with WARN-level logging.
/// - `Production`: they refuse startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

impl AppEnvironment {
    /// Parse from the `APP_ENV` environment variable value.
    /// Defaults to `Development` if unset or unrecognized.
    fn from_env_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => {
                tracing::warn!(
                    value = other,
                    "Unrecognized APP_ENV value, defaulting to Development"
                );
                Self::Development
            }
        }
    }

    /// Returns true if this is production mode.
    #[must_use]
    pub fn is_production(&self) -> bool {
        *self == Self::Production
    }
}

impl std::fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Paths to the transport certificate material, when configured.
#[derive(Debug, Clone)]
pub struct TlsMaterial {
    pub cert_path: String,
    pub key_path: String,
    pub root_path: String,
}

/// Fully loaded application configuration.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub app_env: AppEnvironment,
    pub rust_log: String,

    pub database_url: String,
    pub redis_url: String,
    pub run_migrations: bool,

    pub jwt_issuer: String,
    /// PEM bytes of the issuer signing key.
    pub jwt_private_key: Vec<u8>,
    /// PEM bytes of the issuer public key.
    pub jwt_public_key: Vec<u8>,

    /// Tenant that first-sight federated users are created under.
    pub default_tenant_id: Uuid,

    pub webhook_secret_mode: WebhookSecretMode,

    /// Present when all three transport material paths are configured.
    pub tls: Option<TlsMaterial>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("app_env", &self.app_env)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_private_key", &"<redacted>")
            .field("jwt_public_key", &"<redacted>")
            .field("default_tenant_id", &self.default_tenant_id)
            .field("webhook_secret_mode", &self.webhook_secret_mode)
            .field("tls", &self.tls.is_some())
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on any missing or invalid required value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_env = AppEnvironment::from_env_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                var: "PORT",
                message: format!("{e}"),
            })?;

        let default_tenant_id: Uuid = required("DEFAULT_TENANT_ID")?
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                var: "DEFAULT_TENANT_ID",
                message: format!("{e}"),
            })?;

        let webhook_secret_mode = match env::var("WEBHOOK_SECRET_MODE")
            .unwrap_or_else(|_| "random".to_string())
            .as_str()
        {
            "random" => WebhookSecretMode::Random,
            "mock" => {
                if app_env.is_production() {
                    return Err(ConfigError::InvalidValue {
                        var: "WEBHOOK_SECRET_MODE",
                        message: "mock secrets are not permitted in production".to_string(),
                    });
                }
                WebhookSecretMode::MockDeterministic
            }
            other => {
                return Err(ConfigError::InvalidValue {
                    var: "WEBHOOK_SECRET_MODE",
                    message: format!("unknown mode '{other}'"),
                });
            }
        };

        let jwt_private_key = read_pem(&required("JWT_PRIVATE_KEY_PATH")?)?;
        let jwt_public_key = read_pem(&required("JWT_PUBLIC_KEY_PATH")?)?;

        let tls = match (
            env::var("TLS_CERT_PATH").ok(),
            env::var("TLS_KEY_PATH").ok(),
            env::var("TLS_ROOT_CA_PATH").ok(),
        ) {
            (Some(cert_path), Some(key_path), Some(root_path)) => Some(TlsMaterial {
                cert_path,
                key_path,
                root_path,
            }),
            _ => None,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            app_env,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            run_migrations: env::var("RUN_MIGRATIONS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(true),
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "lattice".to_string()),
            jwt_private_key,
            jwt_public_key,
            default_tenant_id,
            webhook_secret_mode,
            tls,
        })
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn read_pem(path: &str) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(Path::new(path)).map_err(|e| ConfigError::Unreadable {
        path: path.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_env_parsing() {
        assert!(AppEnvironment::from_env_str("production").is_production());
        assert!(AppEnvironment::from_env_str("prod").is_production());
        assert!(!AppEnvironment::from_env_str("development").is_production());
        assert!(!AppEnvironment::from_env_str("anything-else").is_production());
    }

    #[test]
    fn test_app_env_display() {
        assert_eq!(AppEnvironment::Production.to_string(), "production");
        assert_eq!(AppEnvironment::Development.to_string(), "development");
    }
}
