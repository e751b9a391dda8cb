//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development. Signing secrets and
//! token lifetimes are validated here so that nothing downstream can be
//! built from an unusable configuration.

use std::env;
use std::time::Duration;

/// Redis address used when `REDIS_URL` is unset.
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_TIMEOUT_SECS: u64 = 5;
/// Longest accepted token lifetime (about a century).
pub const MAX_TOKEN_LIFETIME_DAYS: i64 = 36_500;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Kakao REST API client ID
    pub kakao_client_id: String,
    /// Redirect URI registered with Kakao
    pub kakao_redirect_uri: String,
    /// Connection string for the user directory (`mysql://...` or `sqlite:...`)
    pub database_url: String,
    /// Token store address
    pub redis_url: String,
    /// Server port
    pub port: u16,
    /// Deadline applied to every directory, token store and Kakao call
    pub external_timeout: Duration,
    /// Reject refresh tokens that are no longer the stored one
    pub strict_refresh_rotation: bool,
    /// Session token signing settings
    pub tokens: TokenSettings,
}

/// Secrets and lifetimes for the access/refresh token pair.
#[derive(Clone)]
pub struct TokenSettings {
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
    access_ttl_days: i64,
    refresh_ttl_days: i64,
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_days", &self.access_ttl_days)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

impl TokenSettings {
    /// Validate and build token settings.
    ///
    /// Secrets must be non-empty and distinct; lifetimes must be positive.
    pub fn new(
        access_secret: impl Into<Vec<u8>>,
        refresh_secret: impl Into<Vec<u8>>,
        access_ttl_days: i64,
        refresh_ttl_days: i64,
    ) -> Result<Self, ConfigError> {
        let access_secret = access_secret.into();
        let refresh_secret = refresh_secret.into();

        if access_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_ACCESS_SECRET"));
        }
        if refresh_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_REFRESH_SECRET"));
        }
        if access_secret == refresh_secret {
            return Err(ConfigError::Invalid {
                var: "JWT_REFRESH_SECRET",
                reason: "must differ from JWT_ACCESS_SECRET".to_string(),
            });
        }
        check_lifetime("JWT_ACCESS_EXP_DATE", access_ttl_days)?;
        check_lifetime("JWT_REFRESH_EXP_DATE", refresh_ttl_days)?;

        Ok(Self {
            access_secret,
            refresh_secret,
            access_ttl_days,
            refresh_ttl_days,
        })
    }

    pub fn access_secret(&self) -> &[u8] {
        &self.access_secret
    }

    pub fn refresh_secret(&self) -> &[u8] {
        &self.refresh_secret
    }

    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.access_ttl_days)
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.refresh_ttl_days)
    }
}

fn check_lifetime(var: &'static str, days: i64) -> Result<(), ConfigError> {
    if !(1..=MAX_TOKEN_LIFETIME_DAYS).contains(&days) {
        return Err(ConfigError::Invalid {
            var,
            reason: format!(
                "lifetime must be between 1 and {} days, got {}",
                MAX_TOKEN_LIFETIME_DAYS, days
            ),
        });
    }
    Ok(())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let days = |name: &'static str| -> Result<i64, ConfigError> {
            let raw = required(name)?;
            raw.parse().map_err(|_| ConfigError::Invalid {
                var: name,
                reason: format!("expected a whole number of days, got {:?}", raw),
            })
        };

        let tokens = TokenSettings::new(
            required("JWT_ACCESS_SECRET")?,
            required("JWT_REFRESH_SECRET")?,
            days("JWT_ACCESS_EXP_DATE")?,
            days("JWT_REFRESH_EXP_DATE")?,
        )?;

        let timeout_secs = match lookup("EXTERNAL_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "EXTERNAL_TIMEOUT_SECS",
                reason: format!("expected seconds, got {:?}", raw),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "EXTERNAL_TIMEOUT_SECS",
                reason: "timeout must be at least one second".to_string(),
            });
        }

        Ok(Self {
            kakao_client_id: required("KAKAO_ID")?,
            kakao_redirect_uri: required("KAKAO_REDIRECT_URI")?,
            database_url: required("DB_URL")?,
            redis_url: lookup("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            external_timeout: Duration::from_secs(timeout_secs),
            strict_refresh_rotation: lookup("STRICT_REFRESH_ROTATION")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
            tokens,
        })
    }

    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            kakao_client_id: "test_client_id".to_string(),
            kakao_redirect_uri: "http://localhost:3000/oauth/kakao".to_string(),
            database_url: "sqlite::memory:".to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            port: 8080,
            external_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            strict_refresh_rotation: false,
            tokens: TokenSettings {
                access_secret: b"test_access_secret_32_bytes_min!".to_vec(),
                refresh_secret: b"test_refresh_secret_32_bytes_mn!".to_vec(),
                access_ttl_days: 1,
                refresh_ttl_days: 14,
            },
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
