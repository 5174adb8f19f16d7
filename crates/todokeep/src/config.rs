//! Runtime configuration.
//!
//! Values come from `TODO_*` environment variables. An empty variable is
//! treated the same as an unset one.

use std::fmt;
use std::path::PathBuf;

use crate::error::{Result, TodoError};
use crate::token::MIN_SECRET_LEN;

pub const ENV_JWT_SECRET: &str = "TODO_JWT_SECRET";
pub const ENV_USER: &str = "TODO_USER";
pub const ENV_PASSWORD: &str = "TODO_PASSWORD";
pub const ENV_DATA_FILE: &str = "TODO_DATA_FILE";
pub const ENV_TOKEN_TTL_SECONDS: &str = "TODO_TOKEN_TTL_SECONDS";

/// Eight hours.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 8 * 60 * 60;
const DEFAULT_USER: &str = "admin";
const DEFAULT_PASSWORD: &str = "admin";
const DEFAULT_DATA_FILE: &str = "./data.json";

/// Settings shared by the token service, auth gate and record store.
#[derive(Clone)]
pub struct Config {
    /// HMAC secret for tokens. Must be at least 16 bytes to be usable.
    pub jwt_secret: String,
    /// Username accepted by `AuthGate::login`.
    pub user: String,
    /// Password accepted by `AuthGate::login`.
    pub password: String,
    /// Location of the state document.
    pub data_file: PathBuf,
    /// Lifetime of issued tokens.
    pub token_ttl_seconds: i64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"<redacted>")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("data_file", &self.data_file)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `TodoError::Config` if the TTL is not a positive integer.
    /// A missing or short secret is reported by [`Config::validate`], not
    /// here, so that commands which never touch tokens still run.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let token_ttl_seconds = match get(ENV_TOKEN_TTL_SECONDS) {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|ttl| *ttl > 0)
                .ok_or_else(|| {
                    TodoError::Config(format!(
                        "{ENV_TOKEN_TTL_SECONDS} must be a positive integer, got {raw:?}"
                    ))
                })?,
            None => DEFAULT_TOKEN_TTL_SECONDS,
        };

        Ok(Self {
            jwt_secret: get(ENV_JWT_SECRET).unwrap_or_default(),
            user: get(ENV_USER).unwrap_or_else(|| DEFAULT_USER.to_string()),
            password: get(ENV_PASSWORD).unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
            data_file: PathBuf::from(
                get(ENV_DATA_FILE).unwrap_or_else(|| DEFAULT_DATA_FILE.to_string()),
            ),
            token_ttl_seconds,
        })
    }

    /// Check that the secret is usable for signing and verification.
    ///
    /// # Errors
    ///
    /// Returns `TodoError::Config` naming the variable to fix.
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(TodoError::Config(format!(
                "{ENV_JWT_SECRET} must be set (>= {MIN_SECRET_LEN} chars)"
            )));
        }
        Ok(())
    }
}
