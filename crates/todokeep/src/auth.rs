//! Auth gate: from an `Authorization` header to an identity.
//!
//! The gate owns the token secret and the single configured login. It
//! resolves bearer tokens to an [`Identity`] that the record store uses as
//! its namespace key, and issues tokens for a successful login.

use std::fmt;

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::config::Config;
use crate::error::{Result, TodoError};
use crate::time::now_secs;
use crate::token::{self, Claims, MIN_SECRET_LEN};

type HmacSha256 = Hmac<Sha256>;

/// Extract the credential from a `Bearer` authorization header.
///
/// The scheme is matched case-insensitively and must be followed by
/// whitespace and a non-empty credential.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let header = header?.trim_start();
    let scheme = header.get(..6)?;
    let rest = header.get(6..)?;
    if !scheme.eq_ignore_ascii_case("bearer") || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim()).filter(|t| !t.is_empty())
}

/// A verified, non-empty caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The username/password pair accepted by [`AuthGate::login`].
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A freshly issued bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    /// Unix seconds.
    pub expires_at: i64,
}

/// Verifies bearer tokens and issues them on login.
pub struct AuthGate {
    secret: String,
    credentials: Credentials,
    token_ttl_seconds: i64,
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("credentials", &self.credentials)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl AuthGate {
    /// Create a gate.
    ///
    /// # Errors
    ///
    /// Returns `TodoError::Config` if `secret` is shorter than
    /// [`MIN_SECRET_LEN`] bytes or `token_ttl_seconds` is not positive.
    pub fn new(
        secret: impl Into<String>,
        credentials: Credentials,
        token_ttl_seconds: i64,
    ) -> Result<Self> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(TodoError::Config(format!(
                "token secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if token_ttl_seconds <= 0 {
            return Err(TodoError::Config(format!(
                "token ttl must be positive, got {token_ttl_seconds}"
            )));
        }
        Ok(Self {
            secret,
            credentials,
            token_ttl_seconds,
        })
    }

    /// Create a gate from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.jwt_secret.clone(),
            Credentials::new(config.user.clone(), config.password.clone()),
            config.token_ttl_seconds,
        )
    }

    /// Resolve an `Authorization` header value to an identity.
    ///
    /// # Errors
    ///
    /// `InvalidFormat` if there is no bearer credential, any
    /// token-verification error from [`token::verify`], or `MissingSubject`
    /// if the verified token names no subject.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Identity> {
        let token = bearer_token(authorization).ok_or(TodoError::InvalidFormat)?;
        self.identify(token)
    }

    /// Resolve a raw token to an identity.
    pub fn identify(&self, token: &str) -> Result<Identity> {
        let claims = token::verify(token, &self.secret)?;
        let subject = claims.subject().ok_or(TodoError::MissingSubject)?;
        Ok(Identity(subject.to_string()))
    }

    /// Check `username` / `password` and issue a token for `username`.
    ///
    /// Both fields are always compared, each in constant time.
    ///
    /// # Errors
    ///
    /// Returns `TodoError::InvalidCredentials` on mismatch.
    pub fn login(&self, username: &str, password: &str) -> Result<IssuedToken> {
        self.login_at(username, password, now_secs())
    }

    /// [`login`](Self::login) with an explicit clock reading.
    pub fn login_at(&self, username: &str, password: &str, now: i64) -> Result<IssuedToken> {
        let user_ok = self.same_text(username, &self.credentials.username);
        let password_ok = self.same_text(password, &self.credentials.password);
        if !(user_ok & password_ok) {
            log::debug!("login rejected");
            return Err(TodoError::InvalidCredentials);
        }

        let token = token::sign_at(
            &Claims::for_subject(username),
            &self.secret,
            self.token_ttl_seconds,
            now,
        )?;
        Ok(IssuedToken {
            token,
            expires_at: now + self.token_ttl_seconds,
        })
    }

    /// Compare two strings by their MACs so that timing reveals nothing
    /// about the expected value.
    fn same_text(&self, provided: &str, expected: &str) -> bool {
        let tag = |text: &str| {
            HmacSha256::new_from_slice(self.secret.as_bytes()).map(|mut mac| {
                mac.update(text.as_bytes());
                mac
            })
        };
        match (tag(provided), tag(expected)) {
            (Ok(provided), Ok(expected)) => {
                provided.verify_slice(&expected.finalize().into_bytes()).is_ok()
            }
            _ => false,
        }
    }
}
