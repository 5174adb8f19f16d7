//! Error types for todokeep.
//!
//! Every core operation returns either its result or exactly one of these
//! variants. Secrets and token contents are never included in messages.

use std::fmt;

/// Caller input errors raised by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// The title was missing or blank after trimming.
    TitleRequired,
    /// The record id was empty.
    IdRequired,
}

impl ValidationError {
    /// Stable snake_case code for this validation failure.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::TitleRequired => "title_required",
            ValidationError::IdRequired => "id_required",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error type covering token, auth and storage operations.
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Token is missing or not three non-empty segments")]
    InvalidFormat,

    #[error("Token segment is not valid base64url JSON: {0}")]
    InvalidEncoding(String),

    #[error("Unsupported token algorithm or type")]
    UnsupportedAlgorithm,

    #[error("Token signature verification failed")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token has no subject")]
    MissingSubject,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation failed: {0}")]
    Validation(ValidationError),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl TodoError {
    /// Stable snake_case code a transport layer can expose to clients.
    pub fn code(&self) -> &'static str {
        match self {
            TodoError::Config(_) => "server_misconfigured",
            TodoError::InvalidFormat => "invalid_format",
            TodoError::InvalidEncoding(_) => "invalid_json",
            TodoError::UnsupportedAlgorithm => "unsupported_header",
            TodoError::BadSignature => "bad_signature",
            TodoError::Expired => "expired",
            TodoError::MissingSubject => "missing_sub",
            TodoError::InvalidCredentials => "invalid_credentials",
            TodoError::Validation(v) => v.code(),
            TodoError::NotFound(_) => "not_found",
            TodoError::Storage(_) => "internal_error",
        }
    }

    /// `true` for every failure that should be reported as "unauthenticated".
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            TodoError::InvalidFormat
                | TodoError::InvalidEncoding(_)
                | TodoError::UnsupportedAlgorithm
                | TodoError::BadSignature
                | TodoError::Expired
                | TodoError::MissingSubject
                | TodoError::InvalidCredentials
        )
    }

    /// HTTP-style status code for this error kind.
    pub fn status(&self) -> u16 {
        match self {
            TodoError::Validation(_) => 400,
            TodoError::NotFound(_) => 404,
            TodoError::Config(_) | TodoError::Storage(_) => 500,
            _ => 401,
        }
    }
}

impl From<ValidationError> for TodoError {
    fn from(err: ValidationError) -> Self {
        TodoError::Validation(err)
    }
}

impl From<std::io::Error> for TodoError {
    fn from(err: std::io::Error) -> Self {
        TodoError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for TodoError {
    fn from(err: serde_json::Error) -> Self {
        TodoError::Storage(err.to_string())
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, TodoError>;
