//! todokeep: signed bearer tokens and per-identity todo storage.
//!
//! Provides a stateless HS256 token service, a crash-safe record store
//! that keeps every identity's todo list in a single JSON document, and a
//! thin auth gate that turns an `Authorization` header into an identity.

pub mod auth;
pub mod config;
pub mod error;
pub mod store;
pub mod time;
pub mod token;

// Re-export primary types
pub use auth::{bearer_token, AuthGate, Credentials, Identity, IssuedToken};
pub use config::Config;
pub use error::{Result, TodoError, ValidationError};
pub use store::{IdGenerator, Record, RecordPatch, RecordStore, SequentialIdGenerator, UuidGenerator};
pub use token::{sign, sign_at, verify, verify_at, Claims, MIN_SECRET_LEN};
