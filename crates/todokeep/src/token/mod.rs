//! Stateless HS256 bearer tokens.
//!
//! A token is three dot-separated base64url segments:
//!
//! ```text
//! base64url({"alg":"HS256","typ":"JWT"}) . base64url(claims) . base64url(HMAC-SHA256)
//! ```
//!
//! The signature covers `header_segment + "." + claims_segment` keyed by a
//! shared secret of at least [`MIN_SECRET_LEN`] bytes. Nothing here touches
//! I/O or shared state, so every function is safe to call concurrently.
//!
//! # Modules
//!
//! - [`base64url`]: unpadded URL-safe segment encoding.
//! - [`claims`]: the signed claim set.
//! - [`hs256`]: signing and verification.

pub mod base64url;
pub mod claims;
pub mod hs256;

pub use claims::Claims;
pub use hs256::{sign, sign_at, verify, verify_at, MIN_SECRET_LEN};
