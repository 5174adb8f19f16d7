//! HMAC-SHA256 token signing and verification.
//!
//! Verification checks, in order: segment shape, segment encoding, header
//! algorithm, signature, expiry. The signature is compared with
//! [`Mac::verify_slice`], which runs in constant time regardless of where
//! the first differing byte is.

use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;

use crate::error::{Result, TodoError};
use crate::time::now_secs;

use super::base64url;
use super::claims::Claims;

type HmacSha256 = Hmac<Sha256>;

/// Shortest secret accepted for signing or verification, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

/// Fixed token header. Field order is the canonical serialized order.
#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: Header = Header {
    alg: ALGORITHM,
    typ: TOKEN_TYPE,
};

/// Sign `claims` with `secret`, valid for `ttl_seconds` from now.
///
/// Any `iat` / `exp` already present in `claims` is overwritten.
///
/// # Errors
///
/// Returns `TodoError::Config` if the secret is shorter than
/// [`MIN_SECRET_LEN`] bytes or `ttl_seconds` is not positive.
pub fn sign(claims: &Claims, secret: impl AsRef<[u8]>, ttl_seconds: i64) -> Result<String> {
    sign_at(claims, secret, ttl_seconds, now_secs())
}

/// Sign `claims` as if the current time were `now` (Unix seconds).
///
/// Output is fully determined by the arguments.
pub fn sign_at(
    claims: &Claims,
    secret: impl AsRef<[u8]>,
    ttl_seconds: i64,
    now: i64,
) -> Result<String> {
    let secret = secret.as_ref();
    check_secret(secret)?;
    if ttl_seconds <= 0 {
        return Err(TodoError::Config(format!(
            "token ttl must be positive, got {ttl_seconds}"
        )));
    }
    let expires_at = now
        .checked_add(ttl_seconds)
        .ok_or_else(|| TodoError::Config("token expiry overflows".into()))?;

    let mut full = claims.clone();
    full.issued_at = Some(now);
    full.expires_at = Some(expires_at);

    let header_json = serde_json::to_vec(&HEADER)
        .map_err(|e| TodoError::InvalidEncoding(format!("header: {e}")))?;
    let claims_json = serde_json::to_vec(&full)
        .map_err(|e| TodoError::InvalidEncoding(format!("claims: {e}")))?;

    let signing_input = format!(
        "{}.{}",
        base64url::encode(header_json),
        base64url::encode(claims_json)
    );
    let signature = mac_for(secret, &signing_input)?.finalize().into_bytes();

    Ok(format!("{signing_input}.{}", base64url::encode(signature)))
}

/// Verify `token` against `secret` at the current time.
///
/// # Errors
///
/// `Config` for a short secret, then `InvalidFormat`, `InvalidEncoding`,
/// `UnsupportedAlgorithm`, `BadSignature` or `Expired`.
pub fn verify(token: &str, secret: impl AsRef<[u8]>) -> Result<Claims> {
    verify_at(token, secret, now_secs())
}

/// Verify `token` as if the current time were `now` (Unix seconds).
pub fn verify_at(token: &str, secret: impl AsRef<[u8]>, now: i64) -> Result<Claims> {
    let secret = secret.as_ref();
    check_secret(secret)?;

    let mut parts = token.split('.');
    let (header_segment, claims_segment, signature_segment) =
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(c), Some(s), None) if !h.is_empty() && !c.is_empty() && !s.is_empty() => {
                (h, c, s)
            }
            _ => return Err(TodoError::InvalidFormat),
        };

    let header = decode_json(header_segment, "header")?;
    let claims = match decode_json(claims_segment, "claims")? {
        Value::Object(object) => Claims::from_object(object),
        _ => {
            return Err(TodoError::InvalidEncoding(
                "claims: expected a JSON object".into(),
            ))
        }
    };

    if header.get("alg").and_then(Value::as_str) != Some(ALGORITHM)
        || header.get("typ").and_then(Value::as_str) != Some(TOKEN_TYPE)
    {
        return Err(TodoError::UnsupportedAlgorithm);
    }

    // Only the canonical spelling of the digest is accepted; anything else
    // is a mismatch.
    let provided =
        base64url::decode_canonical(signature_segment).map_err(|_| TodoError::BadSignature)?;
    let signing_input = &token[..header_segment.len() + 1 + claims_segment.len()];
    mac_for(secret, signing_input)?
        .verify_slice(&provided)
        .map_err(|_| TodoError::BadSignature)?;

    if let Some(expires_at) = claims.expires_at {
        if expires_at <= now {
            return Err(TodoError::Expired);
        }
    }

    Ok(claims)
}

fn check_secret(secret: &[u8]) -> Result<()> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(TodoError::Config(format!(
            "token secret must be at least {MIN_SECRET_LEN} bytes"
        )));
    }
    Ok(())
}

fn mac_for(secret: &[u8], signing_input: &str) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| TodoError::Config(format!("invalid token secret: {e}")))?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
}

fn decode_json(segment: &str, what: &str) -> Result<Value> {
    let bytes = base64url::decode(segment)
        .map_err(|e| TodoError::InvalidEncoding(format!("{what}: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| TodoError::InvalidEncoding(format!("{what}: {e}")))
}
