//! The claim set carried inside a token.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Signed token claims.
///
/// The registered claims use their JWT wire names (`sub`, `iat`, `exp`).
/// Any other claim is preserved in `extra` and survives a sign/verify
/// round trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity the token was issued to.
    #[serde(rename = "sub", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Issue time, Unix seconds. Always overwritten by `sign`.
    #[serde(rename = "iat", default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
    /// Expiry time, Unix seconds. Always overwritten by `sign`.
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Application-defined claims.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Claims naming only a subject.
    pub fn for_subject(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..Self::default()
        }
    }

    /// Add an application-defined claim.
    pub fn with_claim(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Build claims from a decoded JSON object.
    ///
    /// Registered claims of the wrong JSON type are kept in `extra` rather
    /// than rejected, so `sub: 42` yields no subject and `exp: "soon"` no
    /// expiry.
    pub fn from_object(mut object: Map<String, Value>) -> Self {
        let subject = take_if(&mut object, "sub", |v| v.as_str().map(str::to_string));
        let issued_at = take_if(&mut object, "iat", as_seconds);
        let expires_at = take_if(&mut object, "exp", as_seconds);
        Self {
            subject,
            issued_at,
            expires_at,
            extra: object,
        }
    }

    /// The subject if it is present and non-empty.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref().filter(|s| !s.is_empty())
    }
}

fn take_if<T>(
    object: &mut Map<String, Value>,
    key: &str,
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let converted = object.get(key).and_then(convert)?;
    object.remove(key);
    Some(converted)
}

// Fractional times round up: for whole-second `now`, `exp <= now` holds
// exactly when `ceil(exp) <= now`.
fn as_seconds(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.ceil() as i64)
    })
}
