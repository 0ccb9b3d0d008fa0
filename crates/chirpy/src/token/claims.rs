//! Token claims and the compact wire encoding.
//!
//! Tokens use the JWT compact serialization with HS256:
//! `base64url(header) "." base64url(claims) "." base64url(hmac)`, no padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ChirpyError, Result};

/// Issuer stamped into and required of every token.
pub const ISSUER: &str = "chirpy";

/// The only signing algorithm accepted.
pub const ALGORITHM: &str = "HS256";

/// JOSE header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl Header {
    pub fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        }
    }
}

/// Registered claims carried by a Chirpy token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer.
    pub iss: String,
    /// Subject: the account id, in decimal.
    pub sub: String,
    /// Issued-at, epoch seconds.
    pub iat: u64,
    /// Expiry, epoch seconds. The token is invalid from this instant on.
    pub exp: u64,
}

impl Claims {
    pub fn new(subject: u64, issued_at: u64, lifetime_secs: u64) -> Self {
        Self {
            iss: ISSUER.to_string(),
            sub: subject.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(lifetime_secs),
        }
    }

    /// The subject as an account id.
    pub fn subject(&self) -> Result<u64> {
        match self.sub.parse::<u64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(ChirpyError::Auth("token subject is not an account id".into())),
        }
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.exp
    }
}

/// Serialize `value` to JSON and base64url-encode it.
pub(crate) fn encode_segment<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)
        .map_err(|e| ChirpyError::Config(format!("token serialization: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a base64url JSON segment. Any failure is an auth failure.
pub(crate) fn decode_segment<T: DeserializeOwned>(segment: &str, what: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| ChirpyError::Auth(format!("malformed token {what}")))?;
    serde_json::from_slice(&bytes).map_err(|_| ChirpyError::Auth(format!("malformed token {what}")))
}

pub(crate) fn encode_signature(tag: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(tag)
}

pub(crate) fn decode_signature(segment: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| ChirpyError::Auth("malformed token signature".into()))
}
