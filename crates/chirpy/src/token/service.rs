//! Issue and verify signed, time-bounded bearer tokens.
//!
//! Tokens are stateless: nothing is persisted. Verification recomputes the
//! HMAC under the shared secret and compares the expiry to the clock.

use crate::crypto::mac::{hmac_sha256, verify_hmac_sha256};
use crate::error::{ChirpyError, Result};
use crate::time::now_secs;

use super::claims::{
    decode_segment, decode_signature, encode_segment, encode_signature, Claims, Header, ALGORITHM,
    ISSUER,
};

/// Longest lifetime a token may be issued with: 24 hours.
pub const DEFAULT_MAX_LIFETIME_SECS: u64 = 24 * 60 * 60;

/// Clamp a requested lifetime to `(0, max]`.
///
/// Zero, and anything above `max`, become `max`. Never rejected.
pub fn clamp_lifetime(requested_secs: u64, max_secs: u64) -> u64 {
    if requested_secs == 0 || requested_secs > max_secs {
        max_secs
    } else {
        requested_secs
    }
}

/// Issue a token for `subject` signed with `secret`, as of `now`.
///
/// # Errors
///
/// Returns `ChirpyError::Config` if the signing primitive fails.
pub fn issue_token(
    subject: u64,
    requested_lifetime_secs: u64,
    secret: &str,
    max_lifetime_secs: u64,
    now: u64,
) -> Result<String> {
    let lifetime = clamp_lifetime(requested_lifetime_secs, max_lifetime_secs);
    let claims = Claims::new(subject, now, lifetime);

    let signing_input = format!(
        "{}.{}",
        encode_segment(&Header::hs256())?,
        encode_segment(&claims)?
    );
    let tag = hmac_sha256(secret.as_bytes(), signing_input.as_bytes())?;

    Ok(format!("{signing_input}.{}", encode_signature(&tag)))
}

/// Verify `token` against `secret` as of `now` and return its claims.
///
/// # Errors
///
/// Returns `ChirpyError::Auth` if the token is malformed, the signature does
/// not match, the issuer is wrong, or the token has expired.
pub fn verify_token_claims(token: &str, secret: &str, now: u64) -> Result<Claims> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ChirpyError::Auth("malformed token".into()));
    };

    let header: Header = decode_segment(header_b64, "header")?;
    if header.alg != ALGORITHM {
        return Err(ChirpyError::Auth(format!(
            "unsupported token algorithm: {}",
            header.alg
        )));
    }

    let tag = decode_signature(sig_b64)?;
    let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
    if !verify_hmac_sha256(secret.as_bytes(), signing_input.as_bytes(), &tag) {
        return Err(ChirpyError::Auth("token signature mismatch".into()));
    }

    let claims: Claims = decode_segment(claims_b64, "claims")?;
    if claims.iss != ISSUER {
        return Err(ChirpyError::Auth("token issuer mismatch".into()));
    }
    if claims.is_expired_at(now) {
        return Err(ChirpyError::Auth("token expired".into()));
    }
    Ok(claims)
}

/// Verify `token` against `secret` as of `now` and return the subject.
pub fn verify_token(token: &str, secret: &str, now: u64) -> Result<u64> {
    verify_token_claims(token, secret, now)?.subject()
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// # Errors
///
/// Returns `ChirpyError::Auth` if the value is not a bearer credential.
pub fn bearer_token(authorization: &str) -> Result<&str> {
    let value = authorization.trim();
    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| ChirpyError::Auth("missing bearer token".into()))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ChirpyError::Auth(format!(
            "unsupported authorization scheme: {scheme}"
        )));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(ChirpyError::Auth("missing bearer token".into()));
    }
    Ok(token)
}

/// Token issuer and verifier bound to one process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    max_lifetime_secs: u64,
}

impl TokenService {
    /// Build a service around `secret`.
    ///
    /// # Errors
    ///
    /// Returns `ChirpyError::Config` for an empty secret or a zero max
    /// lifetime. Both are startup defects, not request errors.
    pub fn new(secret: impl Into<String>, max_lifetime_secs: u64) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ChirpyError::Config("token signing secret is empty".into()));
        }
        if max_lifetime_secs == 0 {
            return Err(ChirpyError::Config(
                "token max lifetime must be positive".into(),
            ));
        }
        Ok(Self {
            secret,
            max_lifetime_secs,
        })
    }

    pub fn max_lifetime_secs(&self) -> u64 {
        self.max_lifetime_secs
    }

    /// Issue a token for `subject`, valid from now.
    pub fn issue(&self, subject: u64, requested_lifetime_secs: u64) -> Result<String> {
        self.issue_at(subject, requested_lifetime_secs, now_secs())
    }

    pub fn issue_at(&self, subject: u64, requested_lifetime_secs: u64, now: u64) -> Result<String> {
        let token = issue_token(
            subject,
            requested_lifetime_secs,
            &self.secret,
            self.max_lifetime_secs,
            now,
        )?;
        log::debug!("issued token for account {subject}");
        Ok(token)
    }

    /// Verify a token and return the account id it was issued for.
    pub fn verify(&self, token: &str) -> Result<u64> {
        self.verify_at(token, now_secs())
    }

    pub fn verify_at(&self, token: &str, now: u64) -> Result<u64> {
        verify_token(token, &self.secret, now).map_err(|e| {
            log::debug!("token rejected: {e}");
            e
        })
    }

    /// Verify and return the full claims.
    pub fn claims(&self, token: &str) -> Result<Claims> {
        verify_token_claims(token, &self.secret, now_secs())
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .finish()
    }
}
