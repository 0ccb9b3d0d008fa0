//! Bearer tokens binding a caller to an account id.
//!
//! A token is `{iss, sub, iat, exp}` signed with HMAC-SHA256 under a shared
//! secret, encoded as a JWT (HS256). Tokens are never persisted.

pub mod claims;
pub mod service;

pub use claims::Claims;
pub use service::{
    bearer_token, clamp_lifetime, issue_token, verify_token, TokenService,
    DEFAULT_MAX_LIFETIME_SECS,
};
