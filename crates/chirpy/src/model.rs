//! Record types and the persisted document.
//!
//! The [`Document`] is the unit of persistence: it is always read and
//! written whole. On disk it has the shape
//!
//! ```json
//! {
//!     "chirps": { "1": { "id": 1, "body": "hello" } },
//!     "users":  { "1": { "id": 1, "email": "a@x.com", "password": "$argon2id$..." } }
//! }
//! ```
//!
//! Map keys are the decimal record ids.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ChirpyError, Result};

/// Maximum chirp body length in bytes.
pub const MAX_CHIRP_LEN: usize = 140;

/// A short text message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: u64,
    pub body: String,
}

/// An account as persisted, including the password hash.
///
/// Never leaves the crate; callers see [`Account`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct User {
    pub id: u64,
    pub email: String,
    /// Argon2id PHC string. Never plaintext.
    pub password: String,
}

/// An account as returned to callers. Carries no credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub email: String,
}

impl From<&User> for Account {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// The aggregate root persisted by the document store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub chirps: BTreeMap<u64, Chirp>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub(crate) users: BTreeMap<u64, User>,
}

impl Document {
    /// Largest chirp id present, or 0.
    pub fn max_chirp_id(&self) -> u64 {
        self.chirps.keys().next_back().copied().unwrap_or(0)
    }

    /// Largest account id present, or 0.
    pub fn max_user_id(&self) -> u64 {
        self.users.keys().next_back().copied().unwrap_or(0)
    }

    /// Number of stored accounts.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub(crate) fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.email == email)
    }

    /// Check that every record sits under its own id and that no id is 0.
    pub(crate) fn check_keys(&self) -> std::result::Result<(), String> {
        for (key, chirp) in &self.chirps {
            if *key == 0 || *key != chirp.id {
                return Err(format!("chirp stored under key {key} has id {}", chirp.id));
            }
        }
        for (key, user) in &self.users {
            if *key == 0 || *key != user.id {
                return Err(format!("user stored under key {key} has id {}", user.id));
            }
        }
        Ok(())
    }
}

/// Reject chirp bodies longer than [`MAX_CHIRP_LEN`] bytes of UTF-8.
pub fn validate_body(body: &str) -> Result<()> {
    let len = body.len();
    if len > MAX_CHIRP_LEN {
        return Err(ChirpyError::Validation(format!(
            "chirp is too long: {len} bytes, max {MAX_CHIRP_LEN}"
        )));
    }
    Ok(())
}

/// Reject empty or whitespace-only emails.
pub fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(ChirpyError::Validation("email must not be empty".into()));
    }
    Ok(())
}

// Files written by earlier releases contain `"chirps": null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
