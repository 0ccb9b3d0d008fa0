//! Cryptographic primitives for Chirpy.
//!
//! This module provides:
//! - Argon2id password hashing and verification
//! - HMAC-SHA256 signing for bearer tokens

pub mod mac;
pub mod password;

pub use password::{CredentialManager, HashCost};
