//! HMAC-SHA256 message authentication codes.
//!
//! Signs bearer tokens under the process-wide shared secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{ChirpyError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Fixed output length of HMAC-SHA256 in bytes.
pub const HMAC_SHA256_LEN: usize = 32;

/// Compute HMAC-SHA256 over `data` using `key`.
///
/// # Errors
///
/// Returns `ChirpyError::Config` if the MAC cannot be keyed. HMAC accepts
/// keys of any length, so this indicates a broken primitive rather than a
/// bad request.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; HMAC_SHA256_LEN]> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ChirpyError::Config(format!("HMAC-SHA256 key init failed: {e}")))?;
    mac.update(data);
    let mut output = [0u8; HMAC_SHA256_LEN];
    output.copy_from_slice(&mac.finalize().into_bytes());
    Ok(output)
}

/// Verify an HMAC-SHA256 tag in constant time.
///
/// Returns false on mismatch, on a tag of the wrong length, or if the MAC
/// cannot be keyed.
pub fn verify_hmac_sha256(key: &[u8], data: &[u8], tag: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(data);
    mac.verify_slice(tag).is_ok()
}
