//! Master key verification.
//!
//! The vault never stores the master secret. At registration a random
//! salt is drawn, the secret is stretched with Argon2id, and an HKDF
//! sub-key of the result is kept as the verification digest. Checking a
//! candidate repeats the same derivation with the stored salt and
//! parameters and compares digests in constant time.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::kdf::{derive_master_key, generate_salt, Argon2Params, SALT_LEN};
use super::keys::{MasterKey, KEY_LEN};
use super::{base64_decode, base64_encode};
use crate::errors::{PassVaultError, Result};

/// One-way verification hash of a master secret, plus the salt and
/// Argon2 parameters needed to recompute it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationHash {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    salt: Vec<u8>,

    params: Argon2Params,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    digest: Vec<u8>,
}

impl VerificationHash {
    /// Argon2 parameters this hash was computed with.
    pub fn params(&self) -> &Argon2Params {
        &self.params
    }

    /// Check the shape of a hash read back from storage.
    pub fn validate(&self) -> Result<()> {
        if self.salt.len() != SALT_LEN {
            return Err(PassVaultError::StorageCorrupt(format!(
                "verification salt must be {SALT_LEN} bytes, got {}",
                self.salt.len()
            )));
        }
        if self.digest.len() != KEY_LEN {
            return Err(PassVaultError::StorageCorrupt(format!(
                "verification digest must be {KEY_LEN} bytes, got {}",
                self.digest.len()
            )));
        }
        self.params
            .validate()
            .map_err(|e| PassVaultError::StorageCorrupt(format!("verification params: {e}")))
    }
}

/// Reject a new master secret that is blank or shorter than `min_len`
/// characters.
pub fn check_new_secret(secret: &str, min_len: usize) -> Result<()> {
    if secret.trim().is_empty() {
        return Err(PassVaultError::WeakSecret(
            "master key cannot be empty".into(),
        ));
    }
    let len = secret.chars().count();
    if len < min_len {
        return Err(PassVaultError::WeakSecret(format!(
            "master key must be at least {min_len} characters (got {len})"
        )));
    }
    Ok(())
}

/// Compute the verification hash for a new master secret.
pub fn register(secret: &[u8], params: &Argon2Params) -> Result<VerificationHash> {
    register_with_key(secret, params).map(|(hash, _)| hash)
}

/// Like [`register`], but also hand back the derived master key so the
/// caller does not have to run Argon2id a second time.
pub fn register_with_key(
    secret: &[u8],
    params: &Argon2Params,
) -> Result<(VerificationHash, MasterKey)> {
    let salt = generate_salt();
    let master_key = derive_master_key(secret, &salt, params)?;
    let digest = master_key.verifier_digest()?;

    let hash = VerificationHash {
        salt: salt.to_vec(),
        params: *params,
        digest: digest.to_vec(),
    };
    Ok((hash, master_key))
}

/// Does `secret` match the stored hash?
pub fn verify(secret: &[u8], stored: &VerificationHash) -> bool {
    unlock_key(secret, stored).is_some()
}

/// Verify `secret` and, if it matches, return the master key it derives.
///
/// Any derivation failure counts as a mismatch; stored hashes are
/// validated when the vault is loaded, so this only happens for hashes
/// built by hand.
pub fn unlock_key(secret: &[u8], stored: &VerificationHash) -> Option<MasterKey> {
    let master_key = match derive_master_key(secret, &stored.salt, &stored.params) {
        Ok(key) => key,
        Err(e) => {
            tracing::warn!(error = %e, "master key derivation failed during verification");
            return None;
        }
    };
    let digest = master_key.verifier_digest().ok()?;

    if bool::from(digest.as_slice().ct_eq(&stored.digest)) {
        Some(master_key)
    } else {
        None
    }
}
