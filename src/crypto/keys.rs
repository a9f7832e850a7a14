//! The master key and the sub-keys expanded from it with HKDF-SHA256.
//!
//! One Argon2id run per unlock produces the master key. Independent
//! sub-keys are then expanded for each purpose:
//! - the **verifier** digest stored in the vault header,
//! - the **record key** that encrypts password fields,
//! - the **HMAC key** that authenticates the whole vault file.
//!
//! HKDF (RFC 5869) uses the master key as input keying material and a
//! per-purpose `info` string, so learning one output says nothing about
//! the others or the master key.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{PassVaultError, Result};

/// Length of the master key and every derived sub-key (256 bits).
pub const KEY_LEN: usize = 32;

const VERIFIER_INFO: &[u8] = b"passvault-verifier";
const RECORD_KEY_INFO: &[u8] = b"passvault-record-key";
const HMAC_KEY_INFO: &[u8] = b"passvault-hmac-key";

/// A 32-byte master key that zeroes its memory when dropped.
///
/// Debug output never shows the key bytes.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl MasterKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Digest stored in the vault header to recognise this key later.
    pub fn verifier_digest(&self) -> Result<[u8; KEY_LEN]> {
        hkdf_expand(&self.bytes, VERIFIER_INFO)
    }

    /// Key that encrypts individual password fields.
    pub fn record_key(&self) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        hkdf_expand(&self.bytes, RECORD_KEY_INFO).map(Zeroizing::new)
    }

    /// Key that authenticates the vault file.
    pub fn hmac_key(&self) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        hkdf_expand(&self.bytes, HMAC_KEY_INFO).map(Zeroizing::new)
    }
}

/// HKDF-SHA256 expand only: the master key already came out of Argon2id,
/// so it is used directly as the pseudo-random key.
fn hkdf_expand(ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| PassVaultError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}
