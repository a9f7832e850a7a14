//! Cryptographic primitives for PassVault.
//!
//! This module provides:
//! - Argon2id master key derivation (`kdf`)
//! - The zeroizing `MasterKey` and its HKDF sub-keys (`keys`)
//! - Master key registration and verification (`verifier`)
//! - AES-256-GCM protection of password fields (`codec`)

pub mod codec;
pub mod kdf;
pub mod keys;
pub mod verifier;

pub use codec::{EncryptedField, RecordCodec};
pub use kdf::{derive_master_key, generate_salt, Argon2Params};
pub use keys::MasterKey;
pub use verifier::{register, verify, VerificationHash};

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded byte fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
