//! Record codec: AES-256-GCM protection of a single password field.
//!
//! Each call to [`RecordCodec::encrypt_field`] draws a fresh 12-byte
//! nonce, so encrypting the same password twice gives different blobs.
//! The blob is self-describing:
//!
//! ```text
//! [format version: 1 byte][nonce: 12 bytes][ciphertext + 16-byte auth tag]
//! ```
//!
//! The record id and format version are bound in as associated data,
//! so a blob copied onto another record fails authentication.

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, Zeroizing};

use super::keys::{MasterKey, KEY_LEN};
use crate::errors::{PassVaultError, Result};
use crate::vault::RecordId;

/// Current blob layout version.
pub const FIELD_FORMAT_VERSION: u8 = 1;

/// Size of the AES-256-GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
const TAG_LEN: usize = 16;

/// An encrypted password as stored on disk (base64 in JSON).
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedField(Vec<u8>);

impl EncryptedField {
    /// Wrap raw blob bytes, e.g. read back from storage.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw blob bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptedField({} bytes)", self.0.len())
    }
}

impl Serialize for EncryptedField {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        super::base64_encode(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for EncryptedField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        super::base64_decode(deserializer).map(Self)
    }
}

/// Encrypts and decrypts password fields under one master key.
///
/// Holds only the derived record key, never the master secret.
pub struct RecordCodec {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl std::fmt::Debug for RecordCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCodec")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl RecordCodec {
    /// Build a codec for the given master key.
    pub fn new(master_key: &MasterKey) -> Result<Self> {
        Ok(Self {
            key: master_key.record_key()?,
        })
    }

    /// Encrypt the password of record `id`.
    pub fn encrypt_field(&self, id: &RecordId, plaintext: &str) -> Result<EncryptedField> {
        let cipher = Aes256Gcm::new_from_slice(self.key.as_slice())
            .map_err(|e| PassVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let aad = associated_data(id);

        let ciphertext = cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: &aad,
                },
            )
            .map_err(|e| PassVaultError::EncryptionFailed(format!("encryption error: {e}")))?;

        let mut blob = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        blob.push(FIELD_FORMAT_VERSION);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(EncryptedField(blob))
    }

    /// Decrypt the password of record `id`.
    ///
    /// A wrong key, a tampered blob, a blob belonging to another record
    /// and a plaintext that is not UTF-8 all yield
    /// [`PassVaultError::DecryptionFailed`]. An empty password that was
    /// genuinely encrypted comes back as `Ok("")`.
    pub fn decrypt_field(&self, id: &RecordId, field: &EncryptedField) -> Result<Zeroizing<String>> {
        let blob = field.as_bytes();
        if blob.len() < 1 + NONCE_LEN + TAG_LEN || blob[0] != FIELD_FORMAT_VERSION {
            return Err(PassVaultError::DecryptionFailed);
        }

        let (nonce_bytes, ciphertext) = blob[1..].split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let cipher = Aes256Gcm::new_from_slice(self.key.as_slice())
            .map_err(|_| PassVaultError::DecryptionFailed)?;

        let aad = associated_data(id);
        let plaintext = cipher
            .decrypt(
                nonce,
                Payload {
                    msg: ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| PassVaultError::DecryptionFailed)?;

        String::from_utf8(plaintext)
            .map(Zeroizing::new)
            .map_err(|e| {
                let mut bad_bytes = e.into_bytes();
                bad_bytes.zeroize();
                PassVaultError::DecryptionFailed
            })
    }
}

fn associated_data(id: &RecordId) -> Vec<u8> {
    let mut aad = Vec::with_capacity(1 + 16);
    aad.push(FIELD_FORMAT_VERSION);
    aad.extend_from_slice(id.as_bytes());
    aad
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(byte: u8) -> RecordCodec {
        RecordCodec::new(&MasterKey::new([byte; KEY_LEN])).unwrap()
    }

    #[test]
    fn blob_layout_has_version_nonce_and_tag() {
        let id = RecordId::new();
        let field = codec(1).encrypt_field(&id, "abc").unwrap();
        assert_eq!(field.as_bytes()[0], FIELD_FORMAT_VERSION);
        assert_eq!(field.as_bytes().len(), 1 + NONCE_LEN + 3 + TAG_LEN);
    }

    #[test]
    fn empty_password_round_trips_as_success() {
        let id = RecordId::new();
        let c = codec(1);
        let field = c.encrypt_field(&id, "").unwrap();
        assert_eq!(c.decrypt_field(&id, &field).unwrap().as_str(), "");
    }

    #[test]
    fn blob_moved_to_other_record_fails() {
        let c = codec(1);
        let field = c.encrypt_field(&RecordId::new(), "secret").unwrap();
        let result = c.decrypt_field(&RecordId::new(), &field);
        assert!(matches!(result, Err(PassVaultError::DecryptionFailed)));
    }

    #[test]
    fn unknown_version_fails() {
        let id = RecordId::new();
        let c = codec(1);
        let mut bytes = c.encrypt_field(&id, "secret").unwrap().as_bytes().to_vec();
        bytes[0] = 9;
        let result = c.decrypt_field(&id, &EncryptedField::from_bytes(bytes));
        assert!(matches!(result, Err(PassVaultError::DecryptionFailed)));
    }

    #[test]
    fn serializes_as_base64_string() {
        let field = EncryptedField::from_bytes(vec![1, 2, 3]);
        let json = serde_json::to_string(&field).unwrap();
        assert_eq!(json, "\"AQID\"");
        let back: EncryptedField = serde_json::from_str(&json).unwrap();
        assert_eq!(back, field);
    }
}
