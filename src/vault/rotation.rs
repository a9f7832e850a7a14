//! Master key rotation.
//!
//! Rotation is a linear state machine with no persisted intermediate
//! state:
//!
//! ```text
//! Idle -> VerifyingOldKey -> DecryptingAll -> ReEncryptingAll -> Committing -> Idle
//!                                                        (any step fails) -> Failed
//! ```
//!
//! Every record is decrypted under the old key before anything new is
//! computed; the re-encrypted set is staged in memory and committed with
//! one atomic file replacement. Until that replacement, the vault on
//! disk is exactly what it was before rotation started.

use std::path::Path;

use chrono::Utc;
use zeroize::Zeroizing;

use super::format::{self, VaultHeader, VaultMetadata, CURRENT_VERSION};
use super::record::StoredRecord;
use crate::crypto::verifier::{check_new_secret, register_with_key, unlock_key};
use crate::crypto::{Argon2Params, RecordCodec};
use crate::errors::{PassVaultError, Result};

/// Where a rotation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    Idle,
    VerifyingOldKey,
    DecryptingAll,
    ReEncryptingAll,
    Committing,
    Failed,
}

/// Outcome of a successful rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationReport {
    /// Number of records re-encrypted under the new key.
    pub records: usize,
}

/// Drives one rotation of the vault at `path`.
#[derive(Debug)]
pub struct RotationCoordinator<'a> {
    path: &'a Path,
    params: Argon2Params,
    min_secret_len: usize,
    state: RotationState,
    history: Vec<RotationState>,
}

impl<'a> RotationCoordinator<'a> {
    /// `params` are the Argon2 parameters the new key is derived with.
    pub fn new(path: &'a Path, params: Argon2Params, min_secret_len: usize) -> Self {
        Self {
            path,
            params,
            min_secret_len,
            state: RotationState::Idle,
            history: vec![RotationState::Idle],
        }
    }

    pub fn state(&self) -> RotationState {
        self.state
    }

    /// Every state visited so far, starting with `Idle`.
    pub fn history(&self) -> &[RotationState] {
        &self.history
    }

    /// Replace the master key `old` with `new`.
    ///
    /// `new` and `confirm` are two independently typed copies of the new
    /// key and must match before anything else happens. Any failure leaves
    /// the vault file untouched and is reported once for the whole vault.
    pub fn run(&mut self, old: &str, new: &str, confirm: &str) -> Result<RotationReport> {
        match self.drive(old, new, confirm) {
            Ok(report) => {
                self.enter(RotationState::Idle);
                tracing::info!(records = report.records, "master key rotated");
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(stage = ?self.state, error = %e, "master key rotation aborted");
                self.enter(RotationState::Failed);
                Err(e)
            }
        }
    }

    fn drive(&mut self, old: &str, new: &str, confirm: &str) -> Result<RotationReport> {
        if new != confirm {
            return Err(PassVaultError::SecretMismatch);
        }
        check_new_secret(new, self.min_secret_len)?;

        self.enter(RotationState::VerifyingOldKey);
        let raw = format::load_metadata(self.path)?
            .ok_or_else(|| PassVaultError::VaultNotFound(self.path.to_path_buf()))?;
        let old_key = unlock_key(old.as_bytes(), &raw.metadata.header.verification)
            .ok_or(PassVaultError::WrongSecret)?;
        raw.verify_integrity(&old_key)?;
        let metadata = raw.into_metadata();

        self.enter(RotationState::DecryptingAll);
        let old_codec = RecordCodec::new(&old_key)?;
        let mut plaintexts: Vec<Zeroizing<String>> = Vec::with_capacity(metadata.records.len());
        let mut unreadable = 0usize;
        for record in &metadata.records {
            match old_codec.decrypt_field(&record.id, &record.password) {
                Ok(password) => plaintexts.push(password),
                Err(_) => {
                    tracing::debug!(record = %record.id, "record unreadable under current key");
                    unreadable += 1;
                }
            }
        }
        if unreadable > 0 {
            return Err(PassVaultError::StorageCorrupt(format!(
                "{unreadable} of {} record(s) could not be decrypted with the current master key; nothing was changed",
                metadata.records.len()
            )));
        }

        self.enter(RotationState::ReEncryptingAll);
        let (new_hash, new_key) = register_with_key(new.as_bytes(), &self.params)?;
        let new_codec = RecordCodec::new(&new_key)?;
        let staged = metadata
            .records
            .iter()
            .zip(&plaintexts)
            .map(|(record, password)| {
                Ok(StoredRecord {
                    id: record.id,
                    url: record.url.clone(),
                    user_id: record.user_id.clone(),
                    password: new_codec.encrypt_field(&record.id, password)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        drop(plaintexts);

        self.enter(RotationState::Committing);
        let staged_metadata = VaultMetadata {
            header: VaultHeader {
                version: CURRENT_VERSION,
                verification: new_hash,
                created_at: metadata.header.created_at,
                updated_at: Utc::now(),
            },
            records: staged,
        };
        format::save_metadata(self.path, &staged_metadata, &new_key)?;

        Ok(RotationReport {
            records: staged_metadata.records.len(),
        })
    }

    fn enter(&mut self, state: RotationState) {
        tracing::debug!(from = ?self.state, to = ?state, "rotation state");
        self.state = state;
        self.history.push(state);
    }
}
