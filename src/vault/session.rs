//! The core's interface to a front end: unlock, edit, save, lock, rotate.
//!
//! [`Vault`] is a locked handle that only knows where the vault lives and
//! which Argon2 parameters new keys get. Unlocking returns a [`Session`]
//! that owns the master key and the decrypted records; every edit goes
//! through it and dropping it (or calling [`Session::lock`]) wipes both.

use std::path::{Path, PathBuf};

use chrono::Utc;

use super::format::{self, VaultHeader, VaultMetadata};
use super::record::{CredentialRecord, Field, RecordId, StoredRecord};
use super::rotation::{RotationCoordinator, RotationReport};
use super::store::{Confirmation, RecordStore};
use crate::config::Settings;
use crate::crypto::verifier::{check_new_secret, register_with_key, unlock_key};
use crate::crypto::{Argon2Params, MasterKey, RecordCodec};
use crate::errors::{PassVaultError, Result};

/// Default minimum master key length in characters.
pub const DEFAULT_MIN_SECRET_LEN: usize = 8;

/// Result of trying to unlock the vault.
#[derive(Debug)]
pub enum UnlockResult {
    /// The secret matched; the session holds the decrypted records.
    Success(Session),
    /// No vault exists yet; the caller should offer registration.
    FirstTimeSetup,
    /// The secret did not match the stored verification hash.
    WrongSecret,
}

/// Summary of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    /// Records written to disk.
    pub saved: usize,
    /// All-empty records left out.
    pub dropped: usize,
}

/// A locked vault.
#[derive(Debug, Clone)]
pub struct Vault {
    path: PathBuf,
    params: Argon2Params,
    min_secret_len: usize,
}

impl Vault {
    /// A vault stored at `path`; `params` apply to keys created by
    /// registration and rotation.
    pub fn new(path: impl Into<PathBuf>, params: Argon2Params) -> Self {
        Self {
            path: path.into(),
            params,
            min_secret_len: DEFAULT_MIN_SECRET_LEN,
        }
    }

    /// Locate the vault and key parameters from project settings.
    pub fn from_settings(settings: &Settings, project_dir: &Path) -> Self {
        Self::new(settings.vault_path(project_dir), settings.argon2_params())
            .with_min_secret_len(settings.min_master_key_len)
    }

    pub fn with_min_secret_len(mut self, min_secret_len: usize) -> Self {
        self.min_secret_len = min_secret_len;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a vault has been registered at this path.
    pub fn is_registered(&self) -> Result<bool> {
        Ok(format::load_metadata(&self.path)?.is_some())
    }

    /// Check `secret` and decrypt every record.
    ///
    /// A missing vault is `FirstTimeSetup`; an unreadable one is an error,
    /// never an empty session. A record that fails to decrypt under a
    /// verified key fails the whole unlock with
    /// [`PassVaultError::DecryptionFailed`].
    pub fn unlock(&self, secret: &str) -> Result<UnlockResult> {
        let Some(raw) = format::load_metadata(&self.path)? else {
            tracing::info!(path = %self.path.display(), "no vault yet");
            return Ok(UnlockResult::FirstTimeSetup);
        };

        let Some(master_key) = unlock_key(secret.as_bytes(), &raw.metadata.header.verification)
        else {
            tracing::info!("unlock rejected: master key mismatch");
            return Ok(UnlockResult::WrongSecret);
        };
        raw.verify_integrity(&master_key)?;

        let codec = RecordCodec::new(&master_key)?;
        let metadata = raw.into_metadata();
        let mut records = Vec::with_capacity(metadata.records.len());
        for stored in metadata.records {
            let mut password = codec
                .decrypt_field(&stored.id, &stored.password)
                .inspect_err(|_| {
                    tracing::warn!(record = %stored.id, "stored record could not be decrypted");
                })?;
            records.push(CredentialRecord::restore(
                stored.id,
                stored.url,
                stored.user_id,
                std::mem::take(&mut *password),
            ));
        }

        tracing::info!(records = records.len(), "vault unlocked");
        Ok(UnlockResult::Success(Session {
            path: self.path.clone(),
            header: metadata.header,
            master_key,
            codec,
            store: RecordStore::from_records(records),
        }))
    }

    /// Register `secret` as the master key of a new, empty vault.
    ///
    /// The caller must have warned that a lost master key cannot be
    /// recovered and passes the user's answer as `confirmation`.
    pub fn register(&self, secret: &str, confirmation: Confirmation) -> Result<Session> {
        confirmation.require()?;
        check_new_secret(secret, self.min_secret_len)?;
        if format::load_metadata(&self.path)?.is_some() {
            return Err(PassVaultError::VaultAlreadyExists(self.path.clone()));
        }

        let (verification, master_key) = register_with_key(secret.as_bytes(), &self.params)?;
        let metadata = VaultMetadata {
            header: VaultHeader::new(verification),
            records: Vec::new(),
        };
        format::save_metadata(&self.path, &metadata, &master_key)?;
        tracing::info!(path = %self.path.display(), "vault registered");

        let codec = RecordCodec::new(&master_key)?;
        Ok(Session {
            path: self.path.clone(),
            header: metadata.header,
            master_key,
            codec,
            store: RecordStore::new(),
        })
    }

    /// Rotate the master key from `old` to `new`.
    ///
    /// Sessions unlocked before the rotation can no longer save; the
    /// front end must unlock again with the new key.
    pub fn change_master_key(&self, old: &str, new: &str, confirm: &str) -> Result<RotationReport> {
        RotationCoordinator::new(&self.path, self.params, self.min_secret_len).run(old, new, confirm)
    }
}

/// An unlocked vault: master key plus the decrypted working set.
pub struct Session {
    path: PathBuf,
    header: VaultHeader,
    master_key: MasterKey,
    codec: RecordCodec,
    store: RecordStore,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.path)
            .field("records", &self.store.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Decrypted records, in insertion order.
    pub fn records(&self) -> &[CredentialRecord] {
        self.store.records()
    }

    pub fn record(&self, id: RecordId) -> Option<&CredentialRecord> {
        self.store.get(id)
    }

    /// Set one field of a record; see [`RecordStore::mutate`].
    pub fn mutate_field(&mut self, id: RecordId, field: Field, value: &str) -> Result<()> {
        self.store.mutate(id, field, value)
    }

    /// Append an empty row and return its id.
    pub fn add_row(&mut self) -> RecordId {
        self.store.add_blank()
    }

    pub fn delete_row(&mut self, id: RecordId, confirmation: Confirmation) -> Result<()> {
        self.store.remove(id, confirmation)
    }

    /// Encrypt and persist every complete record.
    ///
    /// Refused with [`PassVaultError::IncompleteRecords`] while any record
    /// is only partly filled in. All-empty records are dropped.
    pub fn save(&mut self) -> Result<SaveReport> {
        let plan = self.store.prepare_for_save();
        if !plan.incomplete.is_empty() {
            return Err(PassVaultError::IncompleteRecords(plan.incomplete));
        }
        self.ensure_current()?;

        let records = plan
            .complete
            .iter()
            .map(|record| {
                Ok(StoredRecord {
                    id: record.id(),
                    url: record.url().to_string(),
                    user_id: record.user_id().to_string(),
                    password: self.codec.encrypt_field(&record.id(), record.password())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let report = SaveReport {
            saved: records.len(),
            dropped: plan.dropped,
        };

        let mut header = self.header.clone();
        header.updated_at = Utc::now();
        let metadata = VaultMetadata { header, records };
        format::save_metadata(&self.path, &metadata, &self.master_key)?;

        self.header = metadata.header;
        self.store.discard_empty();
        tracing::info!(saved = report.saved, dropped = report.dropped, "vault saved");
        Ok(report)
    }

    /// End the session; the master key and all plaintext are wiped.
    pub fn lock(self) {
        tracing::debug!("session locked");
    }

    /// Refuse to write if the vault on disk is no longer keyed to the
    /// secret this session was unlocked with.
    fn ensure_current(&self) -> Result<()> {
        match format::load_metadata(&self.path)? {
            Some(raw) if raw.metadata.header.verification != self.header.verification => {
                Err(PassVaultError::StaleSession)
            }
            _ => Ok(()),
        }
    }
}
