use std::path::PathBuf;
use thiserror::Error;

use crate::vault::RecordId;

/// All errors that can occur in PassVault.
#[derive(Debug, Error)]
pub enum PassVaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — wrong master key or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Master key errors ---
    #[error("Master key does not match")]
    WrongSecret,

    #[error("New master keys do not match")]
    SecretMismatch,

    #[error("Master key rejected: {0}")]
    WeakSecret(String),

    // --- Record errors ---
    #[error("Invalid value: {0}")]
    Validation(String),

    #[error(
        "{} record(s) have only some of URL, ID and password filled in — complete or delete them",
        .0.len()
    )]
    IncompleteRecords(Vec<RecordId>),

    #[error("Record {0} not found")]
    RecordNotFound(RecordId),

    #[error("This action must be confirmed before it runs")]
    ConfirmationRequired,

    // --- Storage errors ---
    #[error("No vault found at {0} — run `passvault init` first")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Vault storage is corrupt: {0}")]
    StorageCorrupt(String),

    #[error("The master key changed since this session was unlocked — unlock again")]
    StaleSession,

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Convenience type alias for PassVault results.
pub type Result<T> = std::result::Result<T, PassVaultError>;
