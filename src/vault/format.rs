//! Binary vault file format, integrity check and atomic persistence.
//!
//! A vault file has this layout:
//!
//! ```text
//! [PVLT: 4 bytes][version: 1 byte][header_len: 4 bytes LE][header JSON][records JSON][HMAC-SHA256: 32 bytes]
//! ```
//!
//! - **Magic** (`PVLT`): identifies the file as a PassVault vault.
//! - **Version**: format version (currently `1`).
//! - **Header length**: little-endian u32 telling us where the header
//!   JSON ends and the records JSON begins.
//! - **Header JSON**: serialized `VaultHeader` (verification hash, timestamps).
//! - **Records JSON**: serialized `Vec<StoredRecord>`.
//! - **HMAC-SHA256**: tag over header + records, keyed from the master key.
//!
//! The HMAC can only be checked once the master key is known, so loading
//! is split in two: [`load_metadata`] parses the structure (telling "no
//! vault yet" apart from "unreadable vault"), and
//! [`RawVault::verify_integrity`] authenticates it after unlock.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::record::StoredRecord;
use crate::crypto::{MasterKey, VerificationHash};
use crate::errors::{PassVaultError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every vault file.
const MAGIC: &[u8; 4] = b"PVLT";

/// Current binary format version.
pub const CURRENT_VERSION: u8 = 1;

/// Size of the HMAC tag appended to the file (SHA-256 = 32 bytes).
const HMAC_LEN: usize = 32;

/// Fixed-size prefix: 4 (magic) + 1 (version) + 4 (header_len).
const PREFIX_LEN: usize = 9;

// ---------------------------------------------------------------------------
// Durable state
// ---------------------------------------------------------------------------

/// Metadata stored at the beginning of a vault file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultHeader {
    /// Format version.
    pub version: u8,

    /// Verification hash of the current master secret.
    pub verification: VerificationHash,

    /// When the vault was first registered.
    pub created_at: DateTime<Utc>,

    /// Last successful save or rotation.
    pub updated_at: DateTime<Utc>,
}

impl VaultHeader {
    /// Header for a freshly registered vault.
    pub fn new(verification: VerificationHash) -> Self {
        let now = Utc::now();
        Self {
            version: CURRENT_VERSION,
            verification,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Everything the vault keeps on disk.
#[derive(Debug, Clone)]
pub struct VaultMetadata {
    pub header: VaultHeader,
    pub records: Vec<StoredRecord>,
}

/// A parsed vault file that has not been authenticated yet.
///
/// Keeps the original bytes so the HMAC is verified over exactly what
/// was written, with no re-serialization.
#[derive(Debug)]
pub struct RawVault {
    pub metadata: VaultMetadata,
    header_bytes: Vec<u8>,
    records_bytes: Vec<u8>,
    stored_hmac: Vec<u8>,
}

impl RawVault {
    /// Authenticate the file with the HMAC key of `master_key`.
    ///
    /// Call only after the verifier accepted the secret; a mismatch then
    /// means the file was modified outside PassVault.
    pub fn verify_integrity(&self, master_key: &MasterKey) -> Result<()> {
        let hmac_key = master_key.hmac_key()?;
        verify_hmac(
            hmac_key.as_slice(),
            &self.header_bytes,
            &self.records_bytes,
            &self.stored_hmac,
        )
    }

    /// Consume the raw vault, keeping only the parsed metadata.
    pub fn into_metadata(self) -> VaultMetadata {
        self.metadata
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Read and parse the vault at `path`.
///
/// Returns `Ok(None)` when no vault exists yet. A file that exists but
/// cannot be parsed is [`PassVaultError::StorageCorrupt`], never an
/// empty vault.
pub fn load_metadata(path: &Path) -> Result<Option<RawVault>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    decode(&data).map(Some)
}

/// Replace the vault at `path` with `metadata`, authenticated under
/// `master_key`.
///
/// The new file is fully written and synced under a temporary name and
/// then renamed over the old one, so a reader (or a crash) sees either
/// the old vault or the new one, never a mix.
pub fn save_metadata(path: &Path, metadata: &VaultMetadata, master_key: &MasterKey) -> Result<()> {
    let hmac_key = master_key.hmac_key()?;
    let buf = encode(metadata, hmac_key.as_slice())?;
    atomic_write(path, &buf)?;
    tracing::debug!(
        path = %path.display(),
        records = metadata.records.len(),
        "vault written"
    );
    Ok(())
}

/// Compute HMAC-SHA256 over header + records bytes.
pub fn compute_hmac(hmac_key: &[u8], header_bytes: &[u8], records_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(hmac_key)
        .map_err(|e| PassVaultError::EncryptionFailed(format!("invalid HMAC key: {e}")))?;

    mac.update(header_bytes);
    mac.update(records_bytes);

    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verify the HMAC in constant time (`Mac::verify_slice`).
pub fn verify_hmac(
    hmac_key: &[u8],
    header_bytes: &[u8],
    records_bytes: &[u8],
    expected_hmac: &[u8],
) -> Result<()> {
    let mut mac = Hmac::<Sha256>::new_from_slice(hmac_key)
        .map_err(|e| PassVaultError::EncryptionFailed(format!("invalid HMAC key: {e}")))?;

    mac.update(header_bytes);
    mac.update(records_bytes);

    mac.verify_slice(expected_hmac).map_err(|_| {
        PassVaultError::StorageCorrupt("integrity check failed — vault file was modified".into())
    })
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn encode(metadata: &VaultMetadata, hmac_key: &[u8]) -> Result<Vec<u8>> {
    let header_bytes = serde_json::to_vec(&metadata.header)
        .map_err(|e| PassVaultError::SerializationError(format!("header: {e}")))?;
    let records_bytes = serde_json::to_vec(&metadata.records)
        .map_err(|e| PassVaultError::SerializationError(format!("records: {e}")))?;

    let hmac_tag = compute_hmac(hmac_key, &header_bytes, &records_bytes)?;

    let header_len = u32::try_from(header_bytes.len()).map_err(|_| {
        PassVaultError::SerializationError(format!(
            "header length {} exceeds u32::MAX",
            header_bytes.len()
        ))
    })?;

    let total = PREFIX_LEN + header_bytes.len() + records_bytes.len() + HMAC_LEN;
    let mut buf = Vec::with_capacity(total);
    buf.extend_from_slice(MAGIC);
    buf.push(CURRENT_VERSION);
    buf.extend_from_slice(&header_len.to_le_bytes());
    buf.extend_from_slice(&header_bytes);
    buf.extend_from_slice(&records_bytes);
    buf.extend_from_slice(&hmac_tag);
    Ok(buf)
}

fn decode(data: &[u8]) -> Result<RawVault> {
    if data.len() < PREFIX_LEN + HMAC_LEN {
        return Err(corrupt("file too small to be a vault"));
    }
    if &data[0..4] != MAGIC {
        return Err(corrupt("missing PVLT magic bytes"));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(corrupt(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let header_len_u32 = u32::from_le_bytes(
        data[5..9]
            .try_into()
            .map_err(|_| corrupt("bad header length"))?,
    );
    let header_len = usize::try_from(header_len_u32)
        .map_err(|_| corrupt(format!("header length {header_len_u32} is too large")))?;

    let header_end = PREFIX_LEN
        .checked_add(header_len)
        .filter(|end| end + HMAC_LEN <= data.len())
        .ok_or_else(|| corrupt("header length exceeds file size"))?;

    let header_bytes = data[PREFIX_LEN..header_end].to_vec();
    let records_end = data.len() - HMAC_LEN;
    let records_bytes = data[header_end..records_end].to_vec();
    let stored_hmac = data[records_end..].to_vec();

    let header: VaultHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| corrupt(format!("header JSON: {e}")))?;
    header.verification.validate()?;

    let records: Vec<StoredRecord> = serde_json::from_slice(&records_bytes)
        .map_err(|e| corrupt(format!("records JSON: {e}")))?;

    Ok(RawVault {
        metadata: VaultMetadata { header, records },
        header_bytes,
        records_bytes,
        stored_hmac,
    })
}

fn corrupt(msg: impl Into<String>) -> PassVaultError {
    PassVaultError::StorageCorrupt(msg.into())
}

// ---------------------------------------------------------------------------
// Atomic replacement
// ---------------------------------------------------------------------------

fn temp_path_for(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    if let Err(e) = write_synced(&tmp_path, bytes) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    commit_temp(&tmp_path, path)?;
    sync_parent_dir(path);
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Move the finished temp file over `destination`.
///
/// On failure only the temp file is removed; the destination is never
/// touched, so the previous vault stays readable.
fn commit_temp(tmp_path: &Path, destination: &Path) -> std::io::Result<()> {
    fs::rename(tmp_path, destination).map_err(|e| {
        let _ = fs::remove_file(tmp_path);
        e
    })
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::verifier::register_with_key;
    use crate::crypto::Argon2Params;
    use tempfile::TempDir;

    fn fast() -> Argon2Params {
        Argon2Params {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn sample() -> (VaultMetadata, MasterKey) {
        let (hash, key) = register_with_key(b"format-test", &fast()).unwrap();
        let metadata = VaultMetadata {
            header: VaultHeader::new(hash),
            records: Vec::new(),
        };
        (metadata, key)
    }

    #[test]
    fn missing_file_is_not_found_not_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_metadata(&dir.path().join("none.pv")).unwrap().is_none());
    }

    #[test]
    fn save_then_load_verifies() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.pv");
        let (metadata, key) = sample();

        save_metadata(&path, &metadata, &key).unwrap();
        let raw = load_metadata(&path).unwrap().unwrap();
        raw.verify_integrity(&key).unwrap();
        assert_eq!(raw.metadata.header.verification, metadata.header.verification);
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.pv");
        fs::write(&path, b"definitely not a vault, but long enough to pass the size check")
            .unwrap();
        assert!(matches!(
            load_metadata(&path),
            Err(PassVaultError::StorageCorrupt(_))
        ));
    }

    #[test]
    fn oversized_header_length_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.pv");
        let (metadata, key) = sample();
        save_metadata(&path, &metadata, &key).unwrap();

        let mut data = fs::read(&path).unwrap();
        data[5..9].copy_from_slice(&u32::MAX.to_le_bytes());
        fs::write(&path, &data).unwrap();

        assert!(matches!(
            load_metadata(&path),
            Err(PassVaultError::StorageCorrupt(_))
        ));
    }

    #[test]
    fn tampered_tag_fails_integrity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.pv");
        let (metadata, key) = sample();
        save_metadata(&path, &metadata, &key).unwrap();

        let mut data = fs::read(&path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        fs::write(&path, &data).unwrap();

        let raw = load_metadata(&path).unwrap().unwrap();
        assert!(matches!(
            raw.verify_integrity(&key),
            Err(PassVaultError::StorageCorrupt(_))
        ));
    }

    #[test]
    fn failed_write_leaves_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.pv");
        let (metadata, key) = sample();
        save_metadata(&path, &metadata, &key).unwrap();
        let before = fs::read(&path).unwrap();

        // A directory squatting on the temp name makes the write fail.
        fs::create_dir(temp_path_for(&path)).unwrap();
        assert!(save_metadata(&path, &metadata, &key).is_err());
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn failed_rename_leaves_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.pv");
        let (metadata, key) = sample();
        save_metadata(&path, &metadata, &key).unwrap();
        let before = fs::read(&path).unwrap();

        // No temp file to move, so the rename itself fails.
        let tmp = temp_path_for(&path);
        assert!(commit_temp(&tmp, &path).is_err());
        assert_eq!(fs::read(&path).unwrap(), before);
        assert!(load_metadata(&path).unwrap().is_some());
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let tmp = dir.path().join(".vault.pv.tmp");
        fs::write(&tmp, b"staged").unwrap();

        // A non-empty directory cannot be replaced by a file.
        let occupied = dir.path().join("occupied");
        fs::create_dir(&occupied).unwrap();
        fs::write(occupied.join("keep"), b"x").unwrap();

        assert!(commit_temp(&tmp, &occupied).is_err());
        assert!(!tmp.exists());
        assert_eq!(fs::read(occupied.join("keep")).unwrap(), b"x");
    }

    #[cfg(unix)]
    #[test]
    fn vault_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.pv");
        let (metadata, key) = sample();
        save_metadata(&path, &metadata, &key).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
