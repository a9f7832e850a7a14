//! Vault module: credential records, persistence, sessions and rotation.
//!
//! This module provides:
//! - `CredentialRecord`, `StoredRecord` and `RecordId` (`record`)
//! - The in-memory `RecordStore` with field validation (`store`)
//! - Binary vault file format with HMAC integrity (`format`)
//! - `Vault` / `Session`, the unlock-edit-save interface (`session`)
//! - The master key `RotationCoordinator` (`rotation`)

pub mod format;
pub mod record;
pub mod rotation;
pub mod session;
pub mod store;

// Re-export the most commonly used items.
pub use format::{VaultHeader, VaultMetadata};
pub use record::{CredentialRecord, Field, RecordId, StoredRecord};
pub use rotation::{RotationCoordinator, RotationReport, RotationState};
pub use session::{SaveReport, Session, UnlockResult, Vault};
pub use store::{Confirmation, RecordStore};
