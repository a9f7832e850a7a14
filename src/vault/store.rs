//! In-memory working set of an unlocked session.
//!
//! `RecordStore` keeps records in insertion order and is the only place
//! fields get mutated, so the whitespace rule holds from the moment a
//! value enters the session rather than only at save time.

use crate::errors::{PassVaultError, Result};

use super::record::{Completeness, CredentialRecord, Field, RecordId};

/// Explicit answer to a destructive action, obtained by the caller
/// before it reaches the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl Confirmation {
    pub fn from_bool(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }

    pub(crate) fn require(self) -> Result<()> {
        match self {
            Confirmation::Confirmed => Ok(()),
            Confirmation::Declined => Err(PassVaultError::ConfirmationRequired),
        }
    }
}

/// Records split by completeness, ready for the save path.
#[derive(Debug)]
pub struct SavePlan<'a> {
    /// Records with all three fields filled, in insertion order.
    pub complete: Vec<&'a CredentialRecord>,
    /// Records with some but not all fields filled.
    pub incomplete: Vec<RecordId>,
    /// Number of all-empty records left out.
    pub dropped: usize,
}

/// Ordered collection of decrypted records.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<CredentialRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_records(records: Vec<CredentialRecord>) -> Self {
        Self { records }
    }

    /// All records, in insertion order.
    pub fn records(&self) -> &[CredentialRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&CredentialRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append an empty record and return its id.
    pub fn add_blank(&mut self) -> RecordId {
        let record = CredentialRecord::blank();
        let id = record.id();
        self.records.push(record);
        id
    }

    /// Trim `value` and store it in `field` of record `id`.
    ///
    /// A value with whitespace left inside after trimming is rejected and
    /// the previous value is kept.
    pub fn mutate(&mut self, id: RecordId, field: Field, value: &str) -> Result<()> {
        let trimmed = normalize_field(field, value)?;
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(PassVaultError::RecordNotFound(id))?;
        record.set(field, trimmed);
        Ok(())
    }

    /// Delete record `id`. Dropping the record wipes its fields.
    pub fn remove(&mut self, id: RecordId, confirmation: Confirmation) -> Result<()> {
        confirmation.require()?;
        let index = self
            .records
            .iter()
            .position(|r| r.id() == id)
            .ok_or(PassVaultError::RecordNotFound(id))?;
        self.records.remove(index);
        Ok(())
    }

    /// Partition records for saving. The save must be refused when
    /// `incomplete` is non-empty.
    pub fn prepare_for_save(&self) -> SavePlan<'_> {
        let mut plan = SavePlan {
            complete: Vec::new(),
            incomplete: Vec::new(),
            dropped: 0,
        };
        for record in &self.records {
            match record.completeness() {
                Completeness::Complete => plan.complete.push(record),
                Completeness::Partial => plan.incomplete.push(record.id()),
                Completeness::Empty => plan.dropped += 1,
            }
        }
        plan
    }

    /// Forget all-empty records once a save has gone through.
    pub(crate) fn discard_empty(&mut self) {
        self.records
            .retain(|r| r.completeness() != Completeness::Empty);
    }
}

/// Trim a field value and reject internal whitespace.
pub fn normalize_field(field: Field, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.chars().any(char::is_whitespace) {
        return Err(PassVaultError::Validation(format!(
            "{field} cannot contain spaces between characters"
        )));
    }
    Ok(trimmed.to_string())
}
