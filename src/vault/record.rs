//! Credential records, in memory and at rest.
//!
//! A [`CredentialRecord`] holds plaintext while a session is unlocked and
//! wipes its strings when dropped. A [`StoredRecord`] is the persisted
//! form: same id, URL and user id, with the password replaced by its
//! codec blob.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::EncryptedField;
use crate::errors::PassVaultError;

/// Opaque, stable identifier of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// A fresh random id.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The 16 id bytes, used as associated data by the codec.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The editable fields of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    UserId,
    Password,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Url => "url",
            Field::UserId => "user-id",
            Field::Password => "password",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = PassVaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "url" => Ok(Field::Url),
            "user-id" | "user_id" | "userid" => Ok(Field::UserId),
            "password" | "pw" => Ok(Field::Password),
            other => Err(PassVaultError::Validation(format!(
                "unknown field '{other}' (expected url, user-id or password)"
            ))),
        }
    }
}

/// Completeness of a record, as judged when saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// All three fields are empty.
    Empty,
    /// Some, but not all, fields are filled in.
    Partial,
    /// URL, user id and password are all filled in.
    Complete,
}

/// A decrypted credential, live only inside an unlocked session.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CredentialRecord {
    #[zeroize(skip)]
    id: RecordId,
    url: String,
    user_id: String,
    password: String,
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("user_id", &self.user_id)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl CredentialRecord {
    /// A record with a fresh id and every field empty.
    pub fn blank() -> Self {
        Self {
            id: RecordId::new(),
            url: String::new(),
            user_id: String::new(),
            password: String::new(),
        }
    }

    /// Rebuild a record decrypted from storage.
    pub(crate) fn restore(id: RecordId, url: String, user_id: String, password: String) -> Self {
        Self {
            id,
            url,
            user_id,
            password,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Url => &self.url,
            Field::UserId => &self.user_id,
            Field::Password => &self.password,
        }
    }

    /// Replace a field, wiping the old value. Callers validate first.
    pub(crate) fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Url => &mut self.url,
            Field::UserId => &mut self.user_id,
            Field::Password => &mut self.password,
        };
        slot.zeroize();
        *slot = value;
    }

    pub fn completeness(&self) -> Completeness {
        let filled = [&self.url, &self.user_id, &self.password]
            .iter()
            .filter(|v| !v.is_empty())
            .count();
        match filled {
            0 => Completeness::Empty,
            3 => Completeness::Complete,
            _ => Completeness::Partial,
        }
    }
}

/// A record as persisted: the password is a codec blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub url: String,
    pub user_id: String,
    pub password: EncryptedField,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_record_is_empty() {
        let record = CredentialRecord::blank();
        assert_eq!(record.completeness(), Completeness::Empty);
    }

    #[test]
    fn completeness_levels() {
        let mut record = CredentialRecord::blank();
        record.set(Field::Url, "a".into());
        record.set(Field::UserId, "b".into());
        assert_eq!(record.completeness(), Completeness::Partial);
        record.set(Field::Password, "c".into());
        assert_eq!(record.completeness(), Completeness::Complete);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(CredentialRecord::blank().id(), CredentialRecord::blank().id());
    }

    #[test]
    fn debug_hides_password() {
        let mut record = CredentialRecord::blank();
        record.set(Field::Password, "s3cret".into());
        assert!(!format!("{record:?}").contains("s3cret"));
    }

    #[test]
    fn parses_field_names() {
        assert_eq!("url".parse::<Field>().unwrap(), Field::Url);
        assert_eq!("user-id".parse::<Field>().unwrap(), Field::UserId);
        assert_eq!("Password".parse::<Field>().unwrap(), Field::Password);
        assert!("email".parse::<Field>().is_err());
        // `id` would be confused with the record id.
        assert!("id".parse::<Field>().is_err());
    }
}
