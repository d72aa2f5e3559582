//! Durable, ordered, unique-by-value credential set.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};

use super::CredentialError;
use crate::db::credential_repo::{self, CredentialRow};
use crate::db::Database;
use crate::secrets::{mask_secret, CredentialCipher, SecretError};

pub struct CredentialStore {
    db: Database,
    cipher: Option<CredentialCipher>,
}

impl CredentialStore {
    /// Store that keeps values as plain text.
    pub fn new(db: Database) -> Self {
        Self { db, cipher: None }
    }

    /// Store that seals new values with the given cipher.
    pub fn with_cipher(db: Database, cipher: CredentialCipher) -> Self {
        Self {
            db,
            cipher: Some(cipher),
        }
    }

    fn open(&self, row: &CredentialRow) -> Result<String, CredentialError> {
        if !row.encrypted {
            return Ok(row.value.clone());
        }
        let cipher = self.cipher.as_ref().ok_or_else(|| {
            SecretError::InvalidKey(format!(
                "credential {} is encrypted but no key is configured",
                row.id
            ))
        })?;
        Ok(cipher.decrypt(&row.value)?)
    }

    fn plain_values(&self) -> Result<Vec<(CredentialRow, String)>, CredentialError> {
        credential_repo::list(&self.db)?
            .into_iter()
            .map(|row| {
                let value = self.open(&row)?;
                Ok((row, value))
            })
            .collect()
    }

    /// Adds a credential at the end of the rotation order.
    ///
    /// The value is trimmed. Returns `Ok(false)` when it is already present.
    pub fn add(&self, secret: &str) -> Result<bool, CredentialError> {
        let value = secret.trim();
        if value.is_empty() {
            return Err(CredentialError::EmptyValue);
        }
        if self.plain_values()?.iter().any(|(_, v)| v == value) {
            log::info!("Credential {} already stored", mask_secret(value));
            return Ok(false);
        }

        let (stored, encrypted) = match &self.cipher {
            Some(cipher) => (cipher.encrypt(value)?, true),
            None => (value.to_string(), false),
        };
        credential_repo::append(&self.db, &stored, encrypted, &Utc::now().to_rfc3339())?;
        log::info!("Added credential {}", mask_secret(value));
        Ok(true)
    }

    /// Removes a credential by value. Returns false when not present.
    pub fn remove(&self, secret: &str) -> Result<bool, CredentialError> {
        let value = secret.trim();
        let found = self
            .plain_values()?
            .into_iter()
            .find(|(_, v)| v == value)
            .map(|(row, _)| row.id);
        match found {
            Some(id) => {
                credential_repo::delete(&self.db, id)?;
                log::info!("Removed credential {}", mask_secret(value));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the credential at a rotation position.
    pub fn remove_at(&self, index: usize) -> Result<(), CredentialError> {
        let rows = credential_repo::list(&self.db)?;
        let row = rows.get(index).ok_or(CredentialError::IndexOutOfRange {
            index,
            count: rows.len(),
        })?;
        credential_repo::delete(&self.db, row.id)?;
        log::info!("Removed credential at position {}", index);
        Ok(())
    }

    /// All credentials in rotation order.
    pub fn list(&self) -> Result<Vec<SecretString>, CredentialError> {
        Ok(self
            .plain_values()?
            .into_iter()
            .map(|(_, v)| SecretString::from(v))
            .collect())
    }

    /// Display-safe forms, in rotation order.
    pub fn masked(&self) -> Result<Vec<String>, CredentialError> {
        Ok(self
            .list()?
            .iter()
            .map(|s| mask_secret(s.expose_secret()))
            .collect())
    }

    pub fn count(&self) -> Result<usize, CredentialError> {
        Ok(credential_repo::count(&self.db)?)
    }

    pub fn is_empty(&self) -> Result<bool, CredentialError> {
        Ok(self.count()? == 0)
    }
}
