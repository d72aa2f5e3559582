//! Credential rotation cursor.
//!
//! The rotator decides which credential a logical call tries first and
//! where the next call starts. The cursor survives restarts through a
//! [`CursorStore`]; a failure to persist it is logged, never fatal.

use std::sync::{Arc, Mutex};

use secrecy::SecretString;

use super::store::CredentialStore;
use super::CredentialError;
use crate::db::{settings_repo, Database};

/// Supplies the ordered credential set.
pub trait CredentialSource: Send + Sync {
    fn credentials(&self) -> Result<Vec<SecretString>, CredentialError>;
}

/// Persists the rotation cursor.
pub trait CursorStore: Send + Sync {
    fn load(&self) -> Result<Option<usize>, CredentialError>;
    fn save(&self, index: usize) -> Result<(), CredentialError>;
}

impl CredentialSource for CredentialStore {
    fn credentials(&self) -> Result<Vec<SecretString>, CredentialError> {
        self.list()
    }
}

/// Fixed in-memory credential list.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: Vec<String>,
}

impl StaticCredentials {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl CredentialSource for StaticCredentials {
    fn credentials(&self) -> Result<Vec<SecretString>, CredentialError> {
        Ok(self
            .values
            .iter()
            .map(|v| SecretString::from(v.clone()))
            .collect())
    }
}

/// Cursor kept under `rotation_cursor` in the settings table.
#[derive(Clone)]
pub struct SettingsCursor {
    db: Database,
}

impl SettingsCursor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl CursorStore for SettingsCursor {
    fn load(&self) -> Result<Option<usize>, CredentialError> {
        Ok(settings_repo::get_usize(
            &self.db,
            settings_repo::ROTATION_CURSOR_KEY,
        )?)
    }

    fn save(&self, index: usize) -> Result<(), CredentialError> {
        settings_repo::set(
            &self.db,
            settings_repo::ROTATION_CURSOR_KEY,
            &index.to_string(),
        )?;
        Ok(())
    }
}

/// Process-local cursor, used when nothing should outlive the process.
#[derive(Debug, Default)]
pub struct MemoryCursor {
    value: Mutex<Option<usize>>,
}

impl MemoryCursor {
    pub fn starting_at(index: usize) -> Self {
        Self {
            value: Mutex::new(Some(index)),
        }
    }

    /// Current raw value, for inspection.
    pub fn get(&self) -> Option<usize> {
        match self.value.lock() {
            Ok(g) => *g,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl CursorStore for MemoryCursor {
    fn load(&self) -> Result<Option<usize>, CredentialError> {
        Ok(self.get())
    }

    fn save(&self, index: usize) -> Result<(), CredentialError> {
        let mut guard = match self.value.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Rotation cursor lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        *guard = Some(index);
        Ok(())
    }
}

/// Owns the credential set view and the rotation cursor.
#[derive(Clone)]
pub struct CredentialRotator {
    source: Arc<dyn CredentialSource>,
    cursor: Arc<dyn CursorStore>,
}

impl CredentialRotator {
    pub fn new(source: Arc<dyn CredentialSource>, cursor: Arc<dyn CursorStore>) -> Self {
        Self { source, cursor }
    }

    /// Reads the current credential set. Fails with `NoCredentials` when empty.
    pub fn snapshot(&self) -> Result<Vec<SecretString>, CredentialError> {
        let credentials = self.source.credentials()?;
        if credentials.is_empty() {
            return Err(CredentialError::NoCredentials);
        }
        Ok(credentials)
    }

    /// True when at least one credential is configured.
    pub fn has_credentials(&self) -> Result<bool, CredentialError> {
        Ok(!self.source.credentials()?.is_empty())
    }

    /// Persisted cursor clamped into `0..count`; out-of-range values restart at 0.
    pub fn select_start_index(&self, count: usize) -> Result<usize, CredentialError> {
        if count == 0 {
            return Err(CredentialError::NoCredentials);
        }
        let stored = match self.cursor.load() {
            Ok(v) => v.unwrap_or(0),
            Err(e) => {
                log::warn!("Failed to read rotation cursor, starting at 0: {}", e);
                0
            }
        };
        Ok(if stored < count { stored } else { 0 })
    }

    /// Moves past a failed credential and persists the new cursor.
    pub fn advance(&self, index: usize, count: usize) -> Result<usize, CredentialError> {
        if count == 0 {
            return Err(CredentialError::NoCredentials);
        }
        let next = (index + 1) % count;
        self.persist(next);
        Ok(next)
    }

    /// Pins the cursor on the credential that just worked.
    pub fn record_success(&self, index: usize) {
        self.persist(index);
    }

    fn persist(&self, index: usize) {
        if let Err(e) = self.cursor.save(index) {
            log::warn!("Failed to persist rotation cursor {}: {}", index, e);
        }
    }
}
