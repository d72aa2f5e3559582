//! Credential set persistence and rotation.

pub mod rotator;
pub mod store;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::secrets::SecretError;

pub use rotator::{CredentialRotator, CredentialSource, CursorStore, MemoryCursor, SettingsCursor, StaticCredentials};
pub use store::CredentialStore;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("No API credentials configured")]
    NoCredentials,

    #[error("Credential value is empty")]
    EmptyValue,

    #[error("Credential index {index} out of range (have {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Credential storage error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Credential secret error: {0}")]
    Secret(#[from] SecretError),
}
