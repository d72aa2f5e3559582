use std::path::PathBuf;

use scriptloom::credentials::CredentialError;
use scriptloom::db::DatabaseError;
use scriptloom::driver::DriverError;
use scriptloom::export::ExportError;
use scriptloom::queue::QueueError;
use scriptloom::remote::CallError;
use scriptloom::secrets::SecretError;
use scriptloom::{ConfigError, ScriptloomError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ScriptloomError),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Invalid(String),

    #[error("Failed to install logging: {0}")]
    Logging(String),

    #[error("Failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

macro_rules! via_core {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CliError {
                fn from(err: $ty) -> Self {
                    CliError::Core(err.into())
                }
            }
        )*
    };
}

via_core!(
    ConfigError,
    DatabaseError,
    CredentialError,
    SecretError,
    CallError,
    DriverError,
    QueueError,
    ExportError,
);
