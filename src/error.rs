//! Typed failures for the store, ledger, and access gate. The presentation
//! layer turns these into footer messages; nothing here is fatal to the
//! process.

use rusqlite::{Error as SqlError, ErrorCode};
use thiserror::Error;

/// Result alias used by every core operation.
pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("PCB ID {0} already exists.")]
    DuplicatePcb(String),

    #[error("Model {0} already exists.")]
    DuplicateModel(String),

    #[error("Username {0} already exists.")]
    DuplicateUsername(String),

    #[error("PCB ID {0} not found in entries or rework logs.")]
    NotFound(String),

    /// A required field was blank after trimming.
    #[error("{0} cannot be empty.")]
    Validation(&'static str),

    /// The session is not allowed to run the named action.
    #[error("{0} requires an admin login.")]
    Forbidden(&'static str),

    #[error("password hashing failed: {0}")]
    Credential(#[from] bcrypt::BcryptError),

    #[error("{action}: {source}")]
    Store {
        action: &'static str,
        #[source]
        source: SqlError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    /// True for every flavour of "already exists".
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            TrackerError::DuplicatePcb(_)
                | TrackerError::DuplicateModel(_)
                | TrackerError::DuplicateUsername(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackerError::NotFound(_))
    }
}

/// Attach a short action description to raw SQLite failures, the same way
/// `anyhow::Context` decorates errors elsewhere in the crate.
pub(crate) trait StoreContext<T> {
    fn store_context(self, action: &'static str) -> TrackerResult<T>;
}

impl<T> StoreContext<T> for Result<T, SqlError> {
    fn store_context(self, action: &'static str) -> TrackerResult<T> {
        self.map_err(|source| TrackerError::Store { action, source })
    }
}

/// Whether a SQLite error is a UNIQUE/constraint violation.
pub(crate) fn is_constraint_violation(err: &SqlError) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    )
}

/// Trim a required field and reject it when nothing is left.
pub fn require<'a>(field: &'static str, value: &'a str) -> TrackerResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(TrackerError::Validation(field))
    } else {
        Ok(trimmed)
    }
}
