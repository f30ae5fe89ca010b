use thiserror::Error;

use crate::models::Slot;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage quota exceeded: {needed} bytes requested, limit is {limit}")]
    QuotaExceeded { needed: usize, limit: usize },

    #[error("Backup is not a JSON object")]
    ImportNotObject,

    #[error("Backup is missing the '{0}' collection or it is not a list")]
    ImportShape(Slot),

    #[error("Backup has an invalid record in '{slot}': {reason}")]
    ImportRecord { slot: Slot, reason: String },

    #[error("No {slot} record with id '{id}'")]
    NotFound { slot: Slot, id: String },

    #[error("Index {index} is out of range for a collection of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Rejected form input; nothing has been written when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    EmptyTitle,

    #[error("Invalid due date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

impl StoreError {
    pub fn not_found(slot: Slot, id: impl Into<String>) -> Self {
        Self::NotFound { slot, id: id.into() }
    }
}

/// Failure of a user action. Validation failures leave the store untouched.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ActionResult<T> = Result<T, ActionError>;

impl ActionError {
    /// True when an import was refused because the file is not a backup.
    pub fn is_rejected_import(&self) -> bool {
        matches!(
            self,
            ActionError::Store(
                StoreError::Json(_)
                    | StoreError::ImportNotObject
                    | StoreError::ImportShape(_)
                    | StoreError::ImportRecord { .. }
            )
        )
    }
}
