use thiserror::Error;

/// Errors that can occur within the memory and message stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row with this id belongs to the requesting user. Missing rows and
    /// rows owned by someone else produce the same error.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The owning user id does not exist.
    #[error("Unknown owner: {0}")]
    UnknownOwner(String),

    #[error(transparent)]
    Invalid(#[from] dlo_core::DloError),

    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    pub(crate) fn memory_not_found(id: &str) -> Self {
        StoreError::NotFound {
            kind: "memory",
            id: id.to_string(),
        }
    }

    pub(crate) fn message_not_found(id: &str) -> Self {
        StoreError::NotFound {
            kind: "message",
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
