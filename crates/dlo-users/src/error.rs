use thiserror::Error;

/// All user-layer errors. Kept separate from DloError so callers can tell
/// bad input apart from storage failures.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Email already registered: {0}")]
    AlreadyExists(String),

    #[error(transparent)]
    Invalid(#[from] dlo_core::DloError),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, UserError>;
