use thiserror::Error;

#[derive(Debug, Error)]
pub enum DloError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required field was empty after trimming.
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid email address {address:?}: {reason}")]
    InvalidEmail { address: String, reason: String },

    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("Invalid timestamp {input:?}: expected an ISO-8601 date-time")]
    InvalidTimestamp { input: String },

    #[error("Invalid date {input:?}: expected YYYY-MM-DD")]
    InvalidDate { input: String },
}

impl DloError {
    /// Short error code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            DloError::Config(_) => "CONFIG_ERROR",
            DloError::MissingField { .. } => "MISSING_FIELD",
            DloError::InvalidEmail { .. } => "INVALID_EMAIL",
            DloError::WeakPassword { .. } => "WEAK_PASSWORD",
            DloError::InvalidTimestamp { .. } => "INVALID_TIMESTAMP",
            DloError::InvalidDate { .. } => "INVALID_DATE",
        }
    }
}

pub type Result<T> = std::result::Result<T, DloError>;
