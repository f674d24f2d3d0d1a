use dlo_memories::StoreError;
use thiserror::Error;

/// Errors that can occur within the delivery subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Reading due memories or recording an outcome failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The delivery loop was asked to run with a zero period.
    #[error("Delivery interval must be positive")]
    InvalidInterval,
}

impl SchedulerError {
    /// True when the target memory does not exist or belongs to someone else.
    pub fn is_not_found(&self) -> bool {
        match self {
            SchedulerError::Store(e) => e.is_not_found(),
            SchedulerError::InvalidInterval => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
