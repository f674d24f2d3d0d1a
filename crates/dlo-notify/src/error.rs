use thiserror::Error;

/// Causes of a failed hand-off. Logged by the notifier that hit them; callers
/// of [`crate::Notifier::send`] only ever see a boolean.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// A sender or recipient address did not parse.
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The message could not be assembled.
    #[error("Message build failed: {0}")]
    Build(#[from] lettre::error::Error),

    /// Connection, TLS, authentication or SMTP protocol failure.
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}
