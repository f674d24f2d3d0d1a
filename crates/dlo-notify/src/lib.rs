pub mod error;
pub mod log;
pub mod notifier;
pub mod smtp;
pub mod types;

pub use error::NotifyError;
pub use log::LogNotifier;
pub use notifier::{build_notifier, Notifier};
pub use smtp::SmtpNotifier;
pub use types::OutgoingEmail;
