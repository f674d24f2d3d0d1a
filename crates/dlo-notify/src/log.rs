use async_trait::async_trait;
use lettre::message::Mailbox;
use tracing::info;

use crate::{error::NotifyError, notifier::Notifier, types::OutgoingEmail};

/// Development transport: writes the composed message to the log and
/// reports success. Never fails.
pub struct LogNotifier {
    from: Mailbox,
}

impl LogNotifier {
    pub fn new(from_address: &str) -> Result<Self, NotifyError> {
        Ok(Self {
            from: from_address.parse()?,
        })
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, email: &OutgoingEmail) -> bool {
        match email.to_message(&self.from) {
            Ok(message) => {
                let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
                info!(to = %email.to, "email (simulated):\n{raw}");
            }
            Err(e) => {
                info!(
                    to = %email.to,
                    subject = %email.subject,
                    reason = %e,
                    "email (simulated, not RFC 5322):\n{}",
                    email.body
                );
            }
        }
        true
    }
}
