use lettre::message::{header::ContentType, Mailbox};
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// A plain-text email ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    /// Recipient address, already validated upstream.
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Assemble the RFC 5322 message with `from` as sender.
    pub fn to_message(&self, from: &Mailbox) -> Result<lettre::Message, NotifyError> {
        let message = lettre::Message::builder()
            .from(from.clone())
            .to(self.to.parse::<Mailbox>()?)
            .subject(self.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(self.body.clone())?;
        Ok(message)
    }
}
