use std::time::Duration;

use async_trait::async_trait;
use dlo_core::config::SmtpConfig;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Tokio1Executor,
};
use tracing::{info, warn};

use crate::{error::NotifyError, notifier::Notifier, types::OutgoingEmail};

/// Port on which the server expects TLS from the first byte.
const IMPLICIT_TLS_PORT: u16 = 465;

/// SMTP relay transport.
///
/// Every send opens a fresh connection, upgrades it (STARTTLS, or implicit
/// TLS on port 465), authenticates when credentials are configured, hands
/// the message off and closes. Connect and command timeouts come from
/// `SmtpConfig::timeout_secs`, so a hung relay cannot stall a cycle.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let host = config.relay_host().unwrap_or("localhost").to_string();
        let from: Mailbox = config.from_address.parse()?;

        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)?
        };
        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));
        if let Some((user, pass)) = config.credentials() {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            host,
        })
    }

    async fn try_send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        let message = email.to_message(&self.from)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, email: &OutgoingEmail) -> bool {
        match self.try_send(email).await {
            Ok(()) => {
                info!(to = %email.to, relay = %self.host, "email handed to relay");
                true
            }
            Err(e) => {
                warn!(to = %email.to, relay = %self.host, error = %e, "email send failed");
                false
            }
        }
    }
}
