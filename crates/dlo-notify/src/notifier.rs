use std::sync::Arc;

use async_trait::async_trait;
use dlo_core::config::SmtpConfig;
use tracing::info;

use crate::{error::NotifyError, log::LogNotifier, smtp::SmtpNotifier, types::OutgoingEmail};

/// Common interface for every outbound email transport.
///
/// Implementations must be `Send + Sync` so one instance can be shared by
/// the delivery engine and request handlers.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable lowercase identifier used in logs (e.g. `"smtp"`).
    fn name(&self) -> &str;

    /// Attempt delivery of `email`.
    ///
    /// Returns `true` once the transport accepted the message. Every error
    /// is logged with its cause and reported as `false`; nothing propagates.
    async fn send(&self, email: &OutgoingEmail) -> bool;
}

/// Pick the transport for `config`: SMTP when a relay host is set, the
/// log transport otherwise. Fails only on a malformed from-address or relay.
pub fn build_notifier(config: &SmtpConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match config.relay_host() {
        Some(host) => {
            info!(%host, port = config.port, "email transport: SMTP");
            Ok(Arc::new(SmtpNotifier::new(config)?))
        }
        None => {
            info!("email transport: log only (no SMTP host configured)");
            Ok(Arc::new(LogNotifier::new(&config.from_address)?))
        }
    }
}
