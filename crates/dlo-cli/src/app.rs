use std::sync::Arc;

use anyhow::Context;
use dlo_core::config::DloConfig;
use dlo_memories::{MemoryStore, MessageStore};
use dlo_notify::{build_notifier, Notifier};
use dlo_scheduler::{DeliveryEngine, MessageTemplate};
use dlo_users::{account, User};
use rusqlite::Connection;
use tracing::info;

/// Everything a command needs: config plus a way to open fresh connections.
///
/// Each subsystem gets its own connection, the same split the long-running
/// scheduler and request handling use.
pub struct App {
    pub config: DloConfig,
}

impl App {
    /// Prepare the database file and run the (idempotent) schema setup.
    pub fn open(config: DloConfig) -> anyhow::Result<Self> {
        let db_path = &config.database.path;
        ensure_parent_dir(db_path);
        info!(path = %db_path, "opening SQLite database");

        let conn = dlo_users::db::open(db_path)?;
        dlo_memories::db::init_db(&conn)?;
        info!("database migrations complete");

        Ok(Self { config })
    }

    pub fn connection(&self) -> anyhow::Result<Connection> {
        Ok(dlo_users::db::open(&self.config.database.path)?)
    }

    pub fn memories(&self) -> anyhow::Result<MemoryStore> {
        Ok(MemoryStore::open(self.connection()?)?)
    }

    pub fn messages(&self) -> anyhow::Result<MessageStore> {
        Ok(MessageStore::open(self.connection()?)?)
    }

    pub fn notifier(&self) -> anyhow::Result<Arc<dyn Notifier>> {
        build_notifier(&self.config.smtp).context("invalid SMTP settings")
    }

    /// A delivery engine over its own connection.
    pub fn engine(&self) -> anyhow::Result<DeliveryEngine> {
        let template = MessageTemplate::new(self.config.delivery.product_name.clone());
        Ok(DeliveryEngine::new(self.memories()?, self.notifier()?).with_template(template))
    }

    /// Look up the account a command acts for.
    pub fn user_by_email(&self, email: &str) -> anyhow::Result<User> {
        account::find_user_by_email(&self.connection()?, email)?
            .with_context(|| format!("no account with email {}", email.trim()))
    }
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
