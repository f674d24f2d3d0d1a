use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account. Owns memories and messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// UUIDv7 primary key.
    pub id: String,
    /// Always lowercase; unique across the table.
    pub email: String,
    pub name: String,
    /// Argon2id PHC string (salt embedded). Never serialised.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
