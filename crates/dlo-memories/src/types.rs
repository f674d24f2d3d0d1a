use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Delivery state of a memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryStatus {
    /// Waiting for its send_at; the only status the delivery cycle picks up.
    Scheduled,
    /// Handed to the transport; `sent_at` is set.
    Sent,
    /// The transport refused or errored. Only a manual send retries it.
    Failed,
}

impl MemoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryStatus::Scheduled => "scheduled",
            MemoryStatus::Sent => "sent",
            MemoryStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for MemoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MemoryStatus::Scheduled),
            "sent" => Ok(MemoryStatus::Sent),
            "failed" => Ok(MemoryStatus::Failed),
            other => Err(format!("unknown memory status: {other}")),
        }
    }
}

/// A persisted memory record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// UUIDv7 string, primary key.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    pub title: String,
    pub recipient_email: String,
    /// Free-text body as written by the owner.
    pub message: String,
    /// When the memory becomes due (UTC).
    pub send_at: DateTime<Utc>,
    pub status: MemoryStatus,
    pub created_at: DateTime<Utc>,
    /// Set together with `status = sent`; absent otherwise.
    pub sent_at: Option<DateTime<Utc>>,
}

/// Input for [`crate::MemoryStore::create`]. Text fields are validated and
/// trimmed by the store.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub title: String,
    pub recipient_email: String,
    pub message: String,
    pub send_at: DateTime<Utc>,
}

/// Result of one delivery attempt, as recorded on the memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent { at: DateTime<Utc> },
    Failed,
}

impl DeliveryOutcome {
    pub fn status(&self) -> MemoryStatus {
        match self {
            DeliveryOutcome::Sent { .. } => MemoryStatus::Sent,
            DeliveryOutcome::Failed => MemoryStatus::Failed,
        }
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        match self {
            DeliveryOutcome::Sent { at } => Some(*at),
            DeliveryOutcome::Failed => None,
        }
    }
}

/// A manually managed message with a date-only delivery day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub recipient: String,
    pub content: String,
    pub delivery_date: NaiveDate,
    /// Stored and returned but never set by any code path.
    pub sent: bool,
    pub user_id: String,
}

/// Editable fields of a [`Message`], used for both create and update.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub recipient: String,
    pub content: String,
    pub delivery_date: NaiveDate,
}
