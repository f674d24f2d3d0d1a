use chrono::{DateTime, Utc};
use dlo_core::{
    time::{self, format_ts},
    types::new_id,
    validate,
};
use dlo_users::db::{opt_ts_column, ts_column};
use rusqlite::{params, types::Type, Connection, ErrorCode};
use tracing::{debug, info, warn};

use crate::db::{init_db, lock, share, SharedConnection};
use crate::error::{Result, StoreError};
use crate::types::{DeliveryOutcome, Memory, MemoryStatus, NewMemory};

const MEMORY_COLUMNS: &str =
    "id, user_id, title, recipient_email, message, send_at, status, created_at, sent_at";

/// Store for scheduled memories.
///
/// Cloning is cheap and shares the underlying connection. The delivery
/// engine should be given a store built on its own connection so that a
/// long cycle never waits on request handling.
#[derive(Clone)]
pub struct MemoryStore {
    db: SharedConnection,
}

impl MemoryStore {
    /// Take ownership of a connection, initialising the schema.
    pub fn open(conn: Connection) -> Result<Self> {
        Self::new(share(conn))
    }

    /// Wrap a connection that other stores of the same context also use.
    pub fn new(db: SharedConnection) -> Result<Self> {
        init_db(&lock(&db))?;
        Ok(Self { db })
    }

    pub fn connection(&self) -> &SharedConnection {
        &self.db
    }

    /// Schedule a new memory in `scheduled` status.
    ///
    /// Title and message must be non-empty and the recipient a valid email
    /// address. A `send_at` in the past is accepted; the next cycle sends it.
    /// `send_at` is truncated to microseconds and must fall within years
    /// 0000 to 9999.
    pub fn create(&self, owner_id: &str, new: NewMemory) -> Result<Memory> {
        let memory = Memory {
            id: new_id(),
            user_id: owner_id.to_string(),
            title: validate::required("title", &new.title)?,
            recipient_email: validate::email_address(&new.recipient_email)?,
            message: validate::required("message", &new.message)?,
            send_at: time::storable(new.send_at)?,
            status: MemoryStatus::Scheduled,
            created_at: time::now(),
            sent_at: None,
        };

        let conn = lock(&self.db);
        let inserted = conn.execute(
            "INSERT INTO memories
             (id, user_id, title, recipient_email, message, send_at, status, created_at, sent_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)",
            params![
                memory.id,
                memory.user_id,
                memory.title,
                memory.recipient_email,
                memory.message,
                format_ts(memory.send_at),
                memory.status.as_str(),
                format_ts(memory.created_at),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::UnknownOwner(owner_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        info!(memory_id = %memory.id, user_id = %owner_id, send_at = %memory.send_at, "memory scheduled");
        Ok(memory)
    }

    /// All memories of `owner_id`, newest first.
    pub fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Memory>> {
        let conn = lock(&self.db);
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let memories = stmt
            .query_map(params![owner_id], row_to_memory)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(memories)
    }

    /// Fetch one memory, but only for its owner.
    pub fn get(&self, id: &str, owner_id: &str) -> Result<Memory> {
        let conn = lock(&self.db);
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1 AND user_id = ?2"
        ))?;
        match stmt.query_row(params![id, owner_id], row_to_memory) {
            Ok(m) => Ok(m),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::memory_not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete one memory, but only for its owner.
    pub fn delete(&self, id: &str, owner_id: &str) -> Result<()> {
        let conn = lock(&self.db);
        let n = conn.execute(
            "DELETE FROM memories WHERE id = ?1 AND user_id = ?2",
            params![id, owner_id],
        )?;
        if n == 0 {
            return Err(StoreError::memory_not_found(id));
        }
        info!(memory_id = %id, "memory deleted");
        Ok(())
    }

    /// Every memory still `scheduled` whose `send_at` is at or before `now`.
    /// Order is by `send_at` so the oldest overdue item goes first.
    pub fn due(&self, now: DateTime<Utc>) -> Result<Vec<Memory>> {
        let conn = lock(&self.db);
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories
             WHERE status = 'scheduled' AND send_at <= ?1
             ORDER BY send_at, id"
        ))?;
        let due = stmt
            .query_map(params![format_ts(now)], row_to_memory)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(count = due.len(), "due memories loaded");
        Ok(due)
    }

    /// Apply a delivery outcome, provided the memory is still in `expected`.
    ///
    /// Returns `false` (and writes nothing) when another writer has moved
    /// the memory on, or deleted it, since the caller read it. A failed
    /// outcome clears `sent_at`.
    pub fn record_outcome(
        &self,
        id: &str,
        expected: MemoryStatus,
        outcome: DeliveryOutcome,
    ) -> Result<bool> {
        let conn = lock(&self.db);
        let n = conn.execute(
            "UPDATE memories SET status = ?1, sent_at = ?2
             WHERE id = ?3 AND status = ?4",
            params![
                outcome.status().as_str(),
                outcome.sent_at().map(format_ts),
                id,
                expected.as_str(),
            ],
        )?;
        if n == 0 {
            warn!(memory_id = %id, expected = %expected, "status changed concurrently; outcome discarded");
            return Ok(false);
        }
        info!(memory_id = %id, status = %outcome.status(), "memory status updated");
        Ok(true)
    }
}

fn row_to_memory(row: &rusqlite::Row<'_>) -> rusqlite::Result<Memory> {
    let status_str: String = row.get(6)?;
    let status = status_str.parse::<MemoryStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.into())
    })?;
    Ok(Memory {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        recipient_email: row.get(3)?,
        message: row.get(4)?,
        send_at: ts_column(row, 5)?,
        status,
        created_at: ts_column(row, 7)?,
        sent_at: opt_ts_column(row, 8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dlo_users::account::{create_user, delete_user};

    fn setup() -> (MemoryStore, String, String) {
        let store = MemoryStore::open(dlo_users::db::open_in_memory().unwrap()).unwrap();
        let (a, b) = {
            let conn = lock(store.connection());
            (
                create_user(&conn, "a@example.com", "A", "secret1").unwrap().id,
                create_user(&conn, "b@example.com", "B", "secret1").unwrap().id,
            )
        };
        (store, a, b)
    }

    fn new_memory(title: &str, send_at: DateTime<Utc>) -> NewMemory {
        NewMemory {
            title: title.to_string(),
            recipient_email: "friend@example.com".to_string(),
            message: "thinking of you".to_string(),
            send_at,
        }
    }

    #[test]
    fn create_starts_scheduled() {
        let (store, a, _) = setup();
        let at = time::now() + Duration::days(1);
        let m = store.create(&a, new_memory("  hello ", at)).unwrap();
        assert_eq!(m.status, MemoryStatus::Scheduled);
        assert_eq!(m.title, "hello");
        assert!(m.sent_at.is_none());

        let loaded = store.get(&m.id, &a).unwrap();
        assert_eq!(loaded.send_at, at);
        assert_eq!(loaded.status, MemoryStatus::Scheduled);
    }

    #[test]
    fn create_validates_fields() {
        let (store, a, _) = setup();
        let now = time::now();
        assert!(store.create(&a, new_memory("   ", now)).is_err());

        let mut bad = new_memory("t", now);
        bad.recipient_email = "nope".to_string();
        assert!(matches!(store.create(&a, bad), Err(StoreError::Invalid(_))));

        let mut empty = new_memory("t", now);
        empty.message = "\n".to_string();
        assert!(store.create(&a, empty).is_err());
        assert!(store.list_for_owner(&a).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_send_at_is_rejected_and_due_keeps_working() {
        let (store, a, _) = setup();
        let now = time::now();
        let due = store.create(&a, new_memory("due", now - Duration::minutes(5))).unwrap();

        let year_10000 = chrono::TimeZone::with_ymd_and_hms(&Utc, 9999, 12, 31, 23, 59, 59).unwrap()
            + Duration::hours(5);
        let err = store.create(&a, new_memory("far", year_10000)).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(ref e) if e.code() == "INVALID_TIMESTAMP"));

        let ids: Vec<_> = store.due(now).unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![due.id]);
        assert_eq!(store.list_for_owner(&a).unwrap().len(), 1);
    }

    #[test]
    fn create_returns_what_get_returns() {
        let (store, a, _) = setup();
        let at = time::now() + Duration::days(1) + Duration::nanoseconds(789);
        let created = store.create(&a, new_memory("precise", at)).unwrap();
        let loaded = store.get(&created.id, &a).unwrap();
        assert_eq!(created.send_at, loaded.send_at);
        assert!(created.send_at <= at);
    }

    #[test]
    fn create_for_unknown_owner_fails() {
        let (store, _, _) = setup();
        let err = store.create("ghost", new_memory("t", time::now())).unwrap_err();
        assert!(matches!(err, StoreError::UnknownOwner(_)));
    }

    #[test]
    fn list_is_newest_first_and_owner_scoped() {
        let (store, a, b) = setup();
        let now = time::now();
        let first = store.create(&a, new_memory("first", now)).unwrap();
        let second = store.create(&a, new_memory("second", now)).unwrap();
        store.create(&b, new_memory("other", now)).unwrap();

        let ids: Vec<_> = store.list_for_owner(&a).unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn get_and_delete_hide_foreign_memories() {
        let (store, a, b) = setup();
        let m = store.create(&a, new_memory("mine", time::now())).unwrap();

        assert!(store.get(&m.id, &b).unwrap_err().is_not_found());
        assert!(store.delete(&m.id, &b).unwrap_err().is_not_found());
        assert!(store.get("no-such-id", &a).unwrap_err().is_not_found());

        store.delete(&m.id, &a).unwrap();
        assert!(store.get(&m.id, &a).unwrap_err().is_not_found());
    }

    #[test]
    fn due_respects_status_and_time() {
        let (store, a, b) = setup();
        let now = time::now();
        let past = store.create(&a, new_memory("past", now - Duration::minutes(5))).unwrap();
        let exact = store.create(&b, new_memory("exact", now)).unwrap();
        store.create(&a, new_memory("future", now + Duration::minutes(5))).unwrap();
        let done = store.create(&a, new_memory("done", now - Duration::hours(1))).unwrap();
        store
            .record_outcome(&done.id, MemoryStatus::Scheduled, DeliveryOutcome::Failed)
            .unwrap();

        let mut due: Vec<_> = store.due(now).unwrap().into_iter().map(|m| m.id).collect();
        due.sort();
        let mut expected = vec![past.id, exact.id];
        expected.sort();
        assert_eq!(due, expected);
    }

    #[test]
    fn record_outcome_is_compare_and_set() {
        let (store, a, _) = setup();
        let m = store.create(&a, new_memory("cas", time::now())).unwrap();
        let at = time::now();

        assert!(store
            .record_outcome(&m.id, MemoryStatus::Scheduled, DeliveryOutcome::Sent { at })
            .unwrap());
        // A second writer that still believes the memory is scheduled loses.
        assert!(!store
            .record_outcome(&m.id, MemoryStatus::Scheduled, DeliveryOutcome::Failed)
            .unwrap());

        let loaded = store.get(&m.id, &a).unwrap();
        assert_eq!(loaded.status, MemoryStatus::Sent);
        assert_eq!(loaded.sent_at, Some(at));
    }

    #[test]
    fn failed_outcome_clears_sent_at() {
        let (store, a, _) = setup();
        let m = store.create(&a, new_memory("again", time::now())).unwrap();
        store
            .record_outcome(&m.id, MemoryStatus::Scheduled, DeliveryOutcome::Sent { at: time::now() })
            .unwrap();
        assert!(store
            .record_outcome(&m.id, MemoryStatus::Sent, DeliveryOutcome::Failed)
            .unwrap());
        let loaded = store.get(&m.id, &a).unwrap();
        assert_eq!(loaded.status, MemoryStatus::Failed);
        assert!(loaded.sent_at.is_none());
    }

    #[test]
    fn deleting_user_cascades_to_own_memories_only() {
        let (store, a, b) = setup();
        let now = time::now();
        store.create(&a, new_memory("a1", now)).unwrap();
        store.create(&a, new_memory("a2", now)).unwrap();
        let kept = store.create(&b, new_memory("b1", now)).unwrap();

        delete_user(&lock(store.connection()), &a).unwrap();

        assert!(store.list_for_owner(&a).unwrap().is_empty());
        let remaining = store.list_for_owner(&b).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept.id);
    }
}
