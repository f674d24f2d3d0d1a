use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;

use crate::error::Result;

/// One SQLite connection shared by the stores of a single execution context
/// (request handling or the delivery engine). Never shared across contexts.
pub type SharedConnection = Arc<Mutex<Connection>>;

pub fn share(conn: Connection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

/// A panic while the lock was held cannot leave SQLite half-written (every
/// statement is atomic), so a poisoned lock is still safe to reuse.
pub fn lock(db: &SharedConnection) -> MutexGuard<'_, Connection> {
    db.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Initialise the memories and messages schema in `conn`, plus the users
/// table both reference. Idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    dlo_users::db::init_db(conn)?;
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memories (
            id              TEXT NOT NULL PRIMARY KEY,
            user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title           TEXT NOT NULL,
            recipient_email TEXT NOT NULL,
            message         TEXT NOT NULL,
            send_at         TEXT NOT NULL,   -- RFC 3339, UTC
            status          TEXT NOT NULL DEFAULT 'scheduled',
            created_at      TEXT NOT NULL,
            sent_at         TEXT             -- set only when status = 'sent'
        ) STRICT;

        -- Due query: WHERE status = 'scheduled' AND send_at <= ?
        CREATE INDEX IF NOT EXISTS idx_memories_due ON memories (status, send_at);
        CREATE INDEX IF NOT EXISTS idx_memories_owner ON memories (user_id, created_at);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT NOT NULL PRIMARY KEY,
            recipient       TEXT NOT NULL,
            content         TEXT NOT NULL,
            delivery_date   TEXT NOT NULL,   -- YYYY-MM-DD, no zone
            sent            INTEGER NOT NULL DEFAULT 0,
            user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_messages_owner ON messages (user_id, delivery_date);
        ",
    )?;
    Ok(())
}
