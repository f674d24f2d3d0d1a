use chrono::{DateTime, Utc};
use rusqlite::{types::Type, Connection, Result};

use crate::types::User;

/// Pragmas every connection needs. `foreign_keys` is per-connection in
/// SQLite, so it must be set on each one or cascades silently stop working.
const CONNECTION_PRAGMAS: &str = "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;";

/// Open (creating if needed) the single database file shared by all stores.
pub fn open(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(CONNECTION_PRAGMAS)?;
    Ok(conn)
}

/// Private in-memory database with the same pragmas, for tests and dry runs.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Initialise the users table. Idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            name            TEXT NOT NULL,
            password_hash   TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );",
    )
}

/// Column order: id, email, name, password_hash, created_at.
pub(crate) const USER_COLUMNS: &str = "id, email, name, password_hash, created_at";

pub(crate) fn row_to_user(row: &rusqlite::Row<'_>) -> Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: ts_column(row, 4)?,
    })
}

/// Read an RFC 3339 TEXT column as a UTC instant.
pub fn ts_column(row: &rusqlite::Row<'_>, idx: usize) -> Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_ts_text(idx, &raw)
}

/// Nullable variant of [`ts_column`].
pub fn opt_ts_column(row: &rusqlite::Row<'_>, idx: usize) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_ts_text(idx, &s)).transpose()
}

fn parse_ts_text(idx: usize, raw: &str) -> Result<DateTime<Utc>> {
    dlo_core::time::parse_ts(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
