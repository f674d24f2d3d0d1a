use dlo_core::{
    time::{self, format_ts},
    types::new_id,
    validate,
};
use rusqlite::{params, Connection, ErrorCode};
use tracing::info;

use crate::db::{row_to_user, USER_COLUMNS};
use crate::error::{Result, UserError};
use crate::password::{hash_password, verify_password};
use crate::types::User;

/// Register a new account.
///
/// The email is trimmed, lowercased and checked; the password must meet the
/// minimum length. A second account with the same email is rejected both by
/// the pre-check and, under a race, by the UNIQUE constraint.
pub fn create_user(conn: &Connection, email: &str, name: &str, password: &str) -> Result<User> {
    let email = validate::account_email(email)?;
    validate::password(password)?;

    if find_user_by_email(conn, &email)?.is_some() {
        return Err(UserError::AlreadyExists(email));
    }

    let user = User {
        id: new_id(),
        email,
        name: name.trim().to_string(),
        password_hash: hash_password(password)?,
        created_at: time::now(),
    };

    let inserted = conn.execute(
        "INSERT INTO users (id, email, name, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id,
            user.email,
            user.name,
            user.password_hash,
            format_ts(user.created_at)
        ],
    );
    match inserted {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            return Err(UserError::AlreadyExists(user.email));
        }
        Err(e) => return Err(e.into()),
    }

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Load a user by primary key. Returns None instead of an error when absent
/// so callers decide whether missing is exceptional in their context.
pub fn get_user(conn: &Connection, user_id: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    query_one(conn, &sql, user_id)
}

/// Case-insensitive lookup; the argument is normalised the same way
/// `create_user` normalises.
pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    query_one(conn, &sql, &email.trim().to_lowercase())
}

/// Check a login attempt. Unknown email and wrong password look the same.
pub fn authenticate(conn: &Connection, email: &str, password: &str) -> Result<Option<User>> {
    Ok(find_user_by_email(conn, email)?.filter(|u| verify_password(password, &u.password_hash)))
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map([], row_to_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Delete an account. Owned memories and messages go with it via
/// `ON DELETE CASCADE`.
pub fn delete_user(conn: &Connection, user_id: &str) -> Result<()> {
    let n = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
    if n == 0 {
        return Err(UserError::NotFound(user_id.to_string()));
    }
    info!(user_id, "user deleted");
    Ok(())
}

fn query_one(conn: &Connection, sql: &str, key: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare(sql)?;
    match stmt.query_row(params![key], row_to_user) {
        Ok(u) => Ok(Some(u)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(UserError::DatabaseError(e)),
    }
}
