use dlo_core::{types::new_id, validate};
use rusqlite::{params, types::Type, Connection, ErrorCode};
use tracing::info;

use crate::db::{init_db, lock, share, SharedConnection};
use crate::error::{Result, StoreError};
use crate::types::{Message, MessageDraft};

const MESSAGE_COLUMNS: &str = "id, recipient, content, delivery_date, sent, user_id";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Manual CRUD for date-scheduled messages. Nothing ever delivers these.
#[derive(Clone)]
pub struct MessageStore {
    db: SharedConnection,
}

impl MessageStore {
    pub fn open(conn: Connection) -> Result<Self> {
        Self::new(share(conn))
    }

    pub fn new(db: SharedConnection) -> Result<Self> {
        init_db(&lock(&db))?;
        Ok(Self { db })
    }

    pub fn create(&self, owner_id: &str, draft: MessageDraft) -> Result<Message> {
        let message = Message {
            id: new_id(),
            recipient: validate::required("recipient", &draft.recipient)?,
            content: validate::required("content", &draft.content)?,
            delivery_date: draft.delivery_date,
            sent: false,
            user_id: owner_id.to_string(),
        };
        let conn = lock(&self.db);
        let inserted = conn.execute(
            "INSERT INTO messages (id, recipient, content, delivery_date, sent, user_id)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![
                message.id,
                message.recipient,
                message.content,
                message.delivery_date.format(DATE_FORMAT).to_string(),
                message.user_id,
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
        info!(message_id = %message.id, user_id = %owner_id, "message created");
        Ok(message)
    }

    /// All messages of `owner_id`, latest delivery date first.
    pub fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Message>> {
        let conn = lock(&self.db);
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE user_id = ?1
             ORDER BY delivery_date DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map(params![owner_id], row_to_message)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get(&self, id: &str, owner_id: &str) -> Result<Message> {
        let conn = lock(&self.db);
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1 AND user_id = ?2"
        ))?;
        match stmt.query_row(params![id, owner_id], row_to_message) {
            Ok(m) => Ok(m),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::message_not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace recipient, content and delivery date. `sent` is untouched.
    pub fn update(&self, id: &str, owner_id: &str, draft: MessageDraft) -> Result<Message> {
        let recipient = validate::required("recipient", &draft.recipient)?;
        let content = validate::required("content", &draft.content)?;
        {
            let conn = lock(&self.db);
            let n = conn.execute(
                "UPDATE messages SET recipient = ?1, content = ?2, delivery_date = ?3
                 WHERE id = ?4 AND user_id = ?5",
                params![
                    recipient,
                    content,
                    draft.delivery_date.format(DATE_FORMAT).to_string(),
                    id,
                    owner_id,
                ],
            )?;
            if n == 0 {
                return Err(StoreError::message_not_found(id));
            }
        }
        info!(message_id = %id, "message updated");
        self.get(id, owner_id)
    }

    pub fn delete(&self, id: &str, owner_id: &str) -> Result<()> {
        let conn = lock(&self.db);
        let n = conn.execute(
            "DELETE FROM messages WHERE id = ?1 AND user_id = ?2",
            params![id, owner_id],
        )?;
        if n == 0 {
            return Err(StoreError::message_not_found(id));
        }
        info!(message_id = %id, "message deleted");
        Ok(())
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let date_str: String = row.get(3)?;
    let delivery_date = chrono::NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(Message {
        id: row.get(0)?,
        recipient: row.get(1)?,
        content: row.get(2)?,
        delivery_date,
        sent: row.get::<_, i64>(4)? != 0,
        user_id: row.get(5)?,
    })
}
