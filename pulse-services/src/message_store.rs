//! Message Store
//!
//! SQLite-backed storage for message requests served by the message API.

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use pulse_core::{Message, MessageStatus, NewMessage, PulseError};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

/// Message storage using SQLite
pub struct MessageStore {
    conn: Mutex<Connection>,
}

impl MessageStore {
    /// Open (or create) the database at `db_path`
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, MessageStoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    MessageStoreError::Io(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let conn = Connection::open(db_path.as_ref())?;
        info!("Opened message store at {}", db_path.as_ref().display());
        Self::with_connection(conn)
    }

    /// Create an in-memory store
    pub fn in_memory() -> Result<Self, MessageStoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, MessageStoreError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), MessageStoreError> {
        self.conn.lock().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at INTEGER NOT NULL,
                phone_number TEXT NOT NULL,
                message TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
            );
            "#,
        )?;
        Ok(())
    }

    /// All messages, oldest first
    pub fn list(&self) -> Result<Vec<Message>, MessageStoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, created_at, phone_number, message, status FROM messages ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], row_to_message)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Store a new pending message and return it as listed
    ///
    /// Both fields are trimmed and must be non-empty.
    pub fn create(&self, new: &NewMessage) -> Result<Message, MessageStoreError> {
        let phone_number = new.phone_number.trim();
        let message = new.message.trim();
        if phone_number.is_empty() {
            return Err(MessageStoreError::Validation("phoneNumber is required".into()));
        }
        if message.is_empty() {
            return Err(MessageStoreError::Validation("message is required".into()));
        }

        let created_at = Utc::now().timestamp_millis();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO messages (created_at, phone_number, message, status) VALUES (?1, ?2, ?3, ?4)",
            params![created_at, phone_number, message, MessageStatus::Pending.as_str()],
        )?;
        let id = conn.last_insert_rowid() as u64;
        debug!("Stored message {}", id);

        Ok(Message {
            id: Some(id),
            created_at: Some(from_millis(created_at)?),
            phone_number: phone_number.to_string(),
            message: message.to_string(),
            status: MessageStatus::Pending,
        })
    }

    /// Look up one message
    pub fn get(&self, id: u64) -> Result<Option<Message>, MessageStoreError> {
        let conn = self.conn.lock();
        let message = conn
            .query_row(
                "SELECT id, created_at, phone_number, message, status FROM messages WHERE id = ?1",
                params![id as i64],
                row_to_message,
            )
            .optional()?;
        Ok(message)
    }

    /// Record the delivery outcome of a message
    pub fn set_status(&self, id: u64, status: MessageStatus) -> Result<Message, MessageStoreError> {
        let updated = self.conn.lock().execute(
            "UPDATE messages SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id as i64],
        )?;
        if updated == 0 {
            return Err(MessageStoreError::NotFound(id));
        }
        info!("Message {} is now {}", id, status);

        self.get(id)?.ok_or(MessageStoreError::NotFound(id))
    }

    /// Number of stored messages
    pub fn count(&self) -> Result<usize, MessageStoreError> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id: i64 = row.get(0)?;
    let created_at: i64 = row.get(1)?;
    let status: String = row.get(4)?;

    Ok(Message {
        id: Some(id as u64),
        created_at: Utc.timestamp_millis_opt(created_at).single(),
        phone_number: row.get(2)?,
        message: row.get(3)?,
        status: MessageStatus::from_wire(Some(&status)),
    })
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, MessageStoreError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| MessageStoreError::Corrupt(format!("Invalid timestamp: {}", millis)))
}

/// Errors that can occur during message storage operations
#[derive(Debug, thiserror::Error)]
pub enum MessageStoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid message: {0}")]
    Validation(String),

    #[error("Message {0} not found")]
    NotFound(u64),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<MessageStoreError> for PulseError {
    fn from(e: MessageStoreError) -> Self {
        match e {
            MessageStoreError::Validation(msg) => PulseError::validation(msg),
            MessageStoreError::NotFound(id) => PulseError::not_found(format!("Message {}", id)),
            other => PulseError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_list() {
        let store = MessageStore::in_memory().unwrap();
        assert_eq!(store.count().unwrap(), 0);

        let first = store.create(&NewMessage::new("0812", "pulsa 10k")).unwrap();
        let second = store.create(&NewMessage::new(" 0813 ", " paket data ")).unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(first.status, MessageStatus::Pending);
        assert_eq!(second.phone_number, "0813");
        assert_eq!(second.message, "paket data");

        let listed = store.list().unwrap();
        assert_eq!(listed, vec![first, second]);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_create_rejects_blank_fields() {
        let store = MessageStore::in_memory().unwrap();

        let err = store.create(&NewMessage::new("  ", "hi")).unwrap_err();
        assert!(matches!(err, MessageStoreError::Validation(_)));
        let err = store.create(&NewMessage::new("0812", "")).unwrap_err();
        assert_eq!(
            PulseError::from(err),
            PulseError::validation("message is required")
        );
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_set_status() {
        let store = MessageStore::in_memory().unwrap();
        let created = store.create(&NewMessage::new("0812", "hi")).unwrap();
        let id = created.id.unwrap();

        let updated = store.set_status(id, MessageStatus::Success).unwrap();
        assert_eq!(updated.status, MessageStatus::Success);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(store.get(id).unwrap().unwrap().status, MessageStatus::Success);

        assert!(matches!(
            store.set_status(42, MessageStatus::Failed),
            Err(MessageStoreError::NotFound(42))
        ));
        assert!(store.get(42).unwrap().is_none());

        let err = store.set_status(42, MessageStatus::Failed).unwrap_err();
        assert_eq!(PulseError::from(err), PulseError::not_found("Message 42"));
    }

    #[test]
    fn test_open_creates_file() {
        let dir = std::env::temp_dir().join(format!("pulse-store-{}", std::process::id()));
        let path = dir.join("nested").join("messages.db");

        {
            let store = MessageStore::open(&path).unwrap();
            store.create(&NewMessage::new("0812", "hi")).unwrap();
        }
        let reopened = MessageStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);

        let _ = std::fs::remove_dir_all(dir);
    }
}
