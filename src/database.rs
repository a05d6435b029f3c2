use crate::errors::StoreError;
use crate::models::{Key, KeyStatus};
use crate::store::KeyStore;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};

/// Key store backed by an in-memory SQLite database.
///
/// Rows are copied in and out, so `update` is a real write.
pub struct SqliteKeyStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyStore {
    pub fn new() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("../db/schema.sql"))?;
        Ok(SqliteKeyStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {:?}: {}", raw, e)))
}

impl KeyStore for SqliteKeyStore {
    fn get(&self, value: &str) -> Result<Key, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT value, status, issued_at, submitted_at FROM issued_keys WHERE value = ?",
        )?;

        let row = stmt
            .query_row(params![value], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .optional()?;

        let (value, status, issued_at, submitted_at) = row.ok_or(StoreError::NotFound)?;
        let status = status.parse::<KeyStatus>().map_err(StoreError::Corrupt)?;
        let issued_at = parse_time(&issued_at)?;
        let submitted_at = submitted_at.as_deref().map(parse_time).transpose()?;

        Ok(Key::restore(value, status, issued_at, submitted_at))
    }

    fn add(&self, key: Key) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO issued_keys (value, status, issued_at, submitted_at) VALUES (?, ?, ?, ?)",
            params![
                key.value(),
                key.status().as_str(),
                key.issued_at().to_rfc3339(),
                key.submitted_at().map(|dt| dt.to_rfc3339()),
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::AlreadyExists);
        }
        Ok(())
    }

    fn update(&self, key: &Key) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE issued_keys SET status = ?, submitted_at = ? WHERE value = ?",
            params![
                key.status().as_str(),
                key.submitted_at().map(|dt| dt.to_rfc3339()),
                key.value(),
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn save(&self) -> Result<(), StoreError> {
        // Every statement autocommits; taking the lock waits out any writer in flight.
        let _conn = self.conn()?;
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM issued_keys", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
