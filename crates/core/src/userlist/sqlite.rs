//! SQLite-backed user list store.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use super::{UserList, UserListStore};
use crate::dataset::MediaKind;
use crate::remote::CatalogRecord;
use crate::store::StoreError;

/// SQLite-backed favourites / recently-browsed store.
pub struct SqliteUserListStore {
    conn: Mutex<Connection>,
}

impl SqliteUserListStore {
    /// Open (or create) the database file and initialize tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS user_list_entries (
                list TEXT NOT NULL,
                media_kind TEXT NOT NULL,
                record_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                overview TEXT,
                poster_path TEXT,
                backdrop_path TEXT,
                release_date TEXT,
                vote_average REAL,
                vote_count INTEGER,
                added_at TEXT NOT NULL,
                PRIMARY KEY (list, media_kind, record_id)
            );

            CREATE INDEX IF NOT EXISTS idx_user_list_added
                ON user_list_entries(list, added_at);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<CatalogRecord> {
        let media_kind: String = row.get(1)?;
        let media = match media_kind.as_str() {
            "tv" => MediaKind::Tv,
            _ => MediaKind::Movie,
        };

        Ok(CatalogRecord {
            id: row.get::<_, i64>(0)? as u64,
            media,
            title: row.get(2)?,
            overview: row.get(3)?,
            poster_path: row.get(4)?,
            backdrop_path: row.get(5)?,
            release_date: row.get(6)?,
            vote_average: row.get::<_, Option<f64>>(7)?.map(|v| v as f32),
            vote_count: row.get::<_, Option<i64>>(8)?.map(|v| v as u32),
        })
    }
}

impl UserListStore for SqliteUserListStore {
    fn add(&self, list: UserList, record: &CatalogRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_list_entries
                 (list, media_kind, record_id, title, overview, poster_path,
                  backdrop_path, release_date, vote_average, vote_count, added_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(list, media_kind, record_id) DO UPDATE SET
                title = excluded.title,
                overview = excluded.overview,
                poster_path = excluded.poster_path,
                backdrop_path = excluded.backdrop_path,
                release_date = excluded.release_date,
                vote_average = excluded.vote_average,
                vote_count = excluded.vote_count,
                added_at = excluded.added_at",
            params![
                list.as_str(),
                record.media.as_str(),
                record.id as i64,
                &record.title,
                &record.overview,
                &record.poster_path,
                &record.backdrop_path,
                &record.release_date,
                record.vote_average.map(|v| v as f64),
                record.vote_count.map(|v| v as i64),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, list: UserList, media: MediaKind, id: u64) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM user_list_entries WHERE list = ? AND media_kind = ? AND record_id = ?",
            params![list.as_str(), media.as_str(), id as i64],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn contains(&self, list: UserList, media: MediaKind, id: u64) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM user_list_entries
                 WHERE list = ? AND media_kind = ? AND record_id = ?",
                params![list.as_str(), media.as_str(), id as i64],
                |_| Ok(true),
            )
            .unwrap_or(false);
        Ok(exists)
    }

    fn window(
        &self,
        list: UserList,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CatalogRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT record_id, media_kind, title, overview, poster_path, backdrop_path,
                        release_date, vote_average, vote_count
                 FROM user_list_entries
                 WHERE list = ?
                 ORDER BY added_at DESC, record_id DESC
                 LIMIT ? OFFSET ?",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![list.as_str(), limit as i64, offset as i64],
                Self::row_to_record,
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(records)
    }

    fn count(&self, list: UserList) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM user_list_entries WHERE list = ?",
                params![list.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(count as u64)
    }

    fn clear(&self, list: UserList) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM user_list_entries WHERE list = ?",
            params![list.as_str()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }
}
