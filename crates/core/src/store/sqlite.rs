//! SQLite-backed catalog store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{CatalogStore, PageCursor, StoreError};
use crate::dataset::{DatasetKey, MediaKind, PageToken};
use crate::remote::CatalogRecord;

/// SQLite-backed durable catalog store.
pub struct SqliteCatalogStore {
    conn: Mutex<Connection>,
}

impl SqliteCatalogStore {
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
            -- Cached catalog records, partitioned by dataset key.
            -- insertion_rank preserves remote page order within a dataset.
            CREATE TABLE IF NOT EXISTS catalog_records (
                dataset_key TEXT NOT NULL,
                record_id INTEGER NOT NULL,
                media_kind TEXT NOT NULL,
                title TEXT NOT NULL,
                overview TEXT,
                poster_path TEXT,
                backdrop_path TEXT,
                release_date TEXT,
                vote_average REAL,
                vote_count INTEGER,
                insertion_rank INTEGER NOT NULL,
                PRIMARY KEY (dataset_key, record_id)
            );

            CREATE INDEX IF NOT EXISTS idx_catalog_records_rank
                ON catalog_records(dataset_key, insertion_rank);

            -- Pagination progress, one row per dataset key.
            CREATE TABLE IF NOT EXISTS page_keys (
                dataset_key TEXT PRIMARY KEY,
                next_page INTEGER,
                last_synced_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    /// Append records within an open transaction, assigning insertion ranks.
    fn append_tx(
        conn: &Connection,
        key: &str,
        records: &[CatalogRecord],
    ) -> Result<u32, rusqlite::Error> {
        let mut rank: i64 = conn.query_row(
            "SELECT COALESCE(MAX(insertion_rank) + 1, 0) FROM catalog_records WHERE dataset_key = ?",
            params![key],
            |row| row.get(0),
        )?;

        let mut inserted = 0u32;
        for record in records {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO catalog_records
                     (dataset_key, record_id, media_kind, title, overview, poster_path,
                      backdrop_path, release_date, vote_average, vote_count, insertion_rank)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    key,
                    record.id as i64,
                    record.media.as_str(),
                    &record.title,
                    &record.overview,
                    &record.poster_path,
                    &record.backdrop_path,
                    &record.release_date,
                    record.vote_average.map(|v| v as f64),
                    record.vote_count.map(|v| v as i64),
                    rank,
                ],
            )?;
            if changed > 0 {
                rank += 1;
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    fn set_cursor_tx(
        conn: &Connection,
        key: &str,
        cursor: &PageCursor,
    ) -> Result<(), rusqlite::Error> {
        conn.execute(
            "INSERT INTO page_keys (dataset_key, next_page, last_synced_at)
             VALUES (?, ?, ?)
             ON CONFLICT(dataset_key) DO UPDATE SET
                next_page = excluded.next_page,
                last_synced_at = excluded.last_synced_at",
            params![
                key,
                cursor.next_page.map(|t| t.value() as i64),
                cursor.last_synced_at.to_rfc3339(),
            ],
        )?;
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

impl CatalogStore for SqliteCatalogStore {
    fn append_records(
        &self,
        key: &DatasetKey,
        records: &[CatalogRecord],
    ) -> Result<u32, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let inserted = Self::append_tx(&tx, &key.storage_key(), records)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(inserted)
    }

    fn clear_dataset(&self, key: &DatasetKey) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM catalog_records WHERE dataset_key = ?",
            params![key.storage_key()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn read_window(
        &self,
        key: &DatasetKey,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CatalogRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT record_id, media_kind, title, overview, poster_path, backdrop_path,
                        release_date, vote_average, vote_count
                 FROM catalog_records
                 WHERE dataset_key = ?
                 ORDER BY insertion_rank ASC
                 LIMIT ? OFFSET ?",
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![key.storage_key(), limit as i64, offset as i64],
                Self::row_to_record,
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(records)
    }

    fn count(&self, key: &DatasetKey) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM catalog_records WHERE dataset_key = ?",
                params![key.storage_key()],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(count as u64)
    }

    fn cursor(&self, key: &DatasetKey) -> Result<Option<PageCursor>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let cursor = conn
            .query_row(
                "SELECT next_page, last_synced_at FROM page_keys WHERE dataset_key = ?",
                params![key.storage_key()],
                |row| {
                    let next_page: Option<i64> = row.get(0)?;
                    let synced_str: String = row.get(1)?;
                    let last_synced_at = DateTime::parse_from_rfc3339(&synced_str)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now());
                    Ok(PageCursor {
                        next_page: next_page.map(|p| PageToken::new(p as u32)),
                        last_synced_at,
                    })
                },
            );

        match cursor {
            Ok(cursor) => Ok(Some(cursor)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    fn set_cursor(&self, key: &DatasetKey, cursor: &PageCursor) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        Self::set_cursor_tx(&conn, &key.storage_key(), cursor)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn clear_cursor(&self, key: &DatasetKey) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM page_keys WHERE dataset_key = ?",
            params![key.storage_key()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn commit_page(
        &self,
        key: &DatasetKey,
        records: &[CatalogRecord],
        cursor: &PageCursor,
    ) -> Result<u32, StoreError> {
        let key_str = key.storage_key();
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let inserted = Self::append_tx(&tx, &key_str, records)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Self::set_cursor_tx(&tx, &key_str, cursor)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(inserted)
    }

    fn replace_dataset(
        &self,
        key: &DatasetKey,
        records: &[CatalogRecord],
        cursor: &PageCursor,
    ) -> Result<u32, StoreError> {
        let key_str = key.storage_key();
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.execute(
            "DELETE FROM catalog_records WHERE dataset_key = ?",
            params![&key_str],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        tx.execute(
            "DELETE FROM page_keys WHERE dataset_key = ?",
            params![&key_str],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        let inserted = Self::append_tx(&tx, &key_str, records)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Self::set_cursor_tx(&tx, &key_str, cursor)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(inserted)
    }
}
