//! In-memory catalog store.
//!
//! Serves ephemeral (discover-style) datasets whose cache lives and dies with
//! their coordinator, and doubles as a lightweight backend for tests. Same
//! semantics as the SQLite store: first-write-wins dedup, insertion order,
//! atomic composite commits.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{CatalogStore, PageCursor, StoreError};
use crate::dataset::DatasetKey;
use crate::remote::CatalogRecord;

#[derive(Default)]
struct DatasetEntry {
    records: Vec<CatalogRecord>,
    ids: HashSet<u64>,
    cursor: Option<PageCursor>,
}

impl DatasetEntry {
    fn append(&mut self, records: &[CatalogRecord]) -> u32 {
        let mut inserted = 0u32;
        for record in records {
            if self.ids.insert(record.id) {
                self.records.push(record.clone());
                inserted += 1;
            }
        }
        inserted
    }
}

/// In-memory [`CatalogStore`] backend.
#[derive(Default)]
pub struct MemoryCatalogStore {
    datasets: Mutex<HashMap<String, DatasetEntry>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn append_records(
        &self,
        key: &DatasetKey,
        records: &[CatalogRecord],
    ) -> Result<u32, StoreError> {
        let mut datasets = self.datasets.lock().unwrap();
        let entry = datasets.entry(key.storage_key()).or_default();
        Ok(entry.append(records))
    }

    fn clear_dataset(&self, key: &DatasetKey) -> Result<(), StoreError> {
        let mut datasets = self.datasets.lock().unwrap();
        if let Some(entry) = datasets.get_mut(&key.storage_key()) {
            entry.records.clear();
            entry.ids.clear();
        }
        Ok(())
    }

    fn read_window(
        &self,
        key: &DatasetKey,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CatalogRecord>, StoreError> {
        let datasets = self.datasets.lock().unwrap();
        let records = datasets
            .get(&key.storage_key())
            .map(|entry| {
                entry
                    .records
                    .iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }

    fn count(&self, key: &DatasetKey) -> Result<u64, StoreError> {
        let datasets = self.datasets.lock().unwrap();
        Ok(datasets
            .get(&key.storage_key())
            .map(|entry| entry.records.len() as u64)
            .unwrap_or(0))
    }

    fn cursor(&self, key: &DatasetKey) -> Result<Option<PageCursor>, StoreError> {
        let datasets = self.datasets.lock().unwrap();
        Ok(datasets
            .get(&key.storage_key())
            .and_then(|entry| entry.cursor.clone()))
    }

    fn set_cursor(&self, key: &DatasetKey, cursor: &PageCursor) -> Result<(), StoreError> {
        let mut datasets = self.datasets.lock().unwrap();
        datasets.entry(key.storage_key()).or_default().cursor = Some(cursor.clone());
        Ok(())
    }

    fn clear_cursor(&self, key: &DatasetKey) -> Result<(), StoreError> {
        let mut datasets = self.datasets.lock().unwrap();
        if let Some(entry) = datasets.get_mut(&key.storage_key()) {
            entry.cursor = None;
        }
        Ok(())
    }

    fn commit_page(
        &self,
        key: &DatasetKey,
        records: &[CatalogRecord],
        cursor: &PageCursor,
    ) -> Result<u32, StoreError> {
        let mut datasets = self.datasets.lock().unwrap();
        let entry = datasets.entry(key.storage_key()).or_default();
        let inserted = entry.append(records);
        entry.cursor = Some(cursor.clone());
        Ok(inserted)
    }

    fn replace_dataset(
        &self,
        key: &DatasetKey,
        records: &[CatalogRecord],
        cursor: &PageCursor,
    ) -> Result<u32, StoreError> {
        let mut datasets = self.datasets.lock().unwrap();
        let entry = datasets.entry(key.storage_key()).or_default();
        entry.records.clear();
        entry.ids.clear();
        let inserted = entry.append(records);
        entry.cursor = Some(cursor.clone());
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{MediaKind, PageToken, Scope};

    fn key() -> DatasetKey {
        DatasetKey::new(MediaKind::Movie, Scope::Popular, "en-US")
    }

    fn record(id: u64) -> CatalogRecord {
        CatalogRecord {
            id,
            media: MediaKind::Movie,
            title: format!("Record {}", id),
            overview: None,
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            vote_average: None,
            vote_count: None,
        }
    }

    #[test]
    fn test_append_dedups_and_preserves_order() {
        let store = MemoryCatalogStore::new();

        let inserted = store
            .append_records(&key(), &[record(1), record(2)])
            .unwrap();
        assert_eq!(inserted, 2);

        let inserted = store
            .append_records(&key(), &[record(2), record(3)])
            .unwrap();
        assert_eq!(inserted, 1);

        let ids: Vec<u64> = store
            .read_window(&key(), 0, 10)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_commit_page_sets_cursor() {
        let store = MemoryCatalogStore::new();
        store
            .commit_page(
                &key(),
                &[record(1)],
                &PageCursor::new(Some(PageToken::new(2))),
            )
            .unwrap();

        assert_eq!(store.count(&key()).unwrap(), 1);
        assert_eq!(
            store.cursor(&key()).unwrap().unwrap().next_page,
            Some(PageToken::new(2))
        );
    }

    #[test]
    fn test_replace_dataset() {
        let store = MemoryCatalogStore::new();
        store
            .commit_page(&key(), &[record(1), record(2)], &PageCursor::new(None))
            .unwrap();

        store
            .replace_dataset(
                &key(),
                &[record(9)],
                &PageCursor::new(Some(PageToken::new(2))),
            )
            .unwrap();

        let ids: Vec<u64> = store
            .read_window(&key(), 0, 10)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![9]);
    }

    #[test]
    fn test_empty_dataset_reads() {
        let store = MemoryCatalogStore::new();
        assert_eq!(store.count(&key()).unwrap(), 0);
        assert!(store.read_window(&key(), 0, 10).unwrap().is_empty());
        assert!(store.cursor(&key()).unwrap().is_none());
    }
}
