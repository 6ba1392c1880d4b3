//! redb-backed cache for model files
//!
//! # Tables
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `file_meta` | file id | JSON `CachedFileMeta` |
//! | `file_data` | file id | raw bytes |
//!
//! Metadata and bytes live in separate tables so listing and size queries
//! never load file contents. There is no capacity bound; entries leave only
//! through [`FileCache::remove_file`] or [`FileCache::cleanup_old_files`].

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("file_meta");
const DATA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("file_data");

/// Entries uploaded longer ago than this are cleanup candidates
pub const MAX_AGE_MS: i64 = 7 * 24 * 60 * 60 * 1000;
/// Entries read within this window are always kept
pub const RECENT_ACCESS_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Millisecond wall clock, swappable in tests
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        shared::util::now_millis()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedFileMeta {
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
    /// Epoch millis
    pub uploaded_at: i64,
    /// Epoch millis
    pub last_accessed: i64,
}

impl CachedFileMeta {
    /// Old AND not recently read
    pub fn is_stale(&self, now: i64) -> bool {
        self.uploaded_at < now - MAX_AGE_MS && self.last_accessed < now - RECENT_ACCESS_MS
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    pub meta: CachedFileMeta,
    pub data: Vec<u8>,
}

#[derive(Clone)]
pub struct FileCache {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCache").finish_non_exhaustive()
    }
}

impl FileCache {
    /// Open or create the cache at the given path
    ///
    /// Opening runs the cleanup sweep once. A failed sweep is logged and
    /// the cache is still returned.
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    pub fn open_with_clock(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> CacheResult<Self> {
        Self::init(Database::create(path)?, clock)
    }

    /// Cache that lives only as long as the process
    pub fn in_memory(clock: Arc<dyn Clock>) -> CacheResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db, clock)
    }

    fn init(db: Database, clock: Arc<dyn Clock>) -> CacheResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(META_TABLE)?;
            let _ = write_txn.open_table(DATA_TABLE)?;
        }
        write_txn.commit()?;

        let cache = Self {
            db: Arc::new(db),
            clock,
        };
        if let Err(e) = cache.cleanup_old_files() {
            tracing::warn!(error = %e, "Startup cache cleanup failed");
        }
        Ok(cache)
    }

    /// Store bytes and return the new id (`file_{millis}_{9 base36}`)
    pub fn store_file(&self, name: &str, content_type: &str, data: &[u8]) -> CacheResult<String> {
        let now = self.clock.now_millis();
        let meta = CachedFileMeta {
            id: shared::util::timestamped_id("file", now),
            name: name.to_string(),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            uploaded_at: now,
            last_accessed: now,
        };
        let encoded = serde_json::to_vec(&meta)?;

        let txn = self.db.begin_write()?;
        {
            let mut meta_table = txn.open_table(META_TABLE)?;
            meta_table.insert(meta.id.as_str(), encoded.as_slice())?;
            let mut data_table = txn.open_table(DATA_TABLE)?;
            data_table.insert(meta.id.as_str(), data)?;
        }
        txn.commit()?;

        tracing::debug!(file_id = %meta.id, size = meta.size, "File cached");
        Ok(meta.id)
    }

    /// Bytes and metadata; a hit refreshes `last_accessed`
    pub fn get_file(&self, id: &str) -> CacheResult<Option<CachedFile>> {
        let txn = self.db.begin_write()?;
        let found = {
            let mut meta_table = txn.open_table(META_TABLE)?;
            let data_table = txn.open_table(DATA_TABLE)?;

            let meta: Option<CachedFileMeta> = match meta_table.get(id)? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };
            let data = data_table.get(id)?.map(|value| value.value().to_vec());

            match (meta, data) {
                (Some(mut meta), Some(data)) => {
                    meta.last_accessed = self.clock.now_millis();
                    let encoded = serde_json::to_vec(&meta)?;
                    meta_table.insert(id, encoded.as_slice())?;
                    Some(CachedFile { meta, data })
                }
                _ => None,
            }
        };
        txn.commit()?;
        Ok(found)
    }

    /// Metadata only; does not count as an access
    pub fn get_metadata(&self, id: &str) -> CacheResult<Option<CachedFileMeta>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(META_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn has_file(&self, id: &str) -> CacheResult<bool> {
        Ok(self.get_metadata(id)?.is_some())
    }

    /// All entries, oldest upload first
    pub fn list_files(&self) -> CacheResult<Vec<CachedFileMeta>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(META_TABLE)?;

        let mut files = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let meta: CachedFileMeta = serde_json::from_slice(value.value())?;
            files.push(meta);
        }
        files.sort_by_key(|m| m.uploaded_at);
        Ok(files)
    }

    /// Returns whether an entry was removed
    pub fn remove_file(&self, id: &str) -> CacheResult<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut meta_table = txn.open_table(META_TABLE)?;
            let mut data_table = txn.open_table(DATA_TABLE)?;
            let removed = meta_table.remove(id)?.is_some();
            data_table.remove(id)?;
            removed
        };
        txn.commit()?;
        Ok(removed)
    }

    /// Total bytes held
    pub fn cache_size(&self) -> CacheResult<u64> {
        Ok(self.list_files()?.iter().map(|m| m.size).sum())
    }

    /// Drop stale entries, returning how many went
    pub fn cleanup_old_files(&self) -> CacheResult<usize> {
        let now = self.clock.now_millis();
        let txn = self.db.begin_write()?;
        let removed = {
            let mut meta_table = txn.open_table(META_TABLE)?;
            let mut data_table = txn.open_table(DATA_TABLE)?;

            let mut stale = Vec::new();
            for result in meta_table.iter()? {
                let (key, value) = result?;
                let meta: CachedFileMeta = serde_json::from_slice(value.value())?;
                if meta.is_stale(now) {
                    stale.push(key.value().to_string());
                }
            }

            for id in &stale {
                meta_table.remove(id.as_str())?;
                data_table.remove(id.as_str())?;
            }
            stale.len()
        };
        txn.commit()?;

        if removed > 0 {
            tracing::info!(removed, "Cleaned up old cached files");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    const DAY: i64 = 24 * 60 * 60 * 1000;
    const HOUR: i64 = 60 * 60 * 1000;

    struct ManualClock(AtomicI64);

    impl ManualClock {
        fn new(start: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(start)))
        }

        fn advance(&self, ms: i64) {
            self.0.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_millis(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn cache(clock: &Arc<ManualClock>) -> FileCache {
        FileCache::in_memory(clock.clone()).unwrap()
    }

    #[test]
    fn test_store_and_get() {
        let clock = ManualClock::new(1_700_000_000_000);
        let cache = cache(&clock);

        let id = cache.store_file("cube.stl", "model/stl", b"solid cube").unwrap();
        assert!(id.starts_with("file_1700000000000_"));
        assert!(cache.has_file(&id).unwrap());

        clock.advance(5_000);
        let file = cache.get_file(&id).unwrap().unwrap();
        assert_eq!(file.data, b"solid cube");
        assert_eq!(file.meta.name, "cube.stl");
        assert_eq!(file.meta.size, 10);
        assert_eq!(file.meta.uploaded_at, 1_700_000_000_000);
        assert_eq!(file.meta.last_accessed, 1_700_000_005_000);

        // The access was persisted
        let meta = cache.get_metadata(&id).unwrap().unwrap();
        assert_eq!(meta.last_accessed, 1_700_000_005_000);
    }

    #[test]
    fn test_metadata_read_is_not_an_access() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let id = cache.store_file("a.obj", "model/obj", b"v 0 0 0").unwrap();

        clock.advance(HOUR);
        let meta = cache.get_metadata(&id).unwrap().unwrap();
        assert_eq!(meta.last_accessed, 0);
    }

    #[test]
    fn test_missing_entries() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        assert!(cache.get_file("file_nope").unwrap().is_none());
        assert!(cache.get_metadata("file_nope").unwrap().is_none());
        assert!(!cache.has_file("file_nope").unwrap());
        assert!(!cache.remove_file("file_nope").unwrap());
    }

    #[test]
    fn test_list_remove_and_size() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let first = cache.store_file("a.stl", "model/stl", &[0u8; 100]).unwrap();
        clock.advance(1);
        let second = cache.store_file("b.stl", "model/stl", &[0u8; 50]).unwrap();

        let files = cache.list_files().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].id, first);
        assert_eq!(cache.cache_size().unwrap(), 150);

        assert!(cache.remove_file(&first).unwrap());
        assert_eq!(cache.list_files().unwrap()[0].id, second);
        assert_eq!(cache.cache_size().unwrap(), 50);
    }

    #[test]
    fn test_cleanup_removes_old_idle_entries() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let old = cache.store_file("old.stl", "model/stl", b"old").unwrap();

        clock.advance(8 * DAY);
        let fresh = cache.store_file("new.stl", "model/stl", b"new").unwrap();

        assert_eq!(cache.cleanup_old_files().unwrap(), 1);
        assert!(!cache.has_file(&old).unwrap());
        assert!(cache.has_file(&fresh).unwrap());
        assert!(cache.get_file(&old).unwrap().is_none());
    }

    #[test]
    fn test_cleanup_keeps_recently_accessed_entries() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let id = cache.store_file("keep.stl", "model/stl", b"keep").unwrap();

        // Old, but read a few hours ago
        clock.advance(30 * DAY);
        cache.get_file(&id).unwrap().unwrap();
        clock.advance(23 * HOUR);

        assert_eq!(cache.cleanup_old_files().unwrap(), 0);
        assert!(cache.has_file(&id).unwrap());

        // Past the access window it goes
        clock.advance(2 * HOUR);
        assert_eq!(cache.cleanup_old_files().unwrap(), 1);
    }

    #[test]
    fn test_cleanup_never_touches_entries_inside_access_window() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let mut ids = Vec::new();
        for gap_days in [0, 80, 12, 7] {
            clock.advance(gap_days * DAY);
            ids.push(cache.store_file("m.stl", "model/stl", b"x").unwrap());
        }

        clock.advance(DAY);
        for id in &ids {
            cache.get_file(id).unwrap().unwrap();
        }
        clock.advance(RECENT_ACCESS_MS - 1);

        assert_eq!(cache.cleanup_old_files().unwrap(), 0);
        assert_eq!(cache.list_files().unwrap().len(), 4);
    }

    #[test]
    fn test_stale_rule_needs_both_conditions() {
        let meta = |uploaded_at, last_accessed| CachedFileMeta {
            id: "f".into(),
            name: "f.stl".into(),
            size: 1,
            content_type: "model/stl".into(),
            uploaded_at,
            last_accessed,
        };
        let now = 10 * DAY;
        assert!(meta(0, 0).is_stale(now));
        assert!(!meta(0, now - HOUR).is_stale(now));
        assert!(!meta(now - DAY, 0).is_stale(now));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.redb");

        let id = {
            let cache = FileCache::open(&path).unwrap();
            cache.store_file("part.3mf", "model/3mf", b"PK").unwrap()
        };

        let cache = FileCache::open(&path).unwrap();
        let file = cache.get_file(&id).unwrap().unwrap();
        assert_eq!(file.data, b"PK");
        assert_eq!(file.meta.content_type, "model/3mf");
    }

    #[test]
    fn test_reopen_sweeps_stale_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.redb");
        let clock = ManualClock::new(0);

        let (stale, fresh) = {
            let cache = FileCache::open_with_clock(&path, clock.clone()).unwrap();
            let stale = cache.store_file("old.stl", "model/stl", b"solid old").unwrap();
            let fresh = cache.store_file("new.stl", "model/stl", b"solid new").unwrap();
            clock.advance(7 * DAY + HOUR);
            cache.get_file(&fresh).unwrap().unwrap();
            (stale, fresh)
        };

        clock.advance(HOUR);
        let cache = FileCache::open_with_clock(&path, clock.clone()).unwrap();
        assert!(!cache.has_file(&stale).unwrap());
        assert!(cache.has_file(&fresh).unwrap());
        assert_eq!(cache.list_files().unwrap().len(), 1);
    }
}
