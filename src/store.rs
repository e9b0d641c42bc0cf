//! Main Store struct tying the log and index together.

use crate::error::{LedgerError, Result};
use crate::records::{LogEntry, RecordIndex, RecordLog};
use crate::types::{NewPurchase, PurchaseRecord, RecordId, StoreStats};
use fs2::FileExt;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Base path for the store.
    pub path: PathBuf,

    /// Whether to create the store if it doesn't exist.
    pub create_if_missing: bool,

    /// Sync the log every N frames (1 = every write is durable on return).
    pub sync_interval: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./purchases"),
            create_if_missing: true,
            sync_interval: RecordLog::DEFAULT_SYNC_INTERVAL,
        }
    }
}

impl StoreConfig {
    /// Default configuration rooted at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Magic bytes for store manifest.
const STORE_MAGIC: &[u8; 4] = b"PLS\0";

/// Current store format version.
const STORE_VERSION: u8 = 1;

const LOG_FILE: &str = "purchases.log";

/// The purchase record store.
///
/// Provides a unified interface for:
/// - Inserting records (singly or as one atomic batch)
/// - Deleting records by id
/// - Reading back every live record in display order
pub struct Store {
    /// Store configuration.
    config: StoreConfig,

    /// Lock file for exclusive access.
    _lock_file: File,

    /// Purchase log.
    log: RecordLog,

    /// Live record index.
    index: RecordIndex,

    /// Lock for write operations to ensure atomicity.
    write_lock: Mutex<()>,
}

impl Store {
    /// Open an existing store or create a new one.
    pub fn open_or_create(config: StoreConfig) -> Result<Self> {
        if config.path.join("MANIFEST").exists() {
            Self::open(config)
        } else if config.create_if_missing {
            Self::create(config)
        } else {
            Err(LedgerError::NotInitialized)
        }
    }

    /// Create a new store.
    pub fn create(config: StoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;

        Self::write_manifest(&config.path)?;

        let lock_file = Self::acquire_lock(&config.path)?;

        let log = RecordLog::open_with_sync_interval(config.path.join(LOG_FILE), config.sync_interval)?;
        let index = RecordIndex::rebuild(&log)?;

        tracing::info!(path = %config.path.display(), "created purchase store");

        Ok(Self {
            config,
            _lock_file: lock_file,
            log,
            index,
            write_lock: Mutex::new(()),
        })
    }

    /// Open an existing store.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::verify_manifest(&config.path)?;

        let lock_file = Self::acquire_lock(&config.path)?;

        let log = RecordLog::open_with_sync_interval(config.path.join(LOG_FILE), config.sync_interval)?;
        let index = RecordIndex::rebuild(&log)?;

        tracing::info!(
            path = %config.path.display(),
            records = index.count(),
            "opened purchase store"
        );

        Ok(Self {
            config,
            _lock_file: lock_file,
            log,
            index,
            write_lock: Mutex::new(()),
        })
    }

    // --- Record Operations ---

    /// Insert one record.
    ///
    /// The input is stored as given; validation is the caller's job.
    pub fn insert(&self, input: NewPurchase) -> Result<PurchaseRecord> {
        let mut records = self.insert_batch(vec![input])?;
        records
            .pop()
            .ok_or_else(|| LedgerError::InvalidOperation("insert produced no record".into()))
    }

    /// Insert several records in one frame: all of them persist or none do.
    pub fn insert_batch(&self, inputs: Vec<NewPurchase>) -> Result<Vec<PurchaseRecord>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let _lock = self.write_lock.lock();

        let (records, offset) = self.log.append_inserts(inputs)?;

        let entries: Vec<LogEntry> = records.iter().cloned().map(LogEntry::Insert).collect();
        self.index.apply(offset, &entries);

        for record in &records {
            tracing::info!(id = record.id.0, item = %record.item_description, "inserted purchase");
        }

        Ok(records)
    }

    /// Delete a record by id.
    ///
    /// Unknown ids are a no-op; returns whether a record was removed.
    pub fn delete_by_id(&self, id: RecordId) -> Result<bool> {
        let _lock = self.write_lock.lock();

        if !self.index.contains(id) {
            tracing::debug!(id = id.0, "delete of unknown id ignored");
            return Ok(false);
        }

        let offset = self.log.append_delete(id)?;
        self.index.apply(offset, &[LogEntry::Delete { id }]);

        tracing::info!(id = id.0, "deleted purchase");

        Ok(true)
    }

    /// Get a live record by id.
    pub fn get(&self, id: RecordId) -> Result<Option<PurchaseRecord>> {
        self.read_live(id)
    }

    /// Read every live record, newest purchase date first, ties by id descending.
    ///
    /// Each call replays the log from disk.
    pub fn load_all(&self) -> Result<Vec<PurchaseRecord>> {
        let mut live: BTreeMap<RecordId, PurchaseRecord> = BTreeMap::new();

        for frame in self.log.iter_from(0) {
            for entry in frame?.entries {
                match entry {
                    LogEntry::Insert(record) => {
                        live.insert(record.id, record);
                    }
                    LogEntry::Delete { id } => {
                        live.remove(&id);
                    }
                }
            }
        }

        let mut records: Vec<PurchaseRecord> = live.into_values().collect();
        records.sort_by(|a, b| {
            b.purchase_date
                .cmp(&a.purchase_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(records)
    }

    // --- Utility ---

    /// Get store statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            record_count: self.index.count() as u64,
            deleted_count: self.index.deleted_count(),
            frame_count: self.index.frame_count(),
            log_size_bytes: self.log.size(),
        }
    }

    /// Sync all data to disk.
    pub fn sync(&self) -> Result<()> {
        self.log.sync()
    }

    /// Get the store path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    // --- Private Helpers ---

    fn read_live(&self, id: RecordId) -> Result<Option<PurchaseRecord>> {
        let Some(offset) = self.index.get_offset(id) else {
            return Ok(None);
        };

        let (frame, _) = self.log.read_at(offset)?;
        Ok(frame.entries.into_iter().find_map(|entry| match entry {
            LogEntry::Insert(record) if record.id == id => Some(record),
            _ => None,
        }))
    }

    fn write_manifest(path: &Path) -> Result<()> {
        use std::io::Write;

        let manifest_path = path.join("MANIFEST");
        let mut file = File::create(manifest_path)?;

        file.write_all(STORE_MAGIC)?;
        file.write_all(&[STORE_VERSION])?;
        file.sync_all()?;

        Ok(())
    }

    fn verify_manifest(path: &Path) -> Result<()> {
        use std::io::Read;

        let manifest_path = path.join("MANIFEST");
        let mut file = File::open(manifest_path)?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != STORE_MAGIC {
            return Err(LedgerError::InvalidFormat("Invalid store magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != STORE_VERSION {
            return Err(LedgerError::InvalidFormat(format!(
                "Unsupported store version: {}",
                version[0]
            )));
        }

        Ok(())
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_path = path.join("LOCK");
        let lock_file = File::create(lock_path)?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| LedgerError::Locked)?;

        Ok(lock_file)
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // Best-effort sync on drop
        let _ = self.sync();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> StoreConfig {
        StoreConfig::at(dir.path().join("store"))
    }

    fn purchase(date: (i32, u32, u32), item: &str, quantity: f64) -> NewPurchase {
        NewPurchase {
            buyer: "Ana".into(),
            purchase_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            supplier: "Acme".into(),
            destination_city: "Recife".into(),
            item_description: item.into(),
            quantity,
        }
    }

    #[test]
    fn test_create_store() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();

        assert!(store.path().join("MANIFEST").exists());
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_insert_assigns_ids() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();

        let a = store.insert(purchase((2024, 1, 1), "toner", 2.0)).unwrap();
        let b = store.insert(purchase((2024, 1, 1), "cable", 5.0)).unwrap();

        assert_eq!(a.id, RecordId(1));
        assert_eq!(b.id, RecordId(2));
        assert_eq!(store.get(a.id).unwrap(), Some(a));
    }

    #[test]
    fn test_load_all_ordering() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();

        store.insert(purchase((2024, 1, 1), "a", 1.0)).unwrap(); // 1
        store.insert(purchase((2024, 3, 1), "b", 1.0)).unwrap(); // 2
        store.insert(purchase((2024, 1, 1), "c", 1.0)).unwrap(); // 3
        store.insert(purchase((2024, 2, 1), "d", 1.0)).unwrap(); // 4

        let ids: Vec<u64> = store.load_all().unwrap().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();

        let record = store.insert(purchase((2024, 1, 1), "toner", 2.0)).unwrap();

        assert!(store.delete_by_id(record.id).unwrap());
        assert!(!store.delete_by_id(record.id).unwrap());
        assert!(!store.delete_by_id(RecordId(999)).unwrap());
        assert!(store.load_all().unwrap().is_empty());
        assert_eq!(store.stats().deleted_count, 1);
    }

    #[test]
    fn test_persistence() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);

        {
            let store = Store::create(config.clone()).unwrap();
            store
                .insert_batch(vec![
                    purchase((2024, 1, 1), "toner", 2.0),
                    purchase((2024, 1, 1), "cable", 5.0),
                ])
                .unwrap();
            store.delete_by_id(RecordId(2)).unwrap();
        }

        {
            let store = Store::open(config).unwrap();
            let records = store.load_all().unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].item_description, "toner");

            // Deleted ids are not handed out again.
            let next = store.insert(purchase((2024, 1, 2), "paper", 1.0)).unwrap();
            assert_eq!(next.id, RecordId(3));
        }
    }

    #[test]
    fn test_store_lock() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);

        let _store = Store::create(config.clone()).unwrap();

        let result = Store::open(config);
        assert!(matches!(result, Err(LedgerError::Locked)));
    }

    #[test]
    fn test_open_or_create_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);

        {
            let store = Store::open_or_create(config.clone()).unwrap();
            store.insert(purchase((2024, 1, 1), "toner", 2.0)).unwrap();
        }

        let store = Store::open_or_create(config).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_store_without_create() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            create_if_missing: false,
            ..test_config(&dir)
        };

        assert!(matches!(
            Store::open_or_create(config),
            Err(LedgerError::NotInitialized)
        ));
    }

    #[test]
    fn test_stats() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(test_config(&dir)).unwrap();

        store
            .insert_batch(vec![
                purchase((2024, 1, 1), "toner", 2.0),
                purchase((2024, 1, 1), "cable", 5.0),
            ])
            .unwrap();

        let stats = store.stats();
        assert_eq!(stats.record_count, 2);
        assert_eq!(stats.frame_count, 1);
        assert!(stats.log_size_bytes > 0);
    }
}
