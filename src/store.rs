//! Store Module
//!
//! The storage engine that owns one log file and its index.
//!
//! ## Responsibilities
//! - Append puts and tombstones, keeping the index pointed at the latest record
//! - Serve point reads through the index
//! - Rebuild the index from the log on startup
//! - Compact the log on demand (merge)

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::config::{Config, SyncStrategy};
use crate::error::{CaskError, Result};
use crate::index::Index;
use crate::log::{DataType, LogFile, Record, LOG_FILENAME, MERGE_FILENAME};
use crate::transaction::Transaction;

/// Outcome of a merge
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Records read from the old log
    pub records_scanned: u64,

    /// Live records copied into the new log
    pub records_kept: u64,

    /// Log length before the merge
    pub bytes_before: u64,

    /// Log length after the merge
    pub bytes_after: u64,
}

/// State guarded as a single unit: every index offset must point into `log`
struct StoreInner {
    index: Index,
    log: LogFile,
}

/// A single-file, append-only key-value store
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader
///
/// - **Writes** (put/delete/merge): exclusive `inner` lock
///   - Serialized with each other and with readers
///   - Merge holds it for its whole run, since it swaps the file and
///     rewrites every offset in the index
///
/// - **Reads** (get): shared `inner` lock
///   - Any number of concurrent readers while no write is in flight
///   - `LogFile::read_at` uses positional reads, so no seek state is shared
pub struct Store {
    /// Store configuration
    config: Config,

    /// Canonical path of the active log
    log_path: PathBuf,

    /// Path of the transient merge output
    merge_path: PathBuf,

    /// Index + log, locked together
    inner: RwLock<StoreInner>,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory if needed
    /// 2. Remove a merge file left by an interrupted merge
    /// 3. Open (or create) the active log
    /// 4. Rebuild the index by replaying the log
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Data directory
        fs::create_dir_all(&config.data_dir)?;

        let log_path = config.data_dir.join(LOG_FILENAME);
        let merge_path = config.data_dir.join(MERGE_FILENAME);

        // Step 2: A merge that never reached its rename left the active log untouched
        if merge_path.exists() {
            tracing::warn!(path = %merge_path.display(), "removing stale merge file");
            fs::remove_file(&merge_path)?;
        }

        // Step 3: Active log
        let log = LogFile::open(&log_path)?;

        // Step 4: Replay
        let (index, replay) = Index::rebuild(&log)?;
        tracing::debug!(
            dir = %config.data_dir.display(),
            records = replay.records_replayed,
            puts = replay.puts_indexed,
            tombstones = replay.tombstones_applied,
            keys = index.len(),
            log_size = replay.log_size,
            "store opened"
        );

        Ok(Self {
            config,
            log_path,
            merge_path,
            inner: RwLock::new(StoreInner { index, log }),
        })
    }

    /// Open with a directory and type tag (convenience method)
    ///
    /// Uses default config for everything else
    pub fn open_path(path: &Path, data_type: DataType) -> Result<Self> {
        let config = Config::builder()
            .data_dir(path)
            .data_type(data_type)
            .build();
        Self::open(config)
    }

    /// Get the value for a key
    ///
    /// Returns an empty value when the key is unknown. A key deleted in this
    /// session still has an index entry pointing at its tombstone, and also
    /// reads back as empty.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        if key.is_empty() {
            return Err(CaskError::EmptyKey);
        }

        let inner = self.inner.read();
        match inner.index.get(key) {
            Some(offset) => Ok(inner.log.read_at(offset)?.into_value()),
            None => Ok(Vec::new()),
        }
    }

    /// Put a key-value pair
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(CaskError::EmptyKey);
        }

        let record = Record::put(key.to_vec(), value.to_vec(), self.config.data_type);
        self.append(record)
    }

    /// Delete a key
    ///
    /// Appends a tombstone and points the index at it. The key stays in the
    /// live index until the next open, whose replay drops it.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(CaskError::EmptyKey);
        }

        let record = Record::delete(key.to_vec(), self.config.data_type);
        self.append(record)
    }

    /// Force all appended records to disk
    pub fn sync(&self) -> Result<()> {
        self.inner.read().log.sync()
    }

    /// Compact the log, keeping only the record each index entry points at
    ///
    /// Steps:
    /// 1. Scan the log; a record at offset `o` is live iff `index[key] == o`
    /// 2. Write live records, in log order, to a fresh merge file and fsync it
    /// 3. Rename the merge file over the active log
    /// 4. Re-point the index at the new offsets and adopt the merged file
    ///
    /// Any failure before step 4 leaves the index and the old log untouched.
    ///
    /// Live tombstones are copied like any other record.
    pub fn merge(&self) -> Result<MergeResult> {
        let mut inner = self.inner.write();

        if inner.log.is_empty() {
            return Err(CaskError::NothingToMerge);
        }

        let mut result = MergeResult {
            bytes_before: inner.log.len(),
            ..MergeResult::default()
        };

        // Step 1: Collect live records
        let mut live = Vec::new();
        for item in inner.log.iter() {
            let (offset, record) = item?;
            result.records_scanned += 1;
            if inner.index.is_live(record.key(), offset) {
                live.push(record);
            }
        }

        if live.is_empty() {
            result.bytes_after = result.bytes_before;
            tracing::info!(scanned = result.records_scanned, "merge found no live records");
            return Ok(result);
        }

        // Step 2: Write the merge file (kept open across the rename)
        let (mut merged, relocated) = match self.write_merge_file(&live) {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&self.merge_path);
                return Err(e);
            }
        };

        // Step 3: Swap files (atomic replace)
        if let Err(e) = merged.rename(&self.log_path) {
            drop(merged);
            let _ = fs::remove_file(&self.merge_path);
            return Err(e);
        }

        // Step 4: Adopt new offsets and the new file together; nothing below can fail
        for (key, offset) in relocated {
            inner.index.insert(key, offset);
        }
        inner.log = merged;

        result.records_kept = live.len() as u64;
        result.bytes_after = inner.log.len();

        // Persist the rename itself
        sync_dir(&self.config.data_dir)?;

        tracing::info!(
            scanned = result.records_scanned,
            kept = result.records_kept,
            bytes_before = result.bytes_before,
            bytes_after = result.bytes_after,
            "merge complete"
        );

        Ok(result)
    }

    /// Start a buffered transaction over this store
    pub fn begin(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Close the store gracefully
    ///
    /// Syncs the log to disk and releases the file handle
    pub fn close(self) -> Result<()> {
        let inner = self.inner.into_inner();
        inner.log.sync()?;
        inner.log.close()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of keys in the index (tombstoned keys included until reopen)
    pub fn len(&self) -> usize {
        self.inner.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().index.is_empty()
    }

    /// True if the index has an entry for `key`
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.inner.read().index.contains_key(key)
    }

    /// Snapshot of indexed keys (unordered)
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.inner.read().index.keys().map(|k| k.to_vec()).collect()
    }

    /// Current log length in bytes
    pub fn log_size(&self) -> u64 {
        self.inner.read().log.len()
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the active log path
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Type tag stamped on records written by this store
    pub fn data_type(&self) -> DataType {
        self.config.data_type
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Append a record and point the index at it (exclusive lock)
    fn append(&self, record: Record) -> Result<()> {
        let mut inner = self.inner.write();

        let offset = inner.log.append(&record)?;
        if self.config.sync_strategy == SyncStrategy::EveryWrite {
            inner.log.sync()?;
        }

        tracing::trace!(offset, op = ?record.operation(), "indexed record");
        inner.index.insert(record.key().to_vec(), offset);
        Ok(())
    }

    /// Write live records to a fresh, synced merge file, returning it with their new offsets
    fn write_merge_file(&self, live: &[Record]) -> Result<(LogFile, Vec<(Vec<u8>, u64)>)> {
        let mut merged = LogFile::create(&self.merge_path)?;
        let mut relocated = Vec::with_capacity(live.len());

        for record in live {
            let offset = merged.append(record)?;
            relocated.push((record.key().to_vec(), offset));
        }

        merged.sync()?;
        Ok((merged, relocated))
    }
}

/// fsync a directory so renames inside it survive a crash
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
