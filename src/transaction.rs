//! Transaction Module
//!
//! Buffered, single-shot units of work over a store.
//!
//! ## Semantics
//! - Puts are staged in memory and only reach the store on commit
//! - Reads see committed store state through a per-transaction cache,
//!   never the transaction's own staged puts
//! - Several puts to one key resolve last-write-wins by timestamp
//! - Exactly one of commit/rollback succeeds; everything after fails
//!   with `TransactionDone`
//!
//! Commit applies each key with its own store write, so it is not atomic
//! with respect to concurrent readers.
//!
//! Staged entries are internal to the transaction:
//!
//! ```compile_fail
//! use tinycask::transaction::TxEntry;
//! ```

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;

use crate::error::{CaskError, Result};
use crate::log::Operation;
use crate::store::Store;

/// Largest key a transaction accepts (fits the record's u32 size field)
pub const MAX_KEY_LEN: usize = u32::MAX as usize - 1;

/// Largest value a transaction accepts
pub const MAX_VALUE_LEN: usize = u32::MAX as usize - 1;

/// Lifecycle of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Active,
    Committed,
    RolledBack,
}

/// A staged write
#[derive(Debug, Clone)]
struct TxEntry {
    key: Vec<u8>,
    value: Vec<u8>,
    operation: Operation,
    timestamp: Instant,
}

struct TxInner {
    state: TxState,
    /// Staged writes in call order
    entries: Vec<TxEntry>,
    /// Values already read from the store
    cache: HashMap<Vec<u8>, Vec<u8>>,
}

impl TxInner {
    fn ensure_active(&self) -> Result<()> {
        match self.state {
            TxState::Active => Ok(()),
            TxState::Committed | TxState::RolledBack => Err(CaskError::TransactionDone),
        }
    }
}

/// A buffered transaction bound to one store
///
/// All methods take `&self`; the staged writes and read cache sit behind a
/// mutex owned by the transaction, independent of the store's lock.
pub struct Transaction<'a> {
    store: &'a Store,
    inner: Mutex<TxInner>,
}

impl<'a> Transaction<'a> {
    /// Begin a transaction with nothing staged and an empty cache
    pub fn new(store: &'a Store) -> Self {
        Self {
            store,
            inner: Mutex::new(TxInner {
                state: TxState::Active,
                entries: Vec::new(),
                cache: HashMap::new(),
            }),
        }
    }

    /// Read a key as of committed store state
    ///
    /// A cache miss reads through to the store and caches the result.
    /// Writes staged in this transaction are not visible here.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        inner.ensure_active()?;
        check_key(key)?;

        if let Some(value) = inner.cache.get(key) {
            return Ok(value.clone());
        }

        let value = self.store.get(key)?;
        inner.cache.insert(key.to_vec(), value.clone());
        Ok(value)
    }

    /// Stage a put
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_active()?;
        check_key(key)?;
        if value.len() > MAX_VALUE_LEN {
            return Err(CaskError::ValueTooLong {
                len: value.len(),
                max: MAX_VALUE_LEN,
            });
        }

        inner.entries.push(TxEntry {
            key: key.to_vec(),
            value: value.to_vec(),
            operation: Operation::Put,
            timestamp: Instant::now(),
        });
        Ok(())
    }

    /// Forget a cached read
    ///
    /// Stages nothing: the key is not deleted from the store on commit.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_active()?;
        check_key(key)?;

        inner.cache.remove(key);
        Ok(())
    }

    /// Apply staged writes to the store and sync it
    ///
    /// The transaction is finished as soon as commit starts; a store error
    /// while applying is returned and cannot be retried on this transaction.
    pub fn commit(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_active()?;
        inner.state = TxState::Committed;

        let entries = std::mem::take(&mut inner.entries);
        inner.cache.clear();

        let resolved = resolve_last_write_wins(entries);
        tracing::debug!(keys = resolved.len(), "committing transaction");

        for entry in resolved {
            match entry.operation {
                Operation::Put => self.store.put(&entry.key, &entry.value)?,
                Operation::Delete => self.store.delete(&entry.key)?,
            }
        }

        self.store.sync()
    }

    /// Discard staged writes and cached reads
    pub fn rollback(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_active()?;
        inner.state = TxState::RolledBack;

        tracing::debug!(discarded = inner.entries.len(), "rolling back transaction");
        inner.entries.clear();
        inner.cache.clear();
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> TxState {
        self.inner.lock().state
    }

    pub fn is_done(&self) -> bool {
        self.state() != TxState::Active
    }

    /// Number of staged writes (before conflict resolution)
    pub fn staged_len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

fn check_key(key: &[u8]) -> Result<()> {
    if key.len() > MAX_KEY_LEN {
        return Err(CaskError::KeyTooLong {
            len: key.len(),
            max: MAX_KEY_LEN,
        });
    }
    Ok(())
}

/// Collapse staged writes to one per key, keeping the latest timestamp.
///
/// Keys come out in the order they were first staged. Equal timestamps
/// resolve to the later-staged entry.
fn resolve_last_write_wins(entries: Vec<TxEntry>) -> Vec<TxEntry> {
    let mut slots: HashMap<Vec<u8>, usize> = HashMap::new();
    let mut resolved: Vec<TxEntry> = Vec::new();

    for entry in entries {
        match slots.get(&entry.key) {
            Some(&slot) => {
                if entry.timestamp >= resolved[slot].timestamp {
                    resolved[slot] = entry;
                }
            }
            None => {
                slots.insert(entry.key.clone(), resolved.len());
                resolved.push(entry);
            }
        }
    }

    resolved
}
