//! # TinyCask
//!
//! A single-file, append-only key-value store in the Bitcask family:
//! - Every write is appended to one log file as a checksummed record
//! - An in-memory index maps each key to the offset of its latest record
//! - The index is rebuilt by replaying the log on open
//! - Merge rewrites the log, dropping superseded records
//! - Buffered, single-shot transactions on top of the store
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Transaction (optional)                       │
//! │        (staged puts, read cache, last-write-wins)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Store                                 │
//! │         (RwLock: single writer / many readers)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   LogFile   │◄─────────│    Index    │
//!   │  (Append)   │  offsets │  (HashMap)  │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use tinycask::{DataType, Store};
//!
//! # fn main() -> tinycask::Result<()> {
//! let store = Store::open_path(std::path::Path::new("./data"), DataType::STRING)?;
//! store.put(b"hello", b"world")?;
//! assert_eq!(store.get(b"hello")?, b"world");
//!
//! let tx = store.begin();
//! tx.put(b"hello", b"again")?;
//! tx.commit()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod log;
pub mod index;
pub mod store;
pub mod transaction;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CaskError, Result};
pub use config::{Config, SyncStrategy};
pub use log::{DataType, Operation, Record};
pub use store::{MergeResult, Store};
pub use transaction::{Transaction, TxState};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of TinyCask
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
