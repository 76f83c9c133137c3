//! Log Module
//!
//! The append-only data file and the record format stored in it.
//!
//! ## Responsibilities
//! - Encode/decode records with CRC32 checksums
//! - Append records and hand back their byte offset
//! - Random-offset reads for index lookups
//! - Sequential scans for replay and merge
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Record 1                                                     │
//! │ ┌─────────┬──────────┬────────┬──────────┬──────────┬──────┐ │
//! │ │ CRC (4) │ Type (2) │ Op (2) │ KLen (4) │ VLen (4) │ K, V │ │
//! │ └─────────┴──────────┴────────┴──────────┴──────────┴──────┘ │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Record 2                                                     │
//! │ ...                                                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are big-endian. The CRC covers every byte after itself.
//! There is no file header: offset 0 is the first record.

mod file;
mod iterator;
mod record;

pub use file::LogFile;
pub use iterator::LogIterator;
pub use record::{DataType, Operation, Record, RecordHeader, HEADER_SIZE};

/// File name of the active log inside the data directory
pub const LOG_FILENAME: &str = "tinycask.data";

/// File name of the transient file written during merge
pub const MERGE_FILENAME: &str = "tinycask.data.merge";
