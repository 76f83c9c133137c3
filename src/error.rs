//! Error types for TinyCask
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using CaskError
pub type Result<T> = std::result::Result<T, CaskError>;

/// Unified error type for TinyCask operations
#[derive(Debug, Error)]
pub enum CaskError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Input Validation Errors
    // -------------------------------------------------------------------------
    #[error("Key must not be empty")]
    EmptyKey,

    #[error("Key is too long: {len} bytes (max {max})")]
    KeyTooLong { len: usize, max: usize },

    #[error("Value is too long: {len} bytes (max {max})")]
    ValueTooLong { len: usize, max: usize },

    // -------------------------------------------------------------------------
    // Record / Log Errors
    // -------------------------------------------------------------------------
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Sentinel returned when a read starts at or past the end of the log.
    /// Scans treat it as loop termination, not as a failure.
    #[error("End of log at offset {offset}")]
    EndOfLog { offset: u64 },

    #[error("Checksum mismatch: stored {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Truncated record: {0}")]
    Truncated(String),

    #[error("Unknown record operation: {0}")]
    UnknownOperation(u16),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Nothing to merge: log is empty")]
    NothingToMerge,

    #[error("Transaction already committed or rolled back")]
    TransactionDone,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CaskError {
    /// True for the end-of-log sentinel
    pub fn is_end_of_log(&self) -> bool {
        matches!(self, CaskError::EndOfLog { .. })
    }

    /// True for errors that indicate damaged bytes on disk
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            CaskError::ChecksumMismatch { .. }
                | CaskError::Truncated(_)
                | CaskError::UnknownOperation(_)
        )
    }
}
