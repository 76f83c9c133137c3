//! Index Replay
//!
//! Rebuilds the index by scanning the whole log at open time.

use crate::error::Result;
use crate::log::{LogFile, Operation};

use super::Index;

/// Result of a replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayResult {
    /// Number of records read from the log
    pub records_replayed: u64,

    /// Number of put records folded into the index
    pub puts_indexed: u64,

    /// Number of delete records that dropped a key from the index
    pub tombstones_applied: u64,

    /// Log length in bytes at replay time
    pub log_size: u64,
}

impl Index {
    /// Rebuild an index from a log
    ///
    /// Folds every put record over the log in order (last write wins).
    /// Delete records are never indexed: a tombstone drops any earlier
    /// offset for its key, so a key whose final record is a tombstone is
    /// absent afterwards. Corrupt or truncated records abort the replay
    /// with an error; nothing is repaired.
    pub fn rebuild(log: &LogFile) -> Result<(Index, ReplayResult)> {
        let mut index = Index::new();
        let mut result = ReplayResult {
            log_size: log.len(),
            ..ReplayResult::default()
        };

        for item in log.iter() {
            let (offset, record) = item?;
            result.records_replayed += 1;

            match record.operation() {
                Operation::Put => {
                    index.insert(record.key().to_vec(), offset);
                    result.puts_indexed += 1;
                }
                Operation::Delete => {
                    index.remove(record.key());
                    result.tombstones_applied += 1;
                }
            }
        }

        Ok((index, result))
    }
}
