//! Log Iterator
//!
//! Sequential iteration over every record in a log file.

use crate::error::Result;

use super::file::LogFile;
use super::record::Record;

/// Iterator over `(offset, record)` pairs in append order
///
/// Stops cleanly at end-of-log. Any other read error is yielded once and
/// ends the iteration, since the position of the next record is unknown.
pub struct LogIterator<'a> {
    log: &'a LogFile,
    /// Offset of the next record to read
    offset: u64,
    /// Set after an error so the iterator fuses
    done: bool,
}

impl<'a> LogIterator<'a> {
    pub(super) fn new(log: &'a LogFile) -> Self {
        Self {
            log,
            offset: 0,
            done: false,
        }
    }
}

impl<'a> Iterator for LogIterator<'a> {
    type Item = Result<(u64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.log.read_at(self.offset) {
            Ok(record) => {
                let offset = self.offset;
                self.offset += record.size();
                Some(Ok((offset, record)))
            }
            Err(e) if e.is_end_of_log() => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
