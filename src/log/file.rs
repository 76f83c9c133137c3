//! Log File
//!
//! Append-only data file with offset-addressed random reads.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CaskError, Result};

use super::iterator::LogIterator;
use super::record::{Record, RecordHeader, HEADER_SIZE};

/// Append-only log of records
///
/// Reads take `&self` and use positional I/O, so any number of readers can
/// share a `LogFile` while no append is in flight. Appends take `&mut self`.
pub struct LogFile {
    /// Path of the underlying file
    path: PathBuf,
    /// File handle (read + write, never in append mode)
    file: File,
    /// Next append offset == bytes of records written so far
    cursor: u64,
}

impl LogFile {
    /// Open or create a log file, resuming appends after existing data
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        let cursor = file.metadata()?.len();

        tracing::trace!(path = %path.display(), cursor, "opened log file");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            cursor,
        })
    }

    /// Create an empty log file, discarding anything already at `path`
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            cursor: 0,
        })
    }

    /// Read the record starting at `offset`
    ///
    /// Returns:
    /// - `Ok(record)` — checksum verified
    /// - `Err(EndOfLog)` — `offset` is at or past the end of the log
    /// - `Err(Truncated)` — the record runs past the end of the log
    /// - `Err(ChecksumMismatch)` — the bytes are corrupt
    pub fn read_at(&self, offset: u64) -> Result<Record> {
        if offset >= self.cursor {
            return Err(CaskError::EndOfLog { offset });
        }

        let available = self.cursor - offset;
        if available < HEADER_SIZE as u64 {
            return Err(CaskError::Truncated(format!(
                "header at offset {} needs {} bytes, {} left",
                offset, HEADER_SIZE, available
            )));
        }

        // Step 1: Header
        let mut buf = [0u8; HEADER_SIZE];
        read_exact_at(&self.file, &mut buf, offset)?;
        let header = RecordHeader::decode(&buf)?;

        // Check declared sizes before allocating anything
        if header.record_size() > available {
            return Err(CaskError::Truncated(format!(
                "record at offset {} declares {} bytes, {} left",
                offset,
                header.record_size(),
                available
            )));
        }

        // Step 2: Key
        let key_offset = offset + HEADER_SIZE as u64;
        let mut key = vec![0u8; header.key_size as usize];
        read_exact_at(&self.file, &mut key, key_offset)?;

        // Step 3: Value
        let value_offset = key_offset + header.key_size as u64;
        let mut value = vec![0u8; header.value_size as usize];
        read_exact_at(&self.file, &mut value, value_offset)?;

        Record::from_parts(header, key, value)
    }

    /// Append a record, returning the offset it was written at
    ///
    /// Does not fsync; call `sync()` when durability is required.
    pub fn append(&mut self, record: &Record) -> Result<u64> {
        let encoded = record.encode()?;
        let offset = self.cursor;

        write_all_at(&self.file, &encoded, offset)?;
        self.cursor += encoded.len() as u64;

        tracing::trace!(offset, size = encoded.len(), "appended record");
        Ok(offset)
    }

    /// Force all prior appends to durable storage
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Move the file to `to`, replacing anything there
    ///
    /// The open handle keeps pointing at the same data, so reads and appends
    /// continue after the move.
    pub fn rename(&mut self, to: &Path) -> Result<()> {
        fs::rename(&self.path, to)?;
        self.path = to.to_path_buf();
        Ok(())
    }

    /// Release the file handle
    pub fn close(self) -> Result<()> {
        drop(self.file);
        Ok(())
    }

    /// Iterate over every record from offset 0
    pub fn iter(&self) -> LogIterator<'_> {
        LogIterator::new(self)
    }

    /// Current length in bytes (the next append offset)
    pub fn len(&self) -> u64 {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// =============================================================================
// Positional I/O
// =============================================================================

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(unix)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(windows)]
fn write_all_at(file: &File, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_write(buf, offset) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => {
                buf = &buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
