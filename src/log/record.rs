//! Log Record definitions
//!
//! Defines the structure of a single log record and its binary codec.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CaskError, Result};

/// Header size: CRC (4) + Type (2) + Op (2) + KeyLen (4) + ValLen (4) = 16 bytes
pub const HEADER_SIZE: usize = 16;

/// Opaque caller-supplied classification stamped on each record.
///
/// The engine never interprets it; the named constants cover the data
/// structures commonly layered on top of a cask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DataType(pub u16);

impl DataType {
    pub const STRING: DataType = DataType(0);
    pub const LIST: DataType = DataType(1);
    pub const HASH: DataType = DataType(2);
    pub const SET: DataType = DataType(3);
    pub const ZSET: DataType = DataType(4);
}

/// Operation recorded in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Operation {
    /// Put a key-value pair
    Put = 0,

    /// Delete a key (tombstone, no value)
    Delete = 1,
}

impl TryFrom<u16> for Operation {
    type Error = CaskError;

    fn try_from(raw: u16) -> Result<Self> {
        match raw {
            0 => Ok(Operation::Put),
            1 => Ok(Operation::Delete),
            other => Err(CaskError::UnknownOperation(other)),
        }
    }
}

/// Decoded fixed-size record header
///
/// Reading a record is split in two: decode the header, then read exactly
/// `key_size` and `value_size` bytes after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub checksum: u32,
    pub data_type: DataType,
    pub operation: Operation,
    pub key_size: u32,
    pub value_size: u32,
}

impl RecordHeader {
    /// Parse the 16-byte header at the start of `buf`
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(CaskError::Truncated(format!(
                "header needs {} bytes, got {}",
                HEADER_SIZE,
                buf.len()
            )));
        }

        let mut buf = &buf[..HEADER_SIZE];
        let checksum = buf.get_u32();
        let data_type = DataType(buf.get_u16());
        let operation = Operation::try_from(buf.get_u16())?;
        let key_size = buf.get_u32();
        let value_size = buf.get_u32();

        Ok(Self {
            checksum,
            data_type,
            operation,
            key_size,
            value_size,
        })
    }

    /// Total on-disk size of the record this header describes
    pub fn record_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.key_size as u64 + self.value_size as u64
    }

    /// Header bytes covered by the checksum (everything after the CRC field)
    fn checksummed_bytes(&self) -> [u8; HEADER_SIZE - 4] {
        let mut out = [0u8; HEADER_SIZE - 4];
        let mut buf = &mut out[..];
        buf.put_u16(self.data_type.0);
        buf.put_u16(self.operation as u16);
        buf.put_u32(self.key_size);
        buf.put_u32(self.value_size);
        out
    }
}

/// A single record in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    checksum: u32,
    data_type: DataType,
    operation: Operation,
    key: Vec<u8>,
    value: Vec<u8>,
}

impl Record {
    /// Create a put record
    pub fn put(key: Vec<u8>, value: Vec<u8>, data_type: DataType) -> Self {
        Self::new(key, value, Operation::Put, data_type)
    }

    /// Create a delete record (tombstone)
    pub fn delete(key: Vec<u8>, data_type: DataType) -> Self {
        Self::new(key, Vec::new(), Operation::Delete, data_type)
    }

    /// Create a record, computing its checksum
    pub fn new(key: Vec<u8>, value: Vec<u8>, operation: Operation, data_type: DataType) -> Self {
        let mut record = Self {
            checksum: 0,
            data_type,
            operation,
            key,
            value,
        };
        record.checksum = record.compute_checksum();
        record
    }

    /// Rebuild a record from a decoded header and the payload read after it.
    ///
    /// Fails with `ChecksumMismatch` if the stored CRC does not match the
    /// header fields and payload.
    pub fn from_parts(header: RecordHeader, key: Vec<u8>, value: Vec<u8>) -> Result<Self> {
        if key.len() as u64 != header.key_size as u64 || value.len() as u64 != header.value_size as u64 {
            return Err(CaskError::Truncated(format!(
                "payload is {}+{} bytes, header declares {}+{}",
                key.len(),
                value.len(),
                header.key_size,
                header.value_size
            )));
        }

        let record = Self {
            checksum: header.checksum,
            data_type: header.data_type,
            operation: header.operation,
            key,
            value,
        };

        let actual = record.compute_checksum();
        if actual != header.checksum {
            return Err(CaskError::ChecksumMismatch {
                expected: header.checksum,
                actual,
            });
        }

        Ok(record)
    }

    /// Serialize to the on-disk layout
    pub fn encode(&self) -> Result<Bytes> {
        if self.key.is_empty() {
            return Err(CaskError::InvalidRecord("record has no key".to_string()));
        }
        let header = self.header()?;

        let mut buf = BytesMut::with_capacity(self.size() as usize);
        buf.put_u32(header.checksum);
        buf.put_slice(&header.checksummed_bytes());
        buf.put_slice(&self.key);
        buf.put_slice(&self.value);

        Ok(buf.freeze())
    }

    /// Decode a complete record (header + payload) and verify its checksum
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let header = RecordHeader::decode(buf)?;
        let total = header.record_size();
        if (buf.len() as u64) < total {
            return Err(CaskError::Truncated(format!(
                "record needs {} bytes, got {}",
                total,
                buf.len()
            )));
        }

        let key_end = HEADER_SIZE + header.key_size as usize;
        let key = buf[HEADER_SIZE..key_end].to_vec();
        let value = buf[key_end..total as usize].to_vec();

        Self::from_parts(header, key, value)
    }

    /// On-disk size: header + key + value
    pub fn size(&self) -> u64 {
        HEADER_SIZE as u64 + self.key.len() as u64 + self.value.len() as u64
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn is_tombstone(&self) -> bool {
        self.operation == Operation::Delete
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn key_size(&self) -> u32 {
        self.key.len() as u32
    }

    pub fn value_size(&self) -> u32 {
        self.value.len() as u32
    }

    /// Consume the record, keeping only the value
    pub fn into_value(self) -> Vec<u8> {
        self.value
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn header(&self) -> Result<RecordHeader> {
        let key_size = u32::try_from(self.key.len())
            .map_err(|_| CaskError::InvalidRecord(format!("key of {} bytes", self.key.len())))?;
        let value_size = u32::try_from(self.value.len())
            .map_err(|_| CaskError::InvalidRecord(format!("value of {} bytes", self.value.len())))?;

        Ok(RecordHeader {
            checksum: self.checksum,
            data_type: self.data_type,
            operation: self.operation,
            key_size,
            value_size,
        })
    }

    /// CRC32 (IEEE) over header fields after the CRC, then key, then value
    fn compute_checksum(&self) -> u32 {
        let header = RecordHeader {
            checksum: 0,
            data_type: self.data_type,
            operation: self.operation,
            key_size: self.key.len() as u32,
            value_size: self.value.len() as u32,
        };

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&header.checksummed_bytes());
        hasher.update(&self.key);
        hasher.update(&self.value);
        hasher.finalize()
    }
}
