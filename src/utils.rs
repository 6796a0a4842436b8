/*!
 * Length-prefixed buffer primitives
 *
 * `ByteWriter` writes into a caller-provided slice and refuses to write past
 * its end. `ByteReader` is a `Copy` cursor over an input slice: taking a
 * snapshot is a plain copy, and every read either succeeds and advances or
 * fails and leaves the cursor where it was.
 *
 * Wire contract: every integer, including length prefixes, is encoded
 * little-endian. Length prefixes are 32 bits wide.
 */

use thiserror::Error;

use crate::error::{CryptoError, CryptoResult, ErrorCode};
use crate::secure_memory::SecureBytes;

/// Size of a length prefix on the wire
pub const LENGTH_PREFIX_SIZE: usize = std::mem::size_of::<u32>();

/// Reasons a read from a `ByteReader` can fail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("truncated input: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("allocation of {0} bytes failed")]
    AllocationFailed(usize),

    #[error("malformed data: {0}")]
    Malformed(&'static str),
}

impl From<ReadError> for ErrorCode {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::AllocationFailed(_) => ErrorCode::MemoryAllocationFailed,
            _ => ErrorCode::InvalidKeyBlob,
        }
    }
}

/// Read cursor over an immutable byte slice
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the input
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The unread tail of the input
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Borrow the next `len` bytes and advance past them
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ReadError> {
        if len > self.remaining() {
            return Err(ReadError::Truncated {
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.read_bytes(4)?);
        Ok(u32::from_le_bytes(raw))
    }

    pub fn read_u64(&mut self) -> Result<u64, ReadError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.read_bytes(8)?);
        Ok(u64::from_le_bytes(raw))
    }

    /// Borrow a `u32`-length-prefixed byte string
    ///
    /// On failure the cursor does not move, not even past the prefix.
    pub fn read_size_and_data(&mut self) -> Result<&'a [u8], ReadError> {
        let mut cursor = *self;
        let len = cursor.read_u32()?;
        let len = len as usize;
        let bytes = cursor.read_bytes(len)?;
        *self = cursor;
        Ok(bytes)
    }

    /// Copy exactly `len` raw bytes into a newly allocated secure buffer
    pub fn copy_from_buf(&mut self, len: usize) -> Result<SecureBytes, ReadError> {
        let mut cursor = *self;
        let bytes = cursor.read_bytes(len)?;
        let copy = SecureBytes::try_from_slice(bytes)
            .map_err(|_| ReadError::AllocationFailed(len))?;
        *self = cursor;
        Ok(copy)
    }

    /// Copy a `u32`-length-prefixed byte string into a newly allocated secure
    /// buffer. The decoded length is the length of the returned buffer.
    pub fn copy_size_and_data(&mut self) -> Result<SecureBytes, ReadError> {
        let mut cursor = *self;
        let bytes = cursor.read_size_and_data()?;
        let copy = SecureBytes::try_from_slice(bytes)
            .map_err(|_| ReadError::AllocationFailed(bytes.len()))?;
        *self = cursor;
        Ok(copy)
    }
}

/// Bounded writer over a caller-provided output slice
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes written so far
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> CryptoResult<()> {
        if data.len() > self.remaining() {
            return Err(CryptoError::InvalidParameter {
                parameter: "output buffer".to_string(),
                expected: format!("at least {} more bytes", data.len()),
                actual: format!("{} bytes", self.remaining()),
                error_code: ErrorCode::InsufficientBufferSpace,
            });
        }
        self.buf[self.pos..self.pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> CryptoResult<()> {
        self.write_bytes(&[value])
    }

    pub fn write_u32(&mut self, value: u32) -> CryptoResult<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> CryptoResult<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write `data` preceded by its length as a `u32`
    ///
    /// Nothing is written if the prefix and data together do not fit.
    pub fn append_size_and_data(&mut self, data: &[u8]) -> CryptoResult<()> {
        let len = u32::try_from(data.len()).map_err(|_| {
            CryptoError::invalid_parameter(
                "data",
                "at most u32::MAX bytes",
                &format!("{} bytes", data.len()),
            )
        })?;
        if LENGTH_PREFIX_SIZE + data.len() > self.remaining() {
            return Err(CryptoError::InvalidParameter {
                parameter: "output buffer".to_string(),
                expected: format!("at least {} more bytes", LENGTH_PREFIX_SIZE + data.len()),
                actual: format!("{} bytes", self.remaining()),
                error_code: ErrorCode::InsufficientBufferSpace,
            });
        }
        self.write_u32(len)?;
        self.write_bytes(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_prefix_is_little_endian() {
        let mut out = [0u8; 7];
        let mut writer = ByteWriter::new(&mut out);
        writer.append_size_and_data(&[0xA, 0xB, 0xC]).unwrap();
        assert_eq!(writer.position(), 7);
        assert_eq!(out, [3, 0, 0, 0, 0xA, 0xB, 0xC]);
    }

    #[test]
    fn test_writer_refuses_overrun() {
        let mut out = [0u8; 5];
        let mut writer = ByteWriter::new(&mut out);
        let result = writer.append_size_and_data(&[1, 2]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().error_code(),
            ErrorCode::InsufficientBufferSpace
        );
        // Nothing partial was written
        assert_eq!(writer.position(), 0);
        assert_eq!(out, [0u8; 5]);
    }

    #[test]
    fn test_copy_size_and_data() {
        let input = [2u8, 0, 0, 0, 0x11, 0x22, 0x33];
        let mut reader = ByteReader::new(&input);
        let data = reader.copy_size_and_data().unwrap();
        assert_eq!(data.as_bytes(), &[0x11, 0x22]);
        assert_eq!(reader.position(), 6);
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn test_failed_read_does_not_advance() {
        // Length says 9 but only 3 bytes follow
        let input = [9u8, 0, 0, 0, 1, 2, 3];
        let mut reader = ByteReader::new(&input);
        let err = reader.copy_size_and_data().unwrap_err();
        assert_eq!(
            err,
            ReadError::Truncated {
                needed: 9,
                available: 3
            }
        );
        assert_eq!(reader.position(), 0);

        let err = reader.copy_from_buf(8).unwrap_err();
        assert!(matches!(err, ReadError::Truncated { .. }));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_max_length_prefix_is_truncation() {
        let input = [0xFFu8, 0xFF, 0xFF, 0xFF, 1, 2];
        let mut reader = ByteReader::new(&input);
        let err = reader.read_size_and_data().unwrap_err();
        assert_eq!(
            err,
            ReadError::Truncated {
                needed: u32::MAX as usize,
                available: 2
            }
        );
        assert_eq!(ErrorCode::from(err), ErrorCode::InvalidKeyBlob);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_snapshot_by_copy() {
        let input = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut reader = ByteReader::new(&input);
        let snapshot = reader;
        reader.read_u32().unwrap();
        assert_eq!(reader.position(), 4);
        assert_eq!(snapshot.position(), 0);
        assert_eq!(snapshot.rest(), &input);
    }

    #[test]
    fn test_integer_round_trip() {
        let mut out = [0u8; 13];
        let mut writer = ByteWriter::new(&mut out);
        writer.write_u8(0x7F).unwrap();
        writer.write_u32(0xDEAD_BEEF).unwrap();
        writer.write_u64(0x0102_0304_0506_0708).unwrap();
        let mut reader = ByteReader::new(&out);
        assert_eq!(reader.read_u8().unwrap(), 0x7F);
        assert_eq!(reader.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_u64().unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_error_maps_to_error_code() {
        assert_eq!(
            ErrorCode::from(ReadError::AllocationFailed(12)),
            ErrorCode::MemoryAllocationFailed
        );
        assert_eq!(
            ErrorCode::from(ReadError::Malformed("x")),
            ErrorCode::InvalidKeyBlob
        );
    }
}
