//! In-memory byte stream

use std::io::SeekFrom;

use crate::error::{Error, Result};

use super::Stream;

/// A stream over a contiguous in-memory buffer.
///
/// Writable streams grow on writes past the end; read-only streams reject
/// `write` with [`Error::InvalidStreamOperation`].
#[derive(Debug, Clone)]
pub struct MemoryStream {
    buf: Vec<u8>,
    pos: usize,
    writable: bool,
}

impl MemoryStream {
    /// Create an empty writable stream.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
            writable: true,
        }
    }

    /// Wrap an owned buffer as a read-only stream positioned at 0.
    #[must_use]
    pub fn read_only(buf: Vec<u8>) -> Self {
        Self {
            buf,
            pos: 0,
            writable: false,
        }
    }

    /// Copy a byte slice into a read-only stream.
    #[must_use]
    pub fn from_slice(data: &[u8]) -> Self {
        Self::read_only(data.to_vec())
    }

    /// The underlying bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the stream and return its buffer.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn seek_to(&mut self, target: i64) -> Result<u64> {
        if target < 0 {
            return Err(Error::InvalidStreamOperation("seek before stream start"));
        }
        self.pos = target as usize;
        Ok(self.pos as u64)
    }
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Stream for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        // The position may sit past the end after a seek; such reads
        // return zero bytes rather than slicing out of range.
        let start = self.pos.min(self.buf.len());
        let n = (self.buf.len() - start).min(buf.len());
        buf[..n].copy_from_slice(&self.buf[start..start + n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if !self.writable {
            return Err(Error::InvalidStreamOperation(
                "write to read-only memory stream",
            ));
        }
        let end = self.pos + buf.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        Ok(buf.len())
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        match pos {
            SeekFrom::Start(off) => self.seek_to(off as i64),
            SeekFrom::Current(delta) => self.seek_to(self.pos as i64 + delta),
            SeekFrom::End(delta) => self.seek_to(self.buf.len() as i64 + delta),
        }
    }

    fn tell(&mut self) -> Result<u64> {
        Ok(self.pos as u64)
    }

    fn size(&mut self) -> Result<u64> {
        Ok(self.buf.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_rejects_write() {
        let mut s = MemoryStream::from_slice(b"abc");
        assert!(matches!(
            s.write(b"x"),
            Err(Error::InvalidStreamOperation(_))
        ));
    }

    #[test]
    fn short_read_is_truncation_error() {
        let mut s = MemoryStream::from_slice(&[1, 2, 3]);
        let err = s.read_bytes(8).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedEof {
                needed: 8,
                available: 3
            }
        ));
    }

    #[test]
    fn read_past_end_returns_nothing() {
        let mut s = MemoryStream::from_slice(b"abc");
        s.seek(SeekFrom::Start(10)).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(s.read(&mut buf).unwrap(), 0);
        assert!(matches!(
            s.read_bytes(1),
            Err(Error::UnexpectedEof {
                needed: 1,
                available: 0
            })
        ));
    }

    #[test]
    fn typed_reads_are_little_endian() {
        let mut s = MemoryStream::from_slice(&[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(s.read_u32().unwrap(), 0x12345678);
        assert_eq!(s.tell().unwrap(), 4);
    }
}
