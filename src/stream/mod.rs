//! Byte stream abstraction shared by the LSF and PAK codecs.
//!
//! [`Stream`] is the seam the tool layers drive the codec through: positioned
//! reads and writes plus typed little-endian accessors. [`MemoryStream`] owns
//! a contiguous buffer; [`FileStream`] owns a buffered file handle opened in
//! one of the classic `"rb"`/`"wb"`/`"ab"` modes.

mod file;
mod memory;

pub use file::{FileStream, OpenMode};
pub use memory::MemoryStream;

pub use std::io::SeekFrom;

use crate::error::{Error, Result};

/// Default internal buffer size for file streams.
pub const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// Positioned byte stream with typed little-endian accessors.
///
/// `read` and `write` move as many bytes as possible and only return short
/// counts at end-of-stream; a single logical call spanning an internal
/// buffering boundary still transfers the full requested count.
pub trait Stream {
    /// Read up to `buf.len()` bytes, returning the count actually read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `buf`, returning the count written.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Reposition the stream.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64>;

    /// Current position from the start of the stream.
    fn tell(&mut self) -> Result<u64>;

    /// Total stream length in bytes.
    fn size(&mut self) -> Result<u64>;

    /// Fill `buf` exactly, failing with [`Error::UnexpectedEof`] on a short
    /// read.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let got = self.read(buf)?;
        if got != buf.len() {
            return Err(Error::UnexpectedEof {
                needed: buf.len(),
                available: got,
            });
        }
        Ok(())
    }

    /// Read exactly `n` bytes into an owned buffer.
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read exactly `n` bytes and wrap them in a bounded sub-stream.
    fn read_stream(&mut self, n: usize) -> Result<MemoryStream> {
        Ok(MemoryStream::read_only(self.read_bytes(n)?))
    }

    fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b)?;
        Ok(b[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let mut b = [0u8; 2];
        self.read_exact(&mut b)?;
        Ok(u16::from_le_bytes(b))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b)?;
        Ok(u32::from_le_bytes(b))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let mut b = [0u8; 8];
        self.read_exact(&mut b)?;
        Ok(u64::from_le_bytes(b))
    }

    fn read_i32(&mut self) -> Result<i32> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b)?;
        Ok(i32::from_le_bytes(b))
    }

    fn read_i64(&mut self) -> Result<i64> {
        let mut b = [0u8; 8];
        self.read_exact(&mut b)?;
        Ok(i64::from_le_bytes(b))
    }

    fn read_f32(&mut self) -> Result<f32> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b)?;
        Ok(f32::from_le_bytes(b))
    }

    fn read_f64(&mut self) -> Result<f64> {
        let mut b = [0u8; 8];
        self.read_exact(&mut b)?;
        Ok(f64::from_le_bytes(b))
    }

    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write(&[v]).map(|_| ())
    }

    fn write_u16(&mut self, v: u16) -> Result<()> {
        self.write(&v.to_le_bytes()).map(|_| ())
    }

    fn write_u32(&mut self, v: u32) -> Result<()> {
        self.write(&v.to_le_bytes()).map(|_| ())
    }

    fn write_u64(&mut self, v: u64) -> Result<()> {
        self.write(&v.to_le_bytes()).map(|_| ())
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.write(&v.to_le_bytes()).map(|_| ())
    }
}
