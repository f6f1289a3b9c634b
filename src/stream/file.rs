//! Buffered file stream with explicit open modes

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read as _, Seek as _, SeekFrom, Write as _};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{Stream, STREAM_BUFFER_SIZE};

/// File open mode, restricted to the three modes the codecs use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// `"rb"` - read-only; writes are rejected.
    Read,
    /// `"wb"` - write-only, truncating; reads are rejected.
    Write,
    /// `"ab"` - write-only, appending; reads are rejected.
    Append,
}

impl OpenMode {
    /// Parse a mode string. Anything other than exactly `"rb"`, `"wb"` or
    /// `"ab"` fails with [`Error::InvalidOpenMode`].
    pub fn parse(mode: &str) -> Result<Self> {
        match mode {
            "rb" => Ok(OpenMode::Read),
            "wb" => Ok(OpenMode::Write),
            "ab" => Ok(OpenMode::Append),
            other => Err(Error::InvalidOpenMode(other.to_string())),
        }
    }
}

#[derive(Debug)]
enum Handle {
    Read(BufReader<File>),
    Write(BufWriter<File>),
}

/// A buffered stream over a file handle.
///
/// Buffering is transparent: reads and writes larger than the internal
/// buffer complete in a single logical call.
#[derive(Debug)]
pub struct FileStream {
    path: PathBuf,
    mode: OpenMode,
    handle: Option<Handle>,
}

impl FileStream {
    /// Open `path` with a `"rb"`/`"wb"`/`"ab"` mode string.
    pub fn open<P: AsRef<Path>>(path: P, mode: &str) -> Result<Self> {
        let mut stream = Self {
            path: path.as_ref().to_path_buf(),
            mode: OpenMode::parse(mode)?,
            handle: None,
        };
        stream.reopen()?;
        Ok(stream)
    }

    /// Re-open the same path, discarding any previous position and, in
    /// write mode, truncating again. Idempotent reuse of the handle object.
    pub fn reopen(&mut self) -> Result<()> {
        self.handle = None;
        let handle = match self.mode {
            OpenMode::Read => {
                let file = File::open(&self.path)?;
                Handle::Read(BufReader::with_capacity(STREAM_BUFFER_SIZE, file))
            }
            OpenMode::Write => {
                let file = OpenOptions::new()
                    .create(true)
                    .truncate(true)
                    .write(true)
                    .open(&self.path)?;
                Handle::Write(BufWriter::with_capacity(STREAM_BUFFER_SIZE, file))
            }
            OpenMode::Append => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?;
                Handle::Write(BufWriter::with_capacity(STREAM_BUFFER_SIZE, file))
            }
        };
        self.handle = Some(handle);
        Ok(())
    }

    /// Flush (in write modes) and drop the handle. A closed stream can be
    /// re-opened with [`FileStream::reopen`] and behaves like a fresh one.
    pub fn close(&mut self) -> Result<()> {
        if let Some(Handle::Write(w)) = self.handle.as_mut() {
            w.flush()?;
        }
        self.handle = None;
        Ok(())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    #[must_use]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn handle_mut(&mut self) -> Result<&mut Handle> {
        self.handle.as_mut().ok_or(Error::StreamNotOpen)
    }
}

impl Stream for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.handle_mut()? {
            Handle::Read(r) => {
                // Loop so one logical read crosses buffer boundaries whole.
                let mut total = 0;
                while total < buf.len() {
                    let n = r.read(&mut buf[total..])?;
                    if n == 0 {
                        break;
                    }
                    total += n;
                }
                Ok(total)
            }
            Handle::Write(_) => Err(Error::InvalidStreamOperation(
                "read from write-only stream",
            )),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        match self.handle_mut()? {
            Handle::Write(w) => {
                w.write_all(buf)?;
                Ok(buf.len())
            }
            Handle::Read(_) => Err(Error::InvalidStreamOperation(
                "write to read-only stream",
            )),
        }
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        match self.handle_mut()? {
            Handle::Read(r) => Ok(r.seek(pos)?),
            Handle::Write(w) => Ok(w.seek(pos)?),
        }
    }

    fn tell(&mut self) -> Result<u64> {
        match self.handle_mut()? {
            Handle::Read(r) => Ok(r.stream_position()?),
            Handle::Write(w) => Ok(w.stream_position()?),
        }
    }

    fn size(&mut self) -> Result<u64> {
        if let Some(Handle::Write(w)) = self.handle.as_mut() {
            w.flush()?;
        }
        Ok(std::fs::metadata(&self.path)?.len())
    }
}

impl Drop for FileStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn to_io(err: Error) -> std::io::Error {
    match err {
        Error::Io(e) => e,
        Error::InvalidStreamOperation(msg) => {
            std::io::Error::new(std::io::ErrorKind::Unsupported, msg)
        }
        other => std::io::Error::other(other.to_string()),
    }
}

// std::io interop so FileStream plugs into the PAK reader/writer generics.

impl std::io::Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        Stream::read(self, buf).map_err(to_io)
    }
}

impl std::io::Write for FileStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Stream::write(self, buf).map_err(to_io)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.handle.as_mut() {
            Some(Handle::Write(w)) => w.flush(),
            _ => Ok(()),
        }
    }
}

impl std::io::Seek for FileStream {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        Stream::seek(self, pos).map_err(to_io)
    }
}
