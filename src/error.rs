//! Error types for `lskit`

use std::path::PathBuf;

use lz4_flex::frame::Error as Lz4FrameError;
use thiserror::Error;

/// The error type for `lskit` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO / Stream Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes were available than the read requested.
    #[error("unexpected end of stream: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        /// Bytes the caller asked for.
        needed: usize,
        /// Bytes remaining in the stream.
        available: usize,
    },

    /// A read was attempted on a write-only stream, or a write on a
    /// read-only stream.
    #[error("invalid stream operation: {0}")]
    InvalidStreamOperation(&'static str),

    /// The open mode string is not one of "rb", "wb", "ab".
    #[error("invalid open mode: {0:?} (supported: \"rb\", \"wb\", \"ab\")")]
    InvalidOpenMode(String),

    /// The stream is closed.
    #[error("stream is not open")]
    StreamNotOpen,

    // ==================== Compression Errors ====================
    /// LZ4 block decompression failed.
    #[error("LZ4 decompression failed: {message}")]
    Lz4DecompressionFailed {
        /// The error message.
        message: String,
    },

    /// LZ4 frame error.
    #[error("LZ4 frame error: {0}")]
    Lz4FrameError(#[from] Lz4FrameError),

    /// Zlib decompression failed.
    #[error("Zlib decompression failed: {message}")]
    ZlibDecompressionFailed {
        /// The error message.
        message: String,
    },

    /// Decompressed output length did not match the declared size.
    ///
    /// This is a hard archive-integrity failure; short or long output is
    /// never padded or truncated to fit.
    #[error("decompressed size mismatch: expected {expected} bytes, got {actual}")]
    DecompressedSizeMismatch {
        /// Size declared by the container metadata.
        expected: usize,
        /// Size the codec actually produced.
        actual: usize,
    },

    /// The compression method nibble is recognized but not implemented.
    #[error("unsupported compression method: {method}")]
    UnsupportedCompressionMethod {
        /// The compression method identifier.
        method: u8,
    },

    // ==================== LSF Format Errors ====================
    /// The file is not a valid LSF file (missing LSOF magic).
    #[error("invalid LSF magic: expected LSOF, found {0:?}")]
    InvalidLsfMagic([u8; 4]),

    /// The LSF version is outside the supported range.
    #[error("unsupported LSF version: {version} (supported: {min}-{max})")]
    UnsupportedLsfVersion {
        /// The version number found in the file.
        version: u32,
        /// Lowest supported version.
        min: u32,
        /// Highest supported version.
        max: u32,
    },

    /// A name index did not resolve in the string table.
    #[error("invalid string table index: bucket {bucket}, offset {offset}")]
    InvalidStringIndex {
        /// Bucket (upper 16 bits of the packed index).
        bucket: usize,
        /// Chain offset (lower 16 bits).
        offset: usize,
    },

    /// A node record referenced a parent outside the node table.
    #[error("invalid node index: {0}")]
    InvalidNodeIndex(i32),

    /// An attribute record referenced an attribute outside the table.
    #[error("invalid attribute index: {0}")]
    InvalidAttributeIndex(i32),

    /// An attribute carries a type id the codec cannot encode or decode.
    #[error("unsupported attribute type: {type_name} (id {type_id})")]
    UnsupportedAttributeType {
        /// Numeric type id from the wire.
        type_id: u32,
        /// Human-readable type name.
        type_name: &'static str,
    },

    /// A section had inconsistent sizes or trailing bytes.
    #[error("invalid LSF section: {0}")]
    InvalidLsfSection(String),

    // ==================== PAK Archive Errors ====================
    /// The file is not a valid PAK archive (missing LSPK magic).
    #[error("invalid PAK magic: expected LSPK")]
    InvalidPakMagic,

    /// The PAK header generation is not supported.
    #[error("unsupported PAK version: {0}")]
    UnsupportedPakVersion(String),

    /// The requested file was not found in the PAK archive.
    #[error("file not found in PAK: {0}")]
    FileNotFoundInPak(String),

    /// A multi-part archive part file does not exist on disk.
    #[error("archive part file not found: {path}")]
    ArchivePartMissing {
        /// The expected path to the archive part.
        path: PathBuf,
    },

    /// The decompressed file table was not a whole number of entries.
    #[error("PAK file table size {size} is not a multiple of the entry size")]
    InvalidPakFileTable {
        /// Size of the decompressed table in bytes.
        size: usize,
    },

    /// A file is too large for the 32-bit size fields of the entry record.
    #[error("file too large for archive: {name} ({size} bytes)")]
    FileTooLarge {
        /// Archive-virtual name of the file.
        name: String,
        /// Its size in bytes.
        size: u64,
    },

    /// An archive entry name is not unique within the package.
    #[error("duplicate file name in archive: {0}")]
    DuplicateFileName(String),

    /// PAK extraction completed but some files failed.
    #[error("extraction failed for {failed} of {total} files: {first_error}")]
    PakExtractionPartialFailure {
        /// Total number of files attempted.
        total: usize,
        /// Number of failed files.
        failed: usize,
        /// The first error message encountered.
        first_error: String,
    },

    // ==================== Operation Control ====================
    /// A long-running operation was cancelled through its progress listener.
    ///
    /// Partially-written output is left on disk; nothing is rolled back.
    #[error("operation cancelled")]
    Cancelled,

    // ==================== File System Errors ====================
    /// Invalid file path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

/// A specialized Result type for `lskit` operations.
pub type Result<T> = std::result::Result<T, Error>;
