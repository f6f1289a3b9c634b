//! Compression codecs shared by the LSF and PAK containers.
//!
//! Three codecs are carried: LZ4 block (output size known from container
//! metadata), LZ4 frame (chunked/streaming, selected explicitly by the
//! caller, never auto-detected) and zlib. Decompression enforces the
//! declared output size strictly; a short or long result is an archive
//! integrity failure, not something to be fixed up.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// Compression method nibble as stored in container flags bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    #[default]
    None,
    Zlib,
    Lz4,
    /// Recognized in the flags nibble but not implemented by this codec
    /// layer.
    Lzstd,
}

impl CompressionMethod {
    /// Extract the method from the low nibble of a flags byte.
    #[must_use]
    pub fn from_flags(flags: u8) -> Self {
        match flags & 0x0F {
            1 => CompressionMethod::Zlib,
            2 => CompressionMethod::Lz4,
            3 => CompressionMethod::Lzstd,
            _ => CompressionMethod::None,
        }
    }

    #[must_use]
    pub fn to_nibble(self) -> u8 {
        match self {
            CompressionMethod::None => 0,
            CompressionMethod::Zlib => 1,
            CompressionMethod::Lz4 => 2,
            CompressionMethod::Lzstd => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionMethod::None => "none",
            CompressionMethod::Zlib => "zlib",
            CompressionMethod::Lz4 => "lz4",
            CompressionMethod::Lzstd => "lzstd",
        }
    }
}

/// Abstract compression level, mapped to codec-specific constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    Fast,
    #[default]
    Default,
    Max,
}

impl CompressionLevel {
    /// Extract the level hint from bits 4-6 of a flags byte.
    #[must_use]
    pub fn from_flags(flags: u8) -> Self {
        if flags & 0x10 != 0 {
            CompressionLevel::Fast
        } else if flags & 0x40 != 0 {
            CompressionLevel::Max
        } else {
            CompressionLevel::Default
        }
    }

    #[must_use]
    pub fn to_bits(self) -> u8 {
        match self {
            CompressionLevel::Fast => 0x10,
            CompressionLevel::Default => 0x20,
            CompressionLevel::Max => 0x40,
        }
    }

    fn zlib(self) -> Compression {
        match self {
            CompressionLevel::Fast => Compression::fast(),
            CompressionLevel::Default => Compression::default(),
            CompressionLevel::Max => Compression::best(),
        }
    }
}

/// Pack method and level into the single on-disk flags byte.
///
/// Method `None` always packs to `0x00` regardless of level.
#[must_use]
pub fn pack_compression_flags(method: CompressionMethod, level: CompressionLevel) -> u8 {
    if method == CompressionMethod::None {
        return 0x00;
    }
    method.to_nibble() | level.to_bits()
}

/// Compress `data` with the given method.
///
/// `chunked` selects LZ4 frame framing instead of a raw block; it has no
/// effect on the other methods.
pub fn compress(
    data: &[u8],
    method: CompressionMethod,
    level: CompressionLevel,
    chunked: bool,
) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::None => Ok(data.to_vec()),
        CompressionMethod::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), level.zlib());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        CompressionMethod::Lz4 => {
            if chunked {
                let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            } else {
                Ok(lz4_flex::block::compress(data))
            }
        }
        CompressionMethod::Lzstd => Err(Error::UnsupportedCompressionMethod {
            method: method.to_nibble(),
        }),
    }
}

/// Decompress `data` to exactly `uncompressed_size` bytes.
///
/// The caller supplies the framing choice for LZ4 (`chunked` = frame mode);
/// it is never auto-detected from the payload.
pub fn decompress(
    data: &[u8],
    uncompressed_size: usize,
    method: CompressionMethod,
    chunked: bool,
) -> Result<Vec<u8>> {
    let out = match method {
        CompressionMethod::None => data.to_vec(),
        CompressionMethod::Zlib => {
            let mut decoder = ZlibDecoder::new(data);
            let mut out = Vec::with_capacity(uncompressed_size);
            decoder
                .read_to_end(&mut out)
                .map_err(|e| Error::ZlibDecompressionFailed {
                    message: e.to_string(),
                })?;
            out
        }
        CompressionMethod::Lz4 => {
            if chunked {
                let mut decoder = lz4_flex::frame::FrameDecoder::new(data);
                let mut out = Vec::with_capacity(uncompressed_size);
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| Error::Lz4DecompressionFailed {
                        message: e.to_string(),
                    })?;
                out
            } else {
                lz4_flex::block::decompress(data, uncompressed_size).map_err(|e| {
                    Error::Lz4DecompressionFailed {
                        message: e.to_string(),
                    }
                })?
            }
        }
        CompressionMethod::Lzstd => {
            return Err(Error::UnsupportedCompressionMethod {
                method: method.to_nibble(),
            })
        }
    };

    if out.len() != uncompressed_size {
        return Err(Error::DecompressedSizeMismatch {
            expected: uncompressed_size,
            actual: out.len(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_pack_and_unpack() {
        let flags = pack_compression_flags(CompressionMethod::Lz4, CompressionLevel::Max);
        assert_eq!(flags, 0x42);
        assert_eq!(CompressionMethod::from_flags(flags), CompressionMethod::Lz4);
        assert_eq!(CompressionLevel::from_flags(flags), CompressionLevel::Max);

        // None erases the level hint entirely.
        assert_eq!(
            pack_compression_flags(CompressionMethod::None, CompressionLevel::Max),
            0x00
        );
    }

    #[test]
    fn lz4_block_round_trip() {
        let data = b"hello hello hello hello hello".repeat(20);
        let packed = compress(&data, CompressionMethod::Lz4, CompressionLevel::Default, false)
            .unwrap();
        let out = decompress(&packed, data.len(), CompressionMethod::Lz4, false).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn lz4_frame_round_trip() {
        let data = vec![7u8; 100_000];
        let packed =
            compress(&data, CompressionMethod::Lz4, CompressionLevel::Default, true).unwrap();
        let out = decompress(&packed, data.len(), CompressionMethod::Lz4, true).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn zlib_round_trip() {
        let data = b"zlib payload".repeat(100);
        let packed =
            compress(&data, CompressionMethod::Zlib, CompressionLevel::Fast, false).unwrap();
        let out = decompress(&packed, data.len(), CompressionMethod::Zlib, false).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn wrong_declared_size_is_rejected() {
        let data = b"strict length".repeat(50);
        let packed =
            compress(&data, CompressionMethod::Zlib, CompressionLevel::Default, false).unwrap();
        let err = decompress(&packed, data.len() + 1, CompressionMethod::Zlib, false).unwrap_err();
        assert!(matches!(err, Error::DecompressedSizeMismatch { .. }));
    }
}
