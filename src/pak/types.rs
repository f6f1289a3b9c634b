//! LSPK on-disk structures: header and file-table entries.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::compression::{CompressionLevel, CompressionMethod};
use crate::error::{Error, Result};

/// Container magic at offset 0.
pub const PAK_MAGIC: [u8; 4] = *b"LSPK";

/// The one container version this codec speaks.
pub const PAK_VERSION: u32 = 18;

/// Size of one serialized file-table entry.
pub const FILE_ENTRY_SIZE: usize = 272;

/// Fixed name field width inside a file-table entry.
pub const FILE_NAME_SIZE: usize = 256;

/// Data alignment for solid archives.
pub const SOLID_ALIGNMENT: u64 = 64;

/// Archive-level flag bits.
pub mod pak_flags {
    pub const ALLOW_MEMORY_MAPPING: u8 = 0x02;
    pub const SOLID: u8 = 0x04;
    pub const PRELOAD: u8 = 0x08;
}

/// Fixed-size header following the magic and version words.
#[derive(Debug, Clone, Copy, Default)]
pub struct PakHeader {
    pub file_list_offset: u64,
    pub file_list_size: u32,
    pub flags: u8,
    pub priority: u8,
    pub md5: [u8; 16],
    pub num_parts: u16,
}

impl PakHeader {
    /// Serialized header size, magic and version words excluded.
    pub const SIZE: usize = 8 + 4 + 1 + 1 + 16 + 2;

    /// Offset of the first data byte in part 0 (magic + version + header).
    pub const DATA_START: u64 = 4 + 4 + Self::SIZE as u64;

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let file_list_offset = cursor.read_u64::<LittleEndian>()?;
        let file_list_size = cursor.read_u32::<LittleEndian>()?;
        let flags = cursor.read_u8()?;
        let priority = cursor.read_u8()?;
        let mut md5 = [0u8; 16];
        std::io::Read::read_exact(&mut cursor, &mut md5)?;
        let num_parts = cursor.read_u16::<LittleEndian>()?;
        Ok(Self {
            file_list_offset,
            file_list_size,
            flags,
            priority,
            md5,
            num_parts,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out: Vec<u8> = Vec::with_capacity(Self::SIZE);
        out.write_u64::<LittleEndian>(self.file_list_offset)?;
        out.write_u32::<LittleEndian>(self.file_list_size)?;
        out.write_u8(self.flags)?;
        out.write_u8(self.priority)?;
        out.extend_from_slice(&self.md5);
        out.write_u16::<LittleEndian>(self.num_parts)?;
        Ok(out)
    }

    #[must_use]
    pub fn is_solid(&self) -> bool {
        self.flags & pak_flags::SOLID != 0
    }
}

/// One entry of the decoded file table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Archive-relative path with forward slashes.
    pub name: String,
    /// Byte offset of the payload inside its archive part (48-bit).
    pub offset: u64,
    pub archive_part: u8,
    /// Per-file compression flags byte.
    pub flags: u8,
    pub size_on_disk: u32,
    pub uncompressed_size: u32,
}

impl FileEntry {
    #[must_use]
    pub fn method(&self) -> CompressionMethod {
        CompressionMethod::from_flags(self.flags)
    }

    #[must_use]
    pub fn level(&self) -> CompressionLevel {
        CompressionLevel::from_flags(self.flags)
    }

    /// Logical (extracted) size of the file.
    #[must_use]
    pub fn size(&self) -> u64 {
        if self.method() == CompressionMethod::None {
            u64::from(self.size_on_disk)
        } else {
            u64::from(self.uncompressed_size)
        }
    }

    pub fn parse(record: &[u8]) -> Result<Self> {
        if record.len() < FILE_ENTRY_SIZE {
            return Err(Error::UnexpectedEof {
                needed: FILE_ENTRY_SIZE,
                available: record.len(),
            });
        }
        let name_end = record[..FILE_NAME_SIZE]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FILE_NAME_SIZE);
        let name = String::from_utf8_lossy(&record[..name_end]).into_owned();

        let mut cursor = Cursor::new(&record[FILE_NAME_SIZE..]);
        let offset_lo = cursor.read_u32::<LittleEndian>()?;
        let offset_hi = cursor.read_u16::<LittleEndian>()?;
        let archive_part = cursor.read_u8()?;
        let flags = cursor.read_u8()?;
        let size_on_disk = cursor.read_u32::<LittleEndian>()?;
        let uncompressed_size = cursor.read_u32::<LittleEndian>()?;

        Ok(Self {
            name,
            offset: u64::from(offset_lo) | u64::from(offset_hi) << 32,
            archive_part,
            flags,
            size_on_disk,
            uncompressed_size,
        })
    }

    pub fn to_bytes(&self) -> Result<[u8; FILE_ENTRY_SIZE]> {
        let name = self.name.as_bytes();
        if name.len() >= FILE_NAME_SIZE {
            return Err(Error::InvalidPath(self.name.clone()));
        }
        if self.offset >> 48 != 0 {
            return Err(Error::FileTooLarge {
                name: self.name.clone(),
                size: self.offset,
            });
        }

        let mut record = [0u8; FILE_ENTRY_SIZE];
        record[..name.len()].copy_from_slice(name);
        let mut cursor = Cursor::new(&mut record[FILE_NAME_SIZE..]);
        cursor.write_u32::<LittleEndian>(self.offset as u32)?;
        cursor.write_u16::<LittleEndian>((self.offset >> 32) as u16)?;
        cursor.write_u8(self.archive_part)?;
        cursor.write_u8(self.flags)?;
        cursor.write_u32::<LittleEndian>(self.size_on_disk)?;
        cursor.write_u32::<LittleEndian>(self.uncompressed_size)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_record_round_trip() {
        let entry = FileEntry {
            name: "Mods/Gustav/meta.lsf".to_string(),
            offset: 0x0001_2345_6789,
            archive_part: 2,
            flags: 0x22,
            size_on_disk: 1024,
            uncompressed_size: 4096,
        };
        let record = entry.to_bytes().unwrap();
        assert_eq!(FileEntry::parse(&record).unwrap(), entry);
    }

    #[test]
    fn offset_is_limited_to_48_bits() {
        let entry = FileEntry {
            name: "big".to_string(),
            offset: 1 << 48,
            archive_part: 0,
            flags: 0,
            size_on_disk: 0,
            uncompressed_size: 0,
        };
        assert!(matches!(
            entry.to_bytes(),
            Err(Error::FileTooLarge { .. })
        ));
    }

    #[test]
    fn overlong_name_is_rejected() {
        let entry = FileEntry {
            name: "x".repeat(FILE_NAME_SIZE),
            offset: 0,
            archive_part: 0,
            flags: 0,
            size_on_disk: 0,
            uncompressed_size: 0,
        };
        assert!(matches!(entry.to_bytes(), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn stored_size_is_logical_when_uncompressed() {
        let entry = FileEntry {
            name: "raw.bin".to_string(),
            offset: 0,
            archive_part: 0,
            flags: 0x00,
            size_on_disk: 77,
            uncompressed_size: 0,
        };
        assert_eq!(entry.size(), 77);
    }
}
