//! LSPK v18 archive writer.
//!
//! Packs a directory tree into a single-part archive: payloads first,
//! then the LZ4-packed file table, then the header rewritten in place
//! with the final table offset and, when requested, the content digest.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::compression::{
    compress, pack_compression_flags, CompressionLevel, CompressionMethod,
};
use crate::error::{Error, Result};
use crate::progress::{check_cancelled, ProgressListener};
use crate::stream::{FileStream, SeekFrom, Stream};
use crate::utils::BTree;

use super::types::{
    pak_flags, FileEntry, PakHeader, PAK_MAGIC, PAK_VERSION, SOLID_ALIGNMENT,
};

/// Encoding knobs for [`create_from_directory`].
#[derive(Debug, Clone, Copy)]
pub struct PakWriteOptions {
    pub compression: CompressionMethod,
    pub level: CompressionLevel,
    pub priority: u8,
    /// Archive flag bits ([`pak_flags`]).
    pub flags: u8,
    /// Record an MD5 over all file contents, in pack order, in the header.
    /// Off by default; the digest field is zeroed when not requested.
    pub hash_contents: bool,
}

impl Default for PakWriteOptions {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Lz4,
            level: CompressionLevel::Default,
            priority: 0,
            flags: 0,
            hash_contents: false,
        }
    }
}

/// Pack the contents of `src` into a new archive at `dest`.
///
/// Entry names are the paths relative to `src` with forward slashes,
/// packed in sorted name order so identical inputs produce identical
/// archives.
pub fn create_from_directory(
    src: &Path,
    dest: &Path,
    options: &PakWriteOptions,
    listener: &dyn ProgressListener,
) -> Result<()> {
    let names = collect_names(src)?;
    let sorted = names.in_order();
    let total = sorted.len();
    listener.on_start(total);

    let mut out = FileStream::open(dest, "wb")?;
    out.write(&PAK_MAGIC)?;
    out.write_u32(PAK_VERSION)?;
    out.write(&[0u8; PakHeader::SIZE])?;

    let solid = options.flags & pak_flags::SOLID != 0;
    let mut digest = options.hash_contents.then(md5::Context::new);
    let mut entries = Vec::with_capacity(total);
    for (i, (name, source)) in sorted.iter().enumerate() {
        check_cancelled(listener)?;

        let data = std::fs::read(source)?;
        if data.len() as u64 > u64::from(u32::MAX) {
            return Err(Error::FileTooLarge {
                name: (*name).clone(),
                size: data.len() as u64,
            });
        }
        if let Some(digest) = digest.as_mut() {
            digest.consume(&data);
        }

        let (payload, flags) = pack_payload(&data, options)?;
        if solid {
            pad_to_alignment(&mut out, SOLID_ALIGNMENT)?;
        }
        let offset = out.tell()?;
        out.write(&payload)?;
        entries.push(FileEntry {
            name: (*name).clone(),
            offset,
            archive_part: 0,
            flags,
            size_on_disk: payload.len() as u32,
            uncompressed_size: data.len() as u32,
        });
        listener.on_file(name, i, total);
    }

    let file_list_offset = out.tell()?;
    let file_list_size = write_file_table(&mut out, &entries)?;

    let header = PakHeader {
        file_list_offset,
        file_list_size,
        flags: options.flags,
        priority: options.priority,
        md5: digest.map_or([0u8; 16], |d| d.compute().0),
        num_parts: 1,
    };
    out.seek(SeekFrom::Start(8))?;
    out.write(&header.to_bytes()?)?;
    out.close()?;

    debug!(files = total, archive = %dest.display(), "packed archive");
    listener.on_finished();
    Ok(())
}

/// Walk `src` and collect archive name → source path into sorted order.
/// Symlinks and OS metadata droppings are skipped.
fn collect_names(src: &Path) -> Result<BTree<String, PathBuf>> {
    if !src.is_dir() {
        return Err(Error::InvalidPath(src.display().to_string()));
    }
    let mut names = BTree::new();
    for dirent in WalkDir::new(src).follow_links(false) {
        let dirent = dirent?;
        if !dirent.file_type().is_file() || dirent.file_name() == ".DS_Store" {
            continue;
        }
        let rel = dirent
            .path()
            .strip_prefix(src)
            .map_err(|_| Error::InvalidPath(dirent.path().display().to_string()))?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if names.insert(name.clone(), dirent.into_path()).is_some() {
            return Err(Error::DuplicateFileName(name));
        }
    }
    Ok(names)
}

/// Compress one payload, falling back to raw storage when compression
/// does not shrink it.
fn pack_payload(data: &[u8], options: &PakWriteOptions) -> Result<(Vec<u8>, u8)> {
    if options.compression == CompressionMethod::None || data.is_empty() {
        return Ok((data.to_vec(), 0x00));
    }
    let packed = compress(data, options.compression, options.level, false)?;
    if packed.len() >= data.len() {
        return Ok((data.to_vec(), 0x00));
    }
    Ok((
        packed,
        pack_compression_flags(options.compression, options.level),
    ))
}

fn pad_to_alignment(out: &mut FileStream, alignment: u64) -> Result<()> {
    let pos = out.tell()?;
    let rem = pos % alignment;
    if rem != 0 {
        out.write(&vec![0u8; (alignment - rem) as usize])?;
    }
    Ok(())
}

/// Serialize and LZ4-pack the file table, returning its on-disk size
/// (count word included).
fn write_file_table(out: &mut FileStream, entries: &[FileEntry]) -> Result<u32> {
    use byteorder::{LittleEndian, WriteBytesExt};

    let mut table: Vec<u8> = Vec::with_capacity(entries.len() * super::types::FILE_ENTRY_SIZE);
    for entry in entries {
        table.extend_from_slice(&entry.to_bytes()?);
    }
    let packed = compress(
        &table,
        CompressionMethod::Lz4,
        CompressionLevel::Default,
        false,
    )?;

    let mut list: Vec<u8> = Vec::with_capacity(4 + packed.len());
    list.write_u32::<LittleEndian>(entries.len() as u32)?;
    list.extend_from_slice(&packed);
    out.write(&list)?;
    Ok(list.len() as u32)
}
