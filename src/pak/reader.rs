//! LSPK v18 archive reader.
//!
//! Opens the container, inflates the LZ4-packed file table and serves
//! per-file reads and parallel extraction. Payloads may live in sibling
//! part files (`name_1.pak`, `name_2.pak`, ...) referenced by each entry's
//! part index.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::compression::{decompress, CompressionMethod};
use crate::error::{Error, Result};
use crate::progress::ProgressListener;
use crate::stream::{FileStream, SeekFrom, Stream};

use super::types::{FileEntry, PakHeader, FILE_ENTRY_SIZE, PAK_MAGIC, PAK_VERSION};

/// An opened archive with its decoded file table.
pub struct PakReader {
    path: PathBuf,
    header: PakHeader,
    entries: Vec<FileEntry>,
    index: HashMap<String, usize>,
}

impl PakReader {
    /// Open an archive and decode its file table.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut stream = FileStream::open(&path, "rb")?;

        let magic = stream.read_bytes(4)?;
        if magic != PAK_MAGIC {
            return Err(classify_bad_magic(&mut stream));
        }
        let version = stream.read_u32()?;
        if version != PAK_VERSION {
            return Err(Error::UnsupportedPakVersion(format!("version {version}")));
        }
        let header = PakHeader::parse(&stream.read_bytes(PakHeader::SIZE)?)?;

        let list_size = header.file_list_size as usize;
        if list_size < 4 {
            return Err(Error::InvalidPakFileTable { size: list_size });
        }
        stream.seek(SeekFrom::Start(header.file_list_offset))?;
        let num_files = stream.read_u32()? as usize;
        let packed = stream.read_bytes(list_size - 4)?;
        let table_size = num_files
            .checked_mul(FILE_ENTRY_SIZE)
            .ok_or(Error::InvalidPakFileTable { size: list_size })?;
        let table = decompress(&packed, table_size, CompressionMethod::Lz4, false)?;

        let mut entries = Vec::with_capacity(num_files);
        let mut index = HashMap::with_capacity(num_files);
        for record in table.chunks_exact(FILE_ENTRY_SIZE) {
            let entry = FileEntry::parse(record)?;
            if index.insert(entry.name.clone(), entries.len()).is_some() {
                return Err(Error::DuplicateFileName(entry.name));
            }
            entries.push(entry);
        }

        debug!(
            files = entries.len(),
            parts = header.num_parts,
            "opened archive"
        );
        Ok(Self {
            path,
            header,
            entries,
            index,
        })
    }

    #[must_use]
    pub fn header(&self) -> &PakHeader {
        &self.header
    }

    #[must_use]
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&FileEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Read and decompress one file by its archive name.
    pub fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .entry(name)
            .ok_or_else(|| Error::FileNotFoundInPak(name.to_string()))?;
        self.read_entry(entry)
    }

    /// Read and decompress one file-table entry.
    pub fn read_entry(&self, entry: &FileEntry) -> Result<Vec<u8>> {
        let part = self.part_path(entry.archive_part)?;
        let mut stream = FileStream::open(&part, "rb")?;
        stream.seek(SeekFrom::Start(entry.offset))?;
        let raw = stream.read_bytes(entry.size_on_disk as usize)?;
        match entry.method() {
            CompressionMethod::None => Ok(raw),
            method => decompress(&raw, entry.uncompressed_size as usize, method, false),
        }
    }

    /// Extract one file to an explicit destination path.
    pub fn extract_file(&self, name: &str, target: &Path) -> Result<()> {
        let data = self.read_file(name)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, data)?;
        Ok(())
    }

    /// Extract every entry under `dest`, recreating the archive-relative
    /// directory layout. Entries are processed in parallel; failures are
    /// collected instead of aborting the rest.
    pub fn extract_all(&self, dest: &Path, listener: &dyn ProgressListener) -> Result<()> {
        let total = self.entries.len();
        listener.on_start(total);

        let cancelled = AtomicBool::new(false);
        let done = AtomicUsize::new(0);
        let failures: Vec<(String, String)> = self
            .entries
            .par_iter()
            .filter_map(|entry| {
                if cancelled.load(Ordering::Relaxed) {
                    return None;
                }
                if listener.is_cancelled() {
                    cancelled.store(true, Ordering::Relaxed);
                    return None;
                }
                listener.on_file(&entry.name, done.fetch_add(1, Ordering::Relaxed), total);
                match self.extract_entry(entry, dest) {
                    Ok(()) => None,
                    Err(e) => Some((entry.name.clone(), e.to_string())),
                }
            })
            .collect();

        if cancelled.load(Ordering::Relaxed) {
            listener.on_cancel();
            return Err(Error::Cancelled);
        }
        if !failures.is_empty() {
            warn!(failed = failures.len(), total, "extraction left failures");
            return Err(Error::PakExtractionPartialFailure {
                total,
                failed: failures.len(),
                first_error: failures[0].1.clone(),
            });
        }
        listener.on_finished();
        Ok(())
    }

    fn extract_entry(&self, entry: &FileEntry, dest: &Path) -> Result<()> {
        let rel = sanitize_entry_path(&entry.name)?;
        self.extract_file(&entry.name, &dest.join(rel))
    }

    /// Resolve the on-disk path of an archive part. Part 0 is the archive
    /// itself; part `k` is `stem_k.ext` next to it.
    fn part_path(&self, part: u8) -> Result<PathBuf> {
        if part == 0 {
            return Ok(self.path.clone());
        }
        let stem = self
            .path
            .file_stem()
            .and_then(OsStr::to_str)
            .ok_or_else(|| Error::InvalidPath(self.path.display().to_string()))?;
        let ext = self
            .path
            .extension()
            .and_then(OsStr::to_str)
            .unwrap_or("pak");
        let candidate = self.path.with_file_name(format!("{stem}_{part}.{ext}"));
        if !candidate.is_file() {
            return Err(Error::ArchivePartMissing { path: candidate });
        }
        Ok(candidate)
    }
}

/// Entry names are archive-relative; absolute paths and parent traversal
/// never leave the extraction root.
fn sanitize_entry_path(name: &str) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in name.split(['/', '\\']) {
        if component.is_empty() || component == "." {
            continue;
        }
        if component == ".." {
            return Err(Error::InvalidPath(name.to_string()));
        }
        out.push(component);
    }
    if out.as_os_str().is_empty() {
        return Err(Error::InvalidPath(name.to_string()));
    }
    Ok(out)
}

/// A file without the leading magic may still be a legacy archive, which
/// keeps its header (and a second magic) at the end of the file.
fn classify_bad_magic(stream: &mut FileStream) -> Error {
    let looks_legacy = (|| -> Result<bool> {
        if stream.size()? < 8 {
            return Ok(false);
        }
        stream.seek(SeekFrom::End(-8))?;
        let _header_size = stream.read_u32()?;
        Ok(stream.read_bytes(4)? == PAK_MAGIC)
    })();
    match looks_legacy {
        Ok(true) => {
            Error::UnsupportedPakVersion("legacy archive with trailing header".to_string())
        }
        _ => Error::InvalidPakMagic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_components_are_rejected() {
        assert!(sanitize_entry_path("Mods/../../etc/passwd").is_err());
        assert!(sanitize_entry_path("").is_err());
        assert_eq!(
            sanitize_entry_path("Mods\\Gustav/meta.lsf").unwrap(),
            PathBuf::from("Mods/Gustav/meta.lsf")
        );
    }
}
