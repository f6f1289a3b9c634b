//! Hashed static string table backing the LSF names section.
//!
//! Strings are deduplicated into 512 hash buckets. A name is referenced
//! from node and attribute records as a packed `u32`: bucket index in the
//! high 16 bits, offset within the bucket chain in the low 16. Offset
//! `0xFFFF` is the reserved "no name" sentinel.

use std::collections::HashMap;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::formats::common::fnv1a;

/// Number of hash buckets in the table.
pub const STRING_HASH_BUCKETS: usize = 0x200;

/// Packed name index meaning "no name".
pub const NO_NAME: u16 = 0xFFFF;

/// Fold a 32-bit hash down to a bucket index by XORing its 9-bit slices.
#[must_use]
fn bucket_for(hash: u32) -> usize {
    ((hash & 0x1FF) ^ ((hash >> 9) & 0x1FF) ^ ((hash >> 18) & 0x1FF) ^ ((hash >> 27) & 0x1FF))
        as usize
}

/// Deduplicating string table built while encoding a document.
#[derive(Debug, Clone)]
pub struct StaticStringTable {
    buckets: Vec<Vec<String>>,
    index: HashMap<String, u32>,
}

impl Default for StaticStringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticStringTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); STRING_HASH_BUCKETS],
            index: HashMap::new(),
        }
    }

    /// Intern a string and return its packed index. Re-adding an existing
    /// string returns the index assigned the first time.
    pub fn add(&mut self, s: &str) -> u32 {
        if let Some(&packed) = self.index.get(s) {
            return packed;
        }
        let bucket = bucket_for(fnv1a(s.as_bytes()));
        let offset = self.buckets[bucket].len();
        self.buckets[bucket].push(s.to_owned());
        let packed = ((bucket as u32) << 16) | offset as u32;
        self.index.insert(s.to_owned(), packed);
        packed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Serialize into the on-disk chain layout: bucket count, then per
    /// bucket a `u16` chain length followed by length-prefixed UTF-8.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        out.write_u32::<LittleEndian>(self.buckets.len() as u32)?;
        for chain in &self.buckets {
            out.write_u16::<LittleEndian>(chain.len() as u16)?;
            for s in chain {
                out.write_u16::<LittleEndian>(s.len() as u16)?;
                out.extend_from_slice(s.as_bytes());
            }
        }
        Ok(out)
    }
}

/// Read-side view of a decoded names section.
#[derive(Debug, Clone, Default)]
pub struct StringChains {
    chains: Vec<Vec<String>>,
}

impl StringChains {
    /// Parse the on-disk chain layout.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let bucket_count = cursor.read_u32::<LittleEndian>()? as usize;
        let mut chains = Vec::with_capacity(bucket_count);
        for _ in 0..bucket_count {
            let chain_len = cursor.read_u16::<LittleEndian>()? as usize;
            let mut chain = Vec::with_capacity(chain_len);
            for _ in 0..chain_len {
                let len = cursor.read_u16::<LittleEndian>()? as usize;
                let pos = cursor.position() as usize;
                let bytes = data.get(pos..pos + len).ok_or(Error::UnexpectedEof {
                    needed: len,
                    available: data.len().saturating_sub(pos),
                })?;
                chain.push(String::from_utf8_lossy(bytes).into_owned());
                cursor.set_position((pos + len) as u64);
            }
            chains.push(chain);
        }
        Ok(Self { chains })
    }

    /// Resolve a packed name index. The `0xFFFF` offset sentinel resolves
    /// to the empty string.
    pub fn resolve(&self, packed: u32) -> Result<&str> {
        let bucket = (packed >> 16) as usize;
        let offset = (packed & 0xFFFF) as usize;
        if offset == NO_NAME as usize {
            return Ok("");
        }
        self.chains
            .get(bucket)
            .and_then(|chain| chain.get(offset))
            .map(String::as_str)
            .ok_or(Error::InvalidStringIndex { bucket, offset })
    }
}
