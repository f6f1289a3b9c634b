//! LSF binary reader.
//!
//! Parses the header, inflates the five sections (strings, keys, nodes,
//! attributes, values) and materializes the node graph into a [`Resource`]
//! arena. Node records appear in document order, so parents always precede
//! their children and sibling order is the record order.

use std::io::Cursor;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::debug;

use crate::compression::{decompress, CompressionMethod};
use crate::error::{Error, Result};
use crate::formats::common::{decode_value, AttributeType, PackedVersion};

use super::resource::{MetadataFormat, NodeId, Resource};
use super::string_table::StringChains;
use super::{LSF_MAGIC, LSF_VERSION_MAX, LSF_VERSION_MIN};

#[derive(Debug, Clone, Copy)]
struct SectionSizes {
    uncompressed: u32,
    on_disk: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordShape {
    /// 12-byte node and attribute records, attribute chains rebuilt from
    /// per-attribute node indices.
    Compact,
    /// 16-byte records carrying explicit next-sibling and next-attribute
    /// links plus value offsets.
    Adjacency,
}

#[derive(Debug, Clone, Copy)]
struct NodeEntry {
    name: u32,
    parent: i32,
    first_attribute: i32,
}

#[derive(Debug, Clone, Copy)]
struct AttrEntry {
    name: u32,
    type_id: u32,
    length: usize,
    next: i32,
    node: i32,
    offset: usize,
}

/// Read an LSF file from disk.
pub fn read<P: AsRef<Path>>(path: P) -> Result<Resource> {
    let data = std::fs::read(path)?;
    read_bytes(&data)
}

/// Decode an LSF document from a byte buffer.
pub fn read_bytes(data: &[u8]) -> Result<Resource> {
    let mut cursor = Cursor::new(data);

    let magic: [u8; 4] = take(&mut cursor, 4)?.try_into().unwrap_or_default();
    if magic != LSF_MAGIC {
        return Err(Error::InvalidLsfMagic(magic));
    }
    let version = cursor.read_u32::<LittleEndian>()?;
    if !(LSF_VERSION_MIN..=LSF_VERSION_MAX).contains(&version) {
        return Err(Error::UnsupportedLsfVersion {
            version,
            min: LSF_VERSION_MIN,
            max: LSF_VERSION_MAX,
        });
    }

    let raw_engine = cursor.read_u64::<LittleEndian>()?;
    let mut engine_version = PackedVersion::from_version64(raw_engine);
    if engine_version.major == 0 {
        debug!(raw = raw_engine, "empty engine version, assuming 4.0.9.0");
        engine_version = PackedVersion::new(4, 0, 9, 0);
    }

    let strings_sizes = read_sizes(&mut cursor)?;
    let keys_sizes = read_sizes(&mut cursor)?;
    let nodes_sizes = read_sizes(&mut cursor)?;
    let attrs_sizes = read_sizes(&mut cursor)?;
    let values_sizes = read_sizes(&mut cursor)?;

    let flags = cursor.read_u8()?;
    let _unused = cursor.read_u8()?;
    let _padding = cursor.read_u16::<LittleEndian>()?;
    let metadata_raw = cursor.read_u32::<LittleEndian>()?;
    let metadata_format = MetadataFormat::from_raw(metadata_raw)
        .ok_or_else(|| Error::InvalidLsfSection(format!("unknown metadata format {metadata_raw}")))?;

    let method = CompressionMethod::from_flags(flags);
    let shape = if metadata_format.has_adjacency() {
        RecordShape::Adjacency
    } else {
        RecordShape::Compact
    };

    // Sections follow the header in metadata order. The strings section is
    // never chunk-framed; the others are when the method is LZ4.
    let strings_raw = read_section(&mut cursor, strings_sizes, method, false)?;
    let keys_raw = read_section(&mut cursor, keys_sizes, method, true)?;
    let nodes_raw = read_section(&mut cursor, nodes_sizes, method, true)?;
    let attrs_raw = read_section(&mut cursor, attrs_sizes, method, true)?;
    let values = read_section(&mut cursor, values_sizes, method, true)?;

    let chains = StringChains::parse(&strings_raw)?;
    let node_entries = parse_nodes(&nodes_raw, shape)?;
    let mut attr_entries = parse_attributes(&attrs_raw, shape)?;
    if shape == RecordShape::Compact {
        link_compact_chains(&mut attr_entries, node_entries.len())?;
    }

    let mut resource = Resource::new();
    resource.version = engine_version;
    resource.metadata_format = metadata_format;
    let ids = materialize(&mut resource, &node_entries, &attr_entries, &values, &chains)?;
    apply_keys(&mut resource, &keys_raw, &chains, &ids)?;

    Ok(resource)
}

fn take<'a>(cursor: &mut Cursor<&'a [u8]>, len: usize) -> Result<&'a [u8]> {
    let pos = cursor.position() as usize;
    let data = *cursor.get_ref();
    let slice = data.get(pos..pos + len).ok_or(Error::UnexpectedEof {
        needed: len,
        available: data.len().saturating_sub(pos),
    })?;
    cursor.set_position((pos + len) as u64);
    Ok(slice)
}

fn read_sizes(cursor: &mut Cursor<&[u8]>) -> Result<SectionSizes> {
    Ok(SectionSizes {
        uncompressed: cursor.read_u32::<LittleEndian>()?,
        on_disk: cursor.read_u32::<LittleEndian>()?,
    })
}

/// Read and inflate one section. An on-disk size of zero with a non-zero
/// uncompressed size means the bytes were stored unencoded.
fn read_section(
    cursor: &mut Cursor<&[u8]>,
    sizes: SectionSizes,
    method: CompressionMethod,
    chunked: bool,
) -> Result<Vec<u8>> {
    let uncompressed = sizes.uncompressed as usize;
    if sizes.on_disk == 0 {
        return Ok(take(cursor, uncompressed)?.to_vec());
    }
    let raw = take(cursor, sizes.on_disk as usize)?;
    decompress(raw, uncompressed, method, chunked)
}

fn parse_nodes(data: &[u8], shape: RecordShape) -> Result<Vec<NodeEntry>> {
    let record = match shape {
        RecordShape::Compact => 12,
        RecordShape::Adjacency => 16,
    };
    if data.len() % record != 0 {
        return Err(Error::InvalidLsfSection(format!(
            "node section of {} bytes is not a multiple of {record}",
            data.len()
        )));
    }

    let mut cursor = Cursor::new(data);
    let mut out = Vec::with_capacity(data.len() / record);
    for _ in 0..data.len() / record {
        let entry = match shape {
            RecordShape::Compact => {
                let name = cursor.read_u32::<LittleEndian>()?;
                let first_attribute = cursor.read_i32::<LittleEndian>()?;
                let parent = cursor.read_i32::<LittleEndian>()?;
                NodeEntry {
                    name,
                    parent,
                    first_attribute,
                }
            }
            RecordShape::Adjacency => {
                let name = cursor.read_u32::<LittleEndian>()?;
                let parent = cursor.read_i32::<LittleEndian>()?;
                let _next_sibling = cursor.read_i32::<LittleEndian>()?;
                let first_attribute = cursor.read_i32::<LittleEndian>()?;
                NodeEntry {
                    name,
                    parent,
                    first_attribute,
                }
            }
        };
        out.push(entry);
    }
    Ok(out)
}

fn parse_attributes(data: &[u8], shape: RecordShape) -> Result<Vec<AttrEntry>> {
    let record = match shape {
        RecordShape::Compact => 12,
        RecordShape::Adjacency => 16,
    };
    if data.len() % record != 0 {
        return Err(Error::InvalidLsfSection(format!(
            "attribute section of {} bytes is not a multiple of {record}",
            data.len()
        )));
    }

    let mut cursor = Cursor::new(data);
    let mut out = Vec::with_capacity(data.len() / record);
    let mut running_offset = 0usize;
    for _ in 0..data.len() / record {
        let name = cursor.read_u32::<LittleEndian>()?;
        let type_word = cursor.read_u32::<LittleEndian>()?;
        let type_id = type_word & 0x3F;
        let length = (type_word >> 6) as usize;
        let entry = match shape {
            RecordShape::Compact => {
                let node = cursor.read_i32::<LittleEndian>()?;
                let offset = running_offset;
                running_offset += length;
                AttrEntry {
                    name,
                    type_id,
                    length,
                    next: -1,
                    node,
                    offset,
                }
            }
            RecordShape::Adjacency => {
                let next = cursor.read_i32::<LittleEndian>()?;
                let offset = cursor.read_u32::<LittleEndian>()? as usize;
                AttrEntry {
                    name,
                    type_id,
                    length,
                    next,
                    node: -1,
                    offset,
                }
            }
        };
        out.push(entry);
    }
    Ok(out)
}

/// Rebuild per-node attribute chains for the compact shape, where each
/// attribute record names its owner instead of its successor.
fn link_compact_chains(entries: &mut [AttrEntry], node_count: usize) -> Result<()> {
    let mut last: Vec<i32> = vec![-1; node_count];
    for i in 0..entries.len() {
        let node = entries[i].node;
        let slot = usize::try_from(node)
            .ok()
            .filter(|&n| n < node_count)
            .ok_or(Error::InvalidNodeIndex(node))?;
        let prev = last[slot];
        if prev >= 0 {
            entries[prev as usize].next = i as i32;
        }
        last[slot] = i as i32;
    }
    Ok(())
}

fn materialize(
    resource: &mut Resource,
    node_entries: &[NodeEntry],
    attr_entries: &[AttrEntry],
    values: &[u8],
    chains: &StringChains,
) -> Result<Vec<NodeId>> {
    let mut ids: Vec<NodeId> = Vec::with_capacity(node_entries.len());
    for entry in node_entries {
        let name = chains.resolve(entry.name)?.to_owned();
        let id = if entry.parent < 0 {
            resource.add_region(name)
        } else {
            let parent = ids
                .get(entry.parent as usize)
                .copied()
                .ok_or(Error::InvalidNodeIndex(entry.parent))?;
            resource.append_child(parent, name)
        };

        let mut attr_index = entry.first_attribute;
        let mut steps = 0usize;
        while attr_index >= 0 {
            // A chain longer than the table means a cycle.
            steps += 1;
            if steps > attr_entries.len() {
                return Err(Error::InvalidLsfSection(
                    "attribute chain does not terminate".to_string(),
                ));
            }
            let attr = attr_entries
                .get(attr_index as usize)
                .ok_or(Error::InvalidAttributeIndex(attr_index))?;
            let attr_name = chains.resolve(attr.name)?.to_owned();
            let ty = AttributeType::from_id(attr.type_id).ok_or(
                Error::UnsupportedAttributeType {
                    type_id: attr.type_id,
                    type_name: "unknown",
                },
            )?;
            let bytes = values
                .get(attr.offset..attr.offset + attr.length)
                .ok_or_else(|| {
                    Error::InvalidLsfSection(format!(
                        "value range {}..{} outside values section of {} bytes",
                        attr.offset,
                        attr.offset + attr.length,
                        values.len()
                    ))
                })?;
            let value = decode_value(ty, bytes)?;
            resource.node_mut(id).attributes.insert(attr_name, value);
            attr_index = attr.next;
        }
        ids.push(id);
    }
    Ok(ids)
}

/// Apply the node-key table: 8-byte records of node index and packed key
/// attribute name. Sentinel names mark keyless nodes and are skipped.
fn apply_keys(
    resource: &mut Resource,
    data: &[u8],
    chains: &StringChains,
    ids: &[NodeId],
) -> Result<()> {
    if data.len() % 8 != 0 {
        return Err(Error::InvalidLsfSection(format!(
            "key section of {} bytes is not a multiple of 8",
            data.len()
        )));
    }
    let mut cursor = Cursor::new(data);
    for _ in 0..data.len() / 8 {
        let node_index = cursor.read_u32::<LittleEndian>()? as usize;
        let packed_name = cursor.read_u32::<LittleEndian>()?;
        if packed_name & 0xFFFF == 0xFFFF {
            continue;
        }
        let key = chains.resolve(packed_name)?.to_owned();
        let id = *ids
            .get(node_index)
            .ok_or(Error::InvalidNodeIndex(node_index as i32))?;
        resource.node_mut(id).key_attribute = Some(key);
    }
    Ok(())
}
