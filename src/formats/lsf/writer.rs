//! LSF binary writer.
//!
//! Flattens the node arena depth-first, interns names into the static
//! string table and emits the five sections with the metadata header. The
//! record shape follows the resource's metadata format; the adjacency
//! shape additionally carries sibling links and the node-key table.

use std::collections::HashMap;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::compression::{
    compress, pack_compression_flags, CompressionLevel, CompressionMethod,
};
use crate::error::{Error, Result};

use super::resource::{MetadataFormat, NodeId, Resource};
use super::string_table::StaticStringTable;
use super::{LSF_MAGIC, LSF_VERSION_MAX, LSF_VERSION_MIN};

/// Attribute value lengths are stored in 26 bits of the type word.
const MAX_VALUE_LEN: usize = (1 << 26) - 1;

/// Encoding knobs for [`write_with_options`].
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub version: u32,
    pub metadata_format: MetadataFormat,
    pub compression: CompressionMethod,
    pub level: CompressionLevel,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            version: LSF_VERSION_MAX,
            metadata_format: MetadataFormat::KeysAndAdjacency,
            compression: CompressionMethod::Lz4,
            level: CompressionLevel::Default,
        }
    }
}

struct NodeRec {
    name: u32,
    parent: i32,
    first_attribute: i32,
}

struct AttrRec {
    name: u32,
    type_word: u32,
    next: i32,
    node: i32,
    offset: u32,
}

/// Write a resource to disk with default options.
pub fn write<P: AsRef<Path>>(resource: &Resource, path: P) -> Result<()> {
    write_with_options(resource, path, &WriteOptions::default())
}

pub fn write_with_options<P: AsRef<Path>>(
    resource: &Resource,
    path: P,
    options: &WriteOptions,
) -> Result<()> {
    let bytes = to_bytes(resource, options)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Encode a resource into an LSF byte buffer.
pub fn to_bytes(resource: &Resource, options: &WriteOptions) -> Result<Vec<u8>> {
    if !(LSF_VERSION_MIN..=LSF_VERSION_MAX).contains(&options.version) {
        return Err(Error::UnsupportedLsfVersion {
            version: options.version,
            min: LSF_VERSION_MIN,
            max: LSF_VERSION_MAX,
        });
    }
    let adjacency = options.metadata_format.has_adjacency();

    let order = flatten(resource);
    let mut index_of: HashMap<NodeId, i32> = HashMap::with_capacity(order.len());
    for (i, id) in order.iter().enumerate() {
        index_of.insert(*id, i as i32);
    }

    let mut table = StaticStringTable::new();
    let mut node_recs: Vec<NodeRec> = Vec::with_capacity(order.len());
    let mut attr_recs: Vec<AttrRec> = Vec::new();
    let mut values: Vec<u8> = Vec::new();
    let mut keys: Vec<u8> = Vec::new();

    for (node_index, id) in order.iter().enumerate() {
        let node = resource.node(*id);
        let name = table.add(&node.name);
        let parent = node.parent.map_or(-1, |p| index_of[&p]);

        let first_attribute = if node.attributes.is_empty() {
            -1
        } else {
            attr_recs.len() as i32
        };
        let last = node.attributes.len().saturating_sub(1);
        for (i, (attr_name, value)) in node.attributes.iter().enumerate() {
            let offset = values.len();
            let len = crate::formats::common::encode_value(&mut values, value)?;
            if len > MAX_VALUE_LEN {
                return Err(Error::InvalidLsfSection(format!(
                    "attribute {attr_name:?} value of {len} bytes exceeds the format limit"
                )));
            }
            let next = if adjacency && i < last {
                attr_recs.len() as i32 + 1
            } else {
                -1
            };
            attr_recs.push(AttrRec {
                name: table.add(attr_name),
                type_word: value.attribute_type().id() | (len as u32) << 6,
                next,
                node: node_index as i32,
                offset: offset as u32,
            });
        }
        node_recs.push(NodeRec {
            name,
            parent,
            first_attribute,
        });

        if adjacency {
            if let Some(key) = &node.key_attribute {
                keys.write_u32::<LittleEndian>(node_index as u32)?;
                keys.write_u32::<LittleEndian>(table.add(key))?;
            }
        }
    }

    let next_sibling = sibling_links(resource, &order, &index_of);

    let mut nodes: Vec<u8> = Vec::with_capacity(node_recs.len() * if adjacency { 16 } else { 12 });
    for (i, rec) in node_recs.iter().enumerate() {
        nodes.write_u32::<LittleEndian>(rec.name)?;
        if adjacency {
            nodes.write_i32::<LittleEndian>(rec.parent)?;
            nodes.write_i32::<LittleEndian>(next_sibling[i])?;
            nodes.write_i32::<LittleEndian>(rec.first_attribute)?;
        } else {
            nodes.write_i32::<LittleEndian>(rec.first_attribute)?;
            nodes.write_i32::<LittleEndian>(rec.parent)?;
        }
    }

    let mut attrs: Vec<u8> = Vec::with_capacity(attr_recs.len() * if adjacency { 16 } else { 12 });
    for rec in &attr_recs {
        attrs.write_u32::<LittleEndian>(rec.name)?;
        attrs.write_u32::<LittleEndian>(rec.type_word)?;
        if adjacency {
            attrs.write_i32::<LittleEndian>(rec.next)?;
            attrs.write_u32::<LittleEndian>(rec.offset)?;
        } else {
            attrs.write_i32::<LittleEndian>(rec.node)?;
        }
    }

    let strings = table.to_bytes()?;

    // Strings are never chunk-framed; the record sections are when LZ4.
    let (strings_sizes, strings_out) =
        pack_section(&strings, options.compression, options.level, false)?;
    let (keys_sizes, keys_out) = pack_section(&keys, options.compression, options.level, true)?;
    let (nodes_sizes, nodes_out) = pack_section(&nodes, options.compression, options.level, true)?;
    let (attrs_sizes, attrs_out) = pack_section(&attrs, options.compression, options.level, true)?;
    let (values_sizes, values_out) =
        pack_section(&values, options.compression, options.level, true)?;

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(&LSF_MAGIC);
    out.write_u32::<LittleEndian>(options.version)?;
    out.write_u64::<LittleEndian>(resource.version.to_version64())?;
    for sizes in [
        strings_sizes,
        keys_sizes,
        nodes_sizes,
        attrs_sizes,
        values_sizes,
    ] {
        out.write_u32::<LittleEndian>(sizes.0)?;
        out.write_u32::<LittleEndian>(sizes.1)?;
    }
    out.write_u8(pack_compression_flags(options.compression, options.level))?;
    out.write_u8(0)?;
    out.write_u16::<LittleEndian>(0)?;
    out.write_u32::<LittleEndian>(options.metadata_format.to_raw())?;

    out.extend_from_slice(&strings_out);
    out.extend_from_slice(&keys_out);
    out.extend_from_slice(&nodes_out);
    out.extend_from_slice(&attrs_out);
    out.extend_from_slice(&values_out);
    Ok(out)
}

/// Depth-first flattening: regions in insertion order, then each node's
/// children across name groups in insertion order.
fn flatten(resource: &Resource) -> Vec<NodeId> {
    let mut order = Vec::with_capacity(resource.node_count());
    let mut stack: Vec<NodeId> = resource.regions().values().rev().copied().collect();
    while let Some(id) = stack.pop() {
        order.push(id);
        let children: Vec<NodeId> = resource.children_of(id).collect();
        stack.extend(children.into_iter().rev());
    }
    order
}

fn sibling_links(
    resource: &Resource,
    order: &[NodeId],
    index_of: &HashMap<NodeId, i32>,
) -> Vec<i32> {
    let mut next_sibling = vec![-1i32; order.len()];
    let mut chain = |ids: Vec<NodeId>| {
        for pair in ids.windows(2) {
            next_sibling[index_of[&pair[0]] as usize] = index_of[&pair[1]];
        }
    };
    chain(resource.regions().values().copied().collect());
    for id in order {
        chain(resource.children_of(*id).collect());
    }
    next_sibling
}

/// Compress one section, returning its (uncompressed, on-disk) size pair.
/// Uncompressed storage records an on-disk size of zero.
fn pack_section(
    data: &[u8],
    method: CompressionMethod,
    level: CompressionLevel,
    chunked: bool,
) -> Result<((u32, u32), Vec<u8>)> {
    if data.is_empty() {
        return Ok(((0, 0), Vec::new()));
    }
    if method == CompressionMethod::None {
        return Ok(((data.len() as u32, 0), data.to_vec()));
    }
    let packed = compress(data, method, level, chunked)?;
    Ok(((data.len() as u32, packed.len() as u32), packed))
}
