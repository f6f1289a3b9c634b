//! LSF binary resource format: node-graph documents with hashed string
//! tables and per-section compression.

pub mod reader;
pub mod resource;
pub mod string_table;
pub mod writer;

pub use reader::{read, read_bytes};
pub use resource::{MetadataFormat, Node, NodeId, Resource};
pub use string_table::{StaticStringTable, StringChains, NO_NAME, STRING_HASH_BUCKETS};
pub use writer::{to_bytes, write, write_with_options, WriteOptions};

/// File magic at offset 0.
pub const LSF_MAGIC: [u8; 4] = *b"LSOF";

/// Oldest header generation this codec accepts.
pub const LSF_VERSION_MIN: u32 = 6;

/// Newest header generation this codec accepts; also the writer default.
pub const LSF_VERSION_MAX: u32 = 7;
