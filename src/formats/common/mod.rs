//! Shared format plumbing: hashing, attribute typing, version packing

pub mod hash;
pub mod types;
pub mod version;

pub use hash::{fnv1a, Fnv1aHash};
pub use types::{decode_value, encode_value, format_uuid, AttributeType, AttributeValue};
pub use version::PackedVersion;
