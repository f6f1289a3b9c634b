//! LSPK archive container: reader, writer and on-disk structures.

pub mod reader;
pub mod types;
pub mod writer;

pub use reader::PakReader;
pub use types::{pak_flags, FileEntry, PakHeader, FILE_ENTRY_SIZE, PAK_MAGIC, PAK_VERSION};
pub use writer::{create_from_directory, PakWriteOptions};
