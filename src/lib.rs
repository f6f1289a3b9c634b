//! Codec library for Larian file formats.
//!
//! Two containers are covered end to end:
//!
//! - **LSF** ([`formats::lsf`]): the binary node-graph resource format,
//!   with its hashed static string table and per-section compression.
//! - **LSPK** ([`pak`]): the PAK archive container, version 18, including
//!   multi-part archives and parallel extraction.
//!
//! Supporting layers: [`stream`] (positioned byte streams), [`compression`]
//! (LZ4 block/frame and zlib), [`progress`] (listener seam with cooperative
//! cancellation) and [`utils`] (sorted name collection).
//!
//! # Example
//!
//! ```no_run
//! use lskit::formats::lsf;
//!
//! # fn main() -> lskit::Result<()> {
//! let resource = lsf::read("meta.lsf")?;
//! for (name, _) in resource.regions() {
//!     println!("region: {name}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod compression;
pub mod error;
pub mod formats;
pub mod pak;
pub mod progress;
pub mod stream;
pub mod utils;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, Result};

/// Commonly used types, one `use` away.
pub mod prelude {
    pub use crate::compression::{CompressionLevel, CompressionMethod};
    pub use crate::error::{Error, Result};
    pub use crate::formats::common::{AttributeType, AttributeValue, PackedVersion};
    pub use crate::formats::lsf::{self, MetadataFormat, Node, NodeId, Resource};
    pub use crate::pak::{self, FileEntry, PakReader, PakWriteOptions};
    pub use crate::progress::{NullProgress, ProgressListener};
    pub use crate::stream::{FileStream, MemoryStream, SeekFrom, Stream};
}
