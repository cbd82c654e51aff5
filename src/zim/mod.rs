//! ZIM-style archive access.
//!
//! ## Architecture
//!
//! - [`structures`]: on-disk constants and data types (header, index entries)
//! - [`parser`]: signature check, header decoding and index construction
//! - [`index`]: the in-memory name → byte range directory
//! - [`archive`]: the handle that owns the open file and its lifecycle
//! - [`extractor`]: writes entries out to a directory tree
//! - [`codec`]: pluggable decompression and checksum verification
//! - [`builder`]: writes archives in the same layout
//!
//! ## Format Overview
//!
//! An archive consists of:
//! 1. An 11-byte signature (`"ZIM"` + eight NUL bytes)
//! 2. A fixed header: version (u32) and creation time (i64 Unix seconds)
//! 3. The index: a u32 count followed by (name, offset, size) records
//! 4. Entry payloads at the offsets named by the index
//!
//! All integers are little endian. Version 2 index records additionally carry
//! a compression method and a CRC-32 of the decoded contents.
//!
//! The header and index are read once at open time; payloads are only read
//! when an entry is requested, so large archives are never loaded whole.

mod archive;
mod builder;
mod codec;
mod extractor;
mod index;
mod parser;
mod structures;

pub use archive::Archive;
pub use builder::ArchiveBuilder;
pub use codec::{Checksum, Codecs, Crc32, Decompressor, Deflate};
pub use extractor::{Extractor, sanitize_entry_name};
pub use index::Index;
pub use parser::{build_index, parse_header};
pub use structures::*;
