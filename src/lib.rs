//! # runzim
//!
//! A Rust reader and extractor for ZIM-style single-file archives.
//!
//! An archive bundles many named resources (pages, media, metadata) behind a
//! small binary header and an index mapping each name to a byte range. This
//! library validates the header, builds the index once, and then reads single
//! entries on demand with bounded seek+read calls, so archives are never loaded
//! into memory whole.
//!
//! ## Features
//!
//! - Signature and version validation before anything else is trusted
//! - Exact-name entry lookup over a hash index
//! - Truncation detection on every read, including files that shrink after open
//! - Bulk extraction with path sanitization (no writes outside the destination)
//! - Pluggable decompression and checksum verification (deflate/CRC-32 built in)
//!
//! ## Example
//!
//! ```no_run
//! use runzim::{Archive, ErrorKind};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut archive = Archive::open("wiki.zim")?;
//!     println!("version {}", archive.header()?.version);
//!
//!     match archive.fetch("A/Main_Page.html") {
//!         Ok(page) => println!("{} bytes", page.len()),
//!         Err(e) if e.kind() == ErrorKind::NotFound => println!("no such page"),
//!         Err(e) => return Err(e.into()),
//!     }
//!
//!     archive.close();
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod zim;

pub use cli::Cli;
pub use error::{Error, ErrorKind, Result};
pub use io::BinaryReader;
pub use zim::{Archive, ArchiveBuilder, ArchiveHeader, Codecs, Extractor, Index, IndexEntry};
