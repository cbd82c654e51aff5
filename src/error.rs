//! Error types for archive access.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the archive access engine.
#[derive(Error, Debug)]
pub enum Error {
    /// The file is not an archive of this format, or its header/index is malformed
    #[error("Invalid archive format: {0}")]
    InvalidFormat(String),

    /// Fewer bytes were available than the operation required
    #[error(
        "Truncated read: wanted {len} bytes at offset {offset}, only {available} available"
    )]
    TruncatedRead { offset: u64, len: u64, available: u64 },

    /// No entry with this exact name exists in the index
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// The handle was used after `close`
    #[error("Archive handle is closed")]
    HandleClosed,

    /// Failure reported by the storage medium
    #[error("{op} failed for '{}': {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Entry name would resolve outside the extraction root
    #[error("Unsafe entry name: {0:?}")]
    UnsafePath(String),

    /// No decompressor is registered for this method
    #[error("Unsupported compression method: {0:#04x}")]
    UnsupportedCompression(u8),

    /// The registered decompressor rejected the stored bytes
    #[error("Decompression failed: {0}")]
    Decompress(#[source] io::Error),

    /// Decoded contents do not match the recorded checksum
    #[error("Checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// A failure while processing one named entry
    #[error("Entry '{name}': {source}")]
    Entry {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

/// Coarse classification of [`Error`], for consumers that map failures to
/// responses (e.g. "not found" versus "internal error").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidFormat,
    TruncatedRead,
    NotFound,
    HandleClosed,
    Io,
    UnsafePath,
    Unsupported,
    Corrupt,
}

impl Error {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn in_entry(self, name: &str) -> Self {
        Self::Entry {
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    /// Classify this error, looking through per-entry wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Self::TruncatedRead { .. } => ErrorKind::TruncatedRead,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::HandleClosed => ErrorKind::HandleClosed,
            Self::Io { .. } => ErrorKind::Io,
            Self::UnsafePath(_) => ErrorKind::UnsafePath,
            Self::UnsupportedCompression(_) => ErrorKind::Unsupported,
            Self::Decompress(_) | Self::ChecksumMismatch { .. } => ErrorKind::Corrupt,
            Self::Entry { source, .. } => source.kind(),
        }
    }
}
