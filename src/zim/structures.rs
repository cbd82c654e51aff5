use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Magic signature at offset 0 of every archive
pub const SIGNATURE: &[u8; 11] = b"ZIM\x00\x00\x00\x00\x00\x00\x00\x00";

/// Fixed header: signature + version (u32) + creation time (i64)
pub const HEADER_SIZE: usize = SIGNATURE.len() + 4 + 8;

/// Format version with bare (name, offset, size) index records
pub const VERSION_1: u32 = 1;

/// Format version whose index records also carry compression and CRC-32
pub const VERSION_2: u32 = 2;

/// Smallest possible index record for each version (empty name)
pub(crate) const fn min_record_size(version: u32) -> u64 {
    match version {
        VERSION_1 => 2 + 8 + 8,
        _ => 2 + 8 + 8 + 1 + 4,
    }
}

/// Entry payload encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    #[default]
    Stored,
    Deflate,
    Unknown(u8),
}

impl Compression {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Compression::Stored,
            8 => Compression::Deflate,
            _ => Compression::Unknown(value),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Compression::Stored => 0,
            Compression::Deflate => 8,
            Compression::Unknown(v) => *v,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Compression::Stored => "stored",
            Compression::Deflate => "deflate",
            Compression::Unknown(_) => "unknown",
        }
    }
}

/// Decoded fixed-layout header.
///
/// Only constructed after the signature has been verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub version: u32,
    pub creation_time: SystemTime,
}

impl ArchiveHeader {
    /// Convert the on-disk seconds-since-epoch value.
    ///
    /// Fails with [`Error::InvalidFormat`] if the platform clock cannot
    /// represent the time.
    pub fn from_unix_timestamp(version: u32, secs: i64) -> Result<Self> {
        let offset = Duration::from_secs(secs.unsigned_abs());
        let creation_time = if secs >= 0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        }
        .ok_or_else(|| Error::InvalidFormat(format!("creation time {secs} out of range")))?;

        Ok(Self {
            version,
            creation_time,
        })
    }

    /// Creation time as seconds since the Unix epoch (negative before 1970)
    pub fn unix_timestamp(&self) -> i64 {
        match self.creation_time.duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
            Err(e) => 0i64
                .checked_sub_unsigned(e.duration().as_secs())
                .unwrap_or(i64::MIN),
        }
    }
}

/// Location of one entry's stored bytes inside the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub offset: u64,
    /// Stored (possibly compressed) length in bytes
    pub size: u64,
    pub compression: Compression,
    /// CRC-32 of the decoded contents, if recorded
    pub checksum: Option<u32>,
}

impl IndexEntry {
    /// A version 1 entry: stored, no checksum
    pub fn new(offset: u64, size: u64) -> Self {
        Self {
            offset,
            size,
            compression: Compression::Stored,
            checksum: None,
        }
    }

    /// One past the last byte, or `None` on overflow
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(HEADER_SIZE, 23);
    }

    #[test]
    fn test_timestamp_conversion() {
        let header = ArchiveHeader::from_unix_timestamp(1, 1_700_000_000).unwrap();
        assert_eq!(header.unix_timestamp(), 1_700_000_000);

        let before_epoch = ArchiveHeader::from_unix_timestamp(1, -86_400).unwrap();
        assert_eq!(before_epoch.unix_timestamp(), -86_400);
    }

    #[cfg(unix)]
    #[test]
    fn test_timestamp_extremes() {
        for secs in [i64::MIN, i64::MIN + 1, i64::MAX] {
            let header = ArchiveHeader::from_unix_timestamp(1, secs).unwrap();
            assert_eq!(header.unix_timestamp(), secs);
        }
    }

    #[test]
    fn test_compression_codes() {
        assert_eq!(Compression::from_u8(0), Compression::Stored);
        assert_eq!(Compression::from_u8(8), Compression::Deflate);
        assert_eq!(Compression::from_u8(3), Compression::Unknown(3));
        assert_eq!(Compression::Unknown(3).as_u8(), 3);
    }

    #[test]
    fn test_entry_end_overflow() {
        assert_eq!(IndexEntry::new(1024, 50).end(), Some(1074));
        assert_eq!(IndexEntry::new(u64::MAX, 1).end(), None);
    }
}
