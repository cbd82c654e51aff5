//! Header and index decoding.
//!
//! ## Parsing Strategy
//!
//! Archives are read from the front:
//! 1. Verify the 11-byte signature at offset 0, reading nothing else on mismatch
//! 2. Decode the fixed header fields (version, creation time)
//! 3. Decode the index records that immediately follow the header
//!
//! Entry payloads are never touched here; they are read on demand through
//! the offsets recorded in the index.

use byteorder::{ByteOrder, LittleEndian};
use std::io::{Read, Seek};
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::BinaryReader;

use super::index::Index;
use super::structures::*;

/// Validate the signature and decode the fixed-layout header.
///
/// # Errors
///
/// - [`Error::InvalidFormat`] if the first bytes are not the signature (or a
///   prefix of it, for files shorter than the signature), or the version is
///   not one this crate understands
/// - [`Error::TruncatedRead`] if the archive is shorter than the fixed header
pub fn parse_header<R: Read + Seek>(reader: &mut BinaryReader<R>) -> Result<ArchiveHeader> {
    // Never read past the signature before it has been checked
    let available = reader.stream_len()?.min(SIGNATURE.len() as u64);
    let magic = reader.read_at(0, available)?;
    if magic[..] != SIGNATURE[..magic.len()] {
        return Err(Error::InvalidFormat(format!(
            "bad signature {:02x?}",
            magic
        )));
    }
    if magic.len() < SIGNATURE.len() {
        return Err(Error::TruncatedRead {
            offset: 0,
            len: HEADER_SIZE as u64,
            available,
        });
    }

    let fields = reader.read_at(
        SIGNATURE.len() as u64,
        (HEADER_SIZE - SIGNATURE.len()) as u64,
    )?;
    let version = LittleEndian::read_u32(&fields[0..4]);
    let created = LittleEndian::read_i64(&fields[4..12]);

    if !matches!(version, VERSION_1 | VERSION_2) {
        return Err(Error::InvalidFormat(format!(
            "unsupported version {version}"
        )));
    }

    debug!(version, created, "Parsed archive header");
    ArchiveHeader::from_unix_timestamp(version, created)
}

/// Decode the index region that follows the header.
///
/// The region is a `u32` record count followed by that many records. An
/// archive that ends right after the fixed header has an empty index. Each
/// record is `name_len: u16`, the UTF-8 name, `offset: u64` and `size: u64`;
/// version 2 records append `compression: u8` and `crc32: u32`.
///
/// # Errors
///
/// - [`Error::InvalidFormat`] for non-UTF-8 names, duplicate names, ranges that
///   overflow, or a record count the archive cannot possibly hold
/// - [`Error::TruncatedRead`] if the archive ends inside the index
pub fn build_index<R: Read + Seek>(
    reader: &mut BinaryReader<R>,
    header: &ArchiveHeader,
) -> Result<Index> {
    let mut offset = HEADER_SIZE as u64;

    // A bare header with no index region is an empty archive
    if reader.stream_len()? == offset {
        debug!("Archive has no index region");
        return Ok(Index::default());
    }

    let count = LittleEndian::read_u32(&reader.read_at(offset, 4)?);
    offset += 4;

    // Reject absurd counts before allocating for them
    let min_record = min_record_size(header.version);
    let remaining = reader.stream_len()?.saturating_sub(offset);
    if u64::from(count) * min_record > remaining {
        return Err(Error::InvalidFormat(format!(
            "index declares {count} entries but only {remaining} bytes follow the header"
        )));
    }

    let mut index = Index::with_capacity(count as usize);

    for i in 0..count {
        let name_len = u64::from(LittleEndian::read_u16(&reader.read_at(offset, 2)?));
        offset += 2;

        let record = reader.read_at(offset, name_len + min_record - 2)?;
        offset += record.len() as u64;

        let (name, fields) = record.split_at(name_len as usize);
        let name = String::from_utf8(name.to_vec()).map_err(|_| {
            Error::InvalidFormat(format!("index record {i}: name is not valid UTF-8"))
        })?;

        let mut entry = IndexEntry::new(
            LittleEndian::read_u64(&fields[0..8]),
            LittleEndian::read_u64(&fields[8..16]),
        );
        if header.version >= VERSION_2 {
            entry.compression = Compression::from_u8(fields[16]);
            entry.checksum = match LittleEndian::read_u32(&fields[17..21]) {
                0 => None,
                crc => Some(crc),
            };
        }

        if entry.end().is_none() {
            return Err(Error::InvalidFormat(format!(
                "index record {name:?}: range overflows"
            )));
        }

        index.insert(name, entry)?;
    }

    debug!(entries = index.len(), index_end = offset, "Built archive index");
    Ok(index)
}
