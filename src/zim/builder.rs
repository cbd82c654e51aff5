use byteorder::{ByteOrder, LittleEndian};
use flate2::write::DeflateEncoder;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

use super::codec::{Checksum, Crc32};
use super::structures::*;

struct PendingEntry {
    name: String,
    data: Vec<u8>,
    compression: Compression,
}

/// Writes archives in the on-disk layout this crate reads.
///
/// Payloads are laid out contiguously after the index, in insertion order.
/// The archive is written as version 1 unless an entry is deflated, in which
/// case every record carries its compression method and CRC-32 (version 2).
pub struct ArchiveBuilder {
    creation_time: i64,
    entries: Vec<PendingEntry>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        Self {
            creation_time: now,
            entries: Vec::new(),
        }
    }

    /// Override the creation timestamp (seconds since the Unix epoch)
    pub fn creation_time(mut self, secs: i64) -> Self {
        self.creation_time = secs;
        self
    }

    pub fn add(self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.push(name.into(), data.into(), Compression::Stored)
    }

    /// Add an entry that will be stored deflate-compressed
    pub fn add_deflated(self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.push(name.into(), data.into(), Compression::Deflate)
    }

    fn push(mut self, name: String, data: Vec<u8>, compression: Compression) -> Self {
        self.entries.push(PendingEntry {
            name,
            data,
            compression,
        });
        self
    }

    fn version(&self) -> u32 {
        if self
            .entries
            .iter()
            .any(|e| e.compression != Compression::Stored)
        {
            VERSION_2
        } else {
            VERSION_1
        }
    }

    pub fn write_file(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|e| Error::io("write", path, e))
    }

    /// Serialize the whole archive into memory
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let version = self.version();
        let mut seen = HashSet::new();
        let mut payloads = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(Error::InvalidFormat(format!(
                    "duplicate entry name {:?}",
                    entry.name
                )));
            }
            if entry.name.len() > usize::from(u16::MAX) {
                return Err(Error::InvalidFormat(format!(
                    "entry name too long ({} bytes)",
                    entry.name.len()
                )));
            }
            let stored = match entry.compression {
                Compression::Deflate => deflate(&entry.name, &entry.data)?,
                _ => entry.data.clone(),
            };
            payloads.push((stored, Crc32.checksum(&entry.data)));
        }

        Ok(self.encode(version, &payloads))
    }

    fn encode(&self, version: u32, payloads: &[(Vec<u8>, u32)]) -> Vec<u8> {
        let index_size: u64 = self
            .entries
            .iter()
            .map(|e| min_record_size(version) + e.name.len() as u64)
            .sum();
        let payload_size: u64 = payloads.iter().map(|(p, _)| p.len() as u64).sum();
        let mut offset = HEADER_SIZE as u64 + 4 + index_size;

        let mut buf = Vec::with_capacity((offset + payload_size) as usize);
        buf.extend_from_slice(SIGNATURE);
        put::<4>(&mut buf, |b| LittleEndian::write_u32(b, version));
        put::<8>(&mut buf, |b| LittleEndian::write_i64(b, self.creation_time));
        put::<4>(&mut buf, |b| {
            LittleEndian::write_u32(b, self.entries.len() as u32)
        });

        for (entry, (stored, crc)) in self.entries.iter().zip(payloads) {
            put::<2>(&mut buf, |b| {
                LittleEndian::write_u16(b, entry.name.len() as u16)
            });
            buf.extend_from_slice(entry.name.as_bytes());
            put::<8>(&mut buf, |b| LittleEndian::write_u64(b, offset));
            put::<8>(&mut buf, |b| LittleEndian::write_u64(b, stored.len() as u64));
            if version >= VERSION_2 {
                buf.push(entry.compression.as_u8());
                put::<4>(&mut buf, |b| LittleEndian::write_u32(b, *crc));
            }
            offset += stored.len() as u64;
        }

        for (stored, _) in payloads {
            buf.extend_from_slice(stored);
        }
        buf
    }
}

/// Append `N` little-endian bytes filled in by `write`
fn put<const N: usize>(buf: &mut Vec<u8>, write: impl FnOnce(&mut [u8])) {
    let mut bytes = [0u8; N];
    write(&mut bytes);
    buf.extend_from_slice(&bytes);
}

fn deflate(name: &str, data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::io("compress", name, e))?;
    encoder
        .finish()
        .map_err(|e| Error::io("compress", name, e))
}
