//! Pluggable payload decoding and integrity checks.
//!
//! The archive engine does not implement compression or checksum algorithms.
//! It hands stored bytes to whatever [`Decompressor`] is registered for the
//! entry's [`Compression`] method, then checks the result with the registered
//! [`Checksum`]. The defaults are backed by `flate2`.

use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read};

use crate::error::{Error, Result};

use super::structures::{Compression, IndexEntry};

/// Turns an entry's stored bytes into its contents
pub trait Decompressor: Send + Sync {
    fn decompress(&self, input: &[u8], output: &mut Vec<u8>) -> io::Result<()>;
}

/// Computes the 32-bit digest recorded in version 2 index records
pub trait Checksum: Send + Sync {
    fn checksum(&self, data: &[u8]) -> u32;
}

/// Raw deflate (no zlib or gzip framing)
#[derive(Debug, Clone, Copy, Default)]
pub struct Deflate;

impl Decompressor for Deflate {
    fn decompress(&self, input: &[u8], output: &mut Vec<u8>) -> io::Result<()> {
        DeflateDecoder::new(input).read_to_end(output)?;
        Ok(())
    }
}

/// CRC-32 (IEEE), as used by zip and gzip
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32;

impl Checksum for Crc32 {
    fn checksum(&self, data: &[u8]) -> u32 {
        let mut crc = Crc::new();
        crc.update(data);
        crc.sum()
    }
}

/// Registry of decoders consulted when reading entry contents
pub struct Codecs {
    decompressors: HashMap<Compression, Box<dyn Decompressor>>,
    checksum: Box<dyn Checksum>,
}

impl Default for Codecs {
    fn default() -> Self {
        Self::empty().register(Compression::Deflate, Deflate)
    }
}

impl fmt::Debug for Codecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.decompressors.keys().map(Compression::name).collect();
        methods.sort_unstable();
        f.debug_struct("Codecs").field("methods", &methods).finish()
    }
}

impl Codecs {
    /// Only stored entries can be decoded; checksums use CRC-32
    pub fn empty() -> Self {
        Self {
            decompressors: HashMap::new(),
            checksum: Box::new(Crc32),
        }
    }

    pub fn register(mut self, method: Compression, decompressor: impl Decompressor + 'static) -> Self {
        self.decompressors.insert(method, Box::new(decompressor));
        self
    }

    pub fn with_checksum(mut self, checksum: impl Checksum + 'static) -> Self {
        self.checksum = Box::new(checksum);
        self
    }

    /// Decode stored bytes and verify them against the entry's checksum
    pub fn decode(&self, entry: &IndexEntry, stored: Vec<u8>) -> Result<Vec<u8>> {
        let data = match entry.compression {
            Compression::Stored => stored,
            method => {
                let decompressor = self
                    .decompressors
                    .get(&method)
                    .ok_or(Error::UnsupportedCompression(method.as_u8()))?;
                let mut out = Vec::new();
                decompressor
                    .decompress(&stored, &mut out)
                    .map_err(Error::Decompress)?;
                out
            }
        };

        if let Some(expected) = entry.checksum {
            let actual = self.checksum.checksum(&data);
            if actual != expected {
                return Err(Error::ChecksumMismatch { expected, actual });
            }
        }

        Ok(data)
    }
}
