use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{Error, Result};

/// Seek+read primitive over an archive source.
///
/// Every read goes through the source's single cursor, so all methods take
/// `&mut self`. Callers that need parallel reads open one reader per consumer.
#[derive(Debug)]
pub struct BinaryReader<R> {
    inner: R,
    /// Label used in error messages; the file path for on-disk archives
    path: PathBuf,
}

impl<R: Read + Seek> BinaryReader<R> {
    pub fn new(inner: R, path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current total length of the source.
    ///
    /// Measured on each call, not cached, so a file truncated after open is
    /// noticed by the next read.
    pub fn stream_len(&mut self) -> Result<u64> {
        self.inner
            .seek(SeekFrom::End(0))
            .map_err(|e| Error::io("seek", &self.path, e))
    }

    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Fails with [`Error::TruncatedRead`] instead of returning a short buffer.
    pub fn read_at(&mut self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let available = self.stream_len()?.saturating_sub(offset);
        if len > available {
            return Err(Error::TruncatedRead {
                offset,
                len,
                available,
            });
        }

        trace!(offset, len, "read_at");
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::io("seek", &self.path, e))?;

        let mut buf = vec![0u8; len as usize];
        let mut filled = 0;

        // Not read_exact: on EOF we want to report how much actually arrived.
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(Error::TruncatedRead {
                        offset,
                        len,
                        available: filled as u64,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::io("read", &self.path, e)),
            }
        }

        Ok(buf)
    }
}
