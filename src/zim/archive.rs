use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::BinaryReader;

use super::codec::Codecs;
use super::extractor::Extractor;
use super::index::Index;
use super::parser::{build_index, parse_header};
use super::structures::{ArchiveHeader, IndexEntry};

/// State that only exists while the archive is open
#[derive(Debug)]
struct OpenArchive<R> {
    reader: BinaryReader<R>,
    header: ArchiveHeader,
    index: Index,
}

/// An open archive: exclusive owner of the underlying source, its header and
/// its index.
///
/// Reads move the source's cursor, so every read takes `&mut self`. To read
/// from several threads, put the handle behind a lock or open one handle per
/// thread.
///
/// ## Example
///
/// ```no_run
/// use runzim::Archive;
///
/// fn main() -> runzim::Result<()> {
///     let mut archive = Archive::open("wiki.zim")?;
///     let page = archive.fetch("A/Main_Page.html")?;
///     println!("{} bytes", page.len());
///     archive.extract_all("out".as_ref())?;
///     archive.close();
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Archive<R = File> {
    path: PathBuf,
    codecs: Codecs,
    state: Option<OpenArchive<R>>,
}

impl Archive<File> {
    /// Open an archive file, validate its header and build its index.
    ///
    /// The same file handle is kept for all later reads. On failure it is
    /// released before the error is returned.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BinaryReader::open(path.as_ref())?;
        Self::from_binary_reader(reader)
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Open an archive over any seekable source. `path` only labels errors.
    pub fn from_reader(reader: R, path: impl Into<PathBuf>) -> Result<Self> {
        Self::from_binary_reader(BinaryReader::new(reader, path))
    }

    fn from_binary_reader(mut reader: BinaryReader<R>) -> Result<Self> {
        // An archive that fails header validation is never indexed
        let header = parse_header(&mut reader)?;
        let index = build_index(&mut reader, &header)?;

        info!(
            path = %reader.path().display(),
            version = header.version,
            entries = index.len(),
            "Opened archive"
        );

        Ok(Self {
            path: reader.path().to_path_buf(),
            codecs: Codecs::default(),
            state: Some(OpenArchive {
                reader,
                header,
                index,
            }),
        })
    }

    /// Replace the decoders used by [`read_contents`](Self::read_contents)
    pub fn with_codecs(mut self, codecs: Codecs) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    fn state(&self) -> Result<&OpenArchive<R>> {
        self.state.as_ref().ok_or(Error::HandleClosed)
    }

    pub fn header(&self) -> Result<&ArchiveHeader> {
        Ok(&self.state()?.header)
    }

    pub fn index(&self) -> Result<&Index> {
        Ok(&self.state()?.index)
    }

    /// Find an entry by exact name
    pub fn lookup(&self, name: &str) -> Result<IndexEntry> {
        self.state()?.index.lookup(name).copied()
    }

    /// Read an entry's stored bytes: exactly `entry.size` bytes at `entry.offset`.
    ///
    /// `entry` must come from this archive's own index. The range is checked
    /// against the archive's current length, so a file truncated since open
    /// yields [`Error::TruncatedRead`].
    pub fn read_entry(&mut self, entry: &IndexEntry) -> Result<Vec<u8>> {
        let state = self.state.as_mut().ok_or(Error::HandleClosed)?;
        state.reader.read_at(entry.offset, entry.size)
    }

    /// Read an entry and decode it through the registered codecs
    pub fn read_contents(&mut self, entry: &IndexEntry) -> Result<Vec<u8>> {
        let stored = self.read_entry(entry)?;
        self.codecs.decode(entry, stored)
    }

    /// Look up an entry by name and return its decoded contents.
    ///
    /// A missing name is reported as [`Error::NotFound`]; failures after the
    /// lookup are wrapped with the entry name.
    pub fn fetch(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self.lookup(name)?;
        self.read_contents(&entry).map_err(|e| e.in_entry(name))
    }

    pub fn extractor(&mut self) -> Extractor<'_, R> {
        Extractor::new(self)
    }

    /// Extract every entry under `dest`. See [`Extractor::extract_all`].
    pub fn extract_all(&mut self, dest: &Path) -> Result<Vec<PathBuf>> {
        self.extractor().extract_all(dest)
    }

    /// Release the underlying source. Calling this again does nothing.
    pub fn close(&mut self) {
        if self.state.take().is_some() {
            debug!(path = %self.path.display(), "Closed archive");
        }
    }
}
