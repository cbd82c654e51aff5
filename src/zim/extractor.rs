use std::fs;
use std::io::{Read, Seek, Write};
use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};

use super::archive::Archive;
use super::structures::IndexEntry;

/// Archive extractor.
///
/// Walks the archive's own index, the same one used by
/// [`Archive::lookup`], so lookup and extraction always see identical entries.
pub struct Extractor<'a, R> {
    archive: &'a mut Archive<R>,
}

impl<'a, R: Read + Seek> Extractor<'a, R> {
    pub fn new(archive: &'a mut Archive<R>) -> Self {
        Self { archive }
    }

    /// Extract every entry under `dest`, in name order.
    ///
    /// Stops at the first failing entry and returns its error wrapped with the
    /// entry name. Files already written are left in place.
    pub fn extract_all(&mut self, dest: &Path) -> Result<Vec<PathBuf>> {
        self.extract_matching(dest, |_| true)
    }

    /// Extract the entries whose names satisfy `predicate`
    pub fn extract_matching(
        &mut self,
        dest: &Path,
        mut predicate: impl FnMut(&str) -> bool,
    ) -> Result<Vec<PathBuf>> {
        let selected: Vec<(String, IndexEntry)> = self
            .archive
            .index()?
            .sorted()
            .into_iter()
            .filter(|(name, _)| predicate(name))
            .map(|(name, entry)| (name.to_string(), *entry))
            .collect();

        fs::create_dir_all(dest).map_err(|e| Error::io("create directory", dest, e))?;

        let mut written = Vec::with_capacity(selected.len());
        for (name, entry) in &selected {
            let path = self
                .extract_entry(name, entry, dest)
                .map_err(|e| e.in_entry(name))?;
            written.push(path);
        }

        info!(
            count = written.len(),
            dest = %dest.display(),
            "Extraction finished"
        );
        Ok(written)
    }

    /// Extract one entry to its sanitized path under `dest`
    pub fn extract_entry(
        &mut self,
        name: &str,
        entry: &IndexEntry,
        dest: &Path,
    ) -> Result<PathBuf> {
        let output_path = dest.join(sanitize_entry_name(name)?);

        // Directory marker entries
        if name.ends_with('/') && entry.size == 0 {
            fs::create_dir_all(&output_path)
                .map_err(|e| Error::io("create directory", &output_path, e))?;
            return Ok(output_path);
        }

        let data = self.archive.read_contents(entry)?;

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
        }

        info!(entry = name, "extracting");
        fs::write(&output_path, &data).map_err(|e| Error::io("write", &output_path, e))?;

        Ok(output_path)
    }

    /// Write one entry's decoded contents to `out`, returning the byte count
    pub fn extract_to_writer(&mut self, name: &str, out: &mut impl Write) -> Result<u64> {
        let data = self.archive.fetch(name)?;
        out.write_all(&data)
            .map_err(|e| Error::io("write", name, e))
            .map_err(|e| e.in_entry(name))?;
        Ok(data.len() as u64)
    }
}

/// Turn an entry name into a relative path that cannot leave the extraction
/// root.
///
/// `/` and `\` both separate segments; empty and `.` segments are dropped.
/// Absolute names, `..` segments, and drive prefixes are rejected.
pub fn sanitize_entry_name(name: &str) -> Result<PathBuf> {
    let unsafe_path = || Error::UnsafePath(name.to_string());

    if name.starts_with(['/', '\\']) {
        return Err(unsafe_path());
    }

    let mut relative = PathBuf::new();
    for segment in name.split(['/', '\\']) {
        if segment.is_empty() || segment == "." {
            continue;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => relative.push(part),
            _ => return Err(unsafe_path()),
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(unsafe_path());
    }
    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::zim::ArchiveBuilder;
    use std::io::Cursor;

    fn open(builder: ArchiveBuilder) -> Archive<Cursor<Vec<u8>>> {
        Archive::from_reader(Cursor::new(builder.to_bytes().unwrap()), "test.zim").unwrap()
    }

    #[test]
    fn test_sanitize_accepts_relative_names() {
        assert_eq!(
            sanitize_entry_name("dir/page.html").unwrap(),
            Path::new("dir").join("page.html")
        );
        assert_eq!(
            sanitize_entry_name("./a//b\\c.txt").unwrap(),
            Path::new("a").join("b").join("c.txt")
        );
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        let names = [
            "../etc/passwd",
            "a/../../b",
            "/abs/path",
            "\\abs",
            "..",
            "",
            "./",
            "a\\..\\b",
        ];
        for name in names {
            let err = sanitize_entry_name(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsafePath, "{name:?}");
        }
    }

    #[test]
    fn test_extract_all_writes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        let mut archive = open(
            ArchiveBuilder::new()
                .add("dir/page.html", b"<p>page</p>".to_vec())
                .add("image.png", vec![0x89, b'P', b'N', b'G'])
                .add_deflated("dir/deep/notes.txt", b"notes ".repeat(50)),
        );

        let written = archive.extract_all(&dest).unwrap();
        assert_eq!(written.len(), 3);

        assert_eq!(fs::read(dest.join("dir/page.html")).unwrap(), b"<p>page</p>");
        assert_eq!(fs::read(dest.join("image.png")).unwrap(), [0x89, b'P', b'N', b'G']);
        assert_eq!(
            fs::read(dest.join("dir/deep/notes.txt")).unwrap(),
            b"notes ".repeat(50)
        );
    }

    #[test]
    fn test_traversal_entry_aborts_without_escaping() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        let mut archive = open(
            ArchiveBuilder::new()
                .add("a.txt", b"a".to_vec())
                .add("../escape.txt", b"evil".to_vec()),
        );

        let err = archive.extract_all(&dest).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsafePath);
        assert!(matches!(err, Error::Entry { ref name, .. } if name == "../escape.txt"));
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_extract_matching_filters() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = open(
            ArchiveBuilder::new()
                .add("keep.html", b"k".to_vec())
                .add("skip.css", b"s".to_vec()),
        );

        let written = archive
            .extractor()
            .extract_matching(dir.path(), |name| name.ends_with(".html"))
            .unwrap();
        assert_eq!(written, vec![dir.path().join("keep.html")]);
        assert!(!dir.path().join("skip.css").exists());
    }

    #[test]
    fn test_directory_marker_entry_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = open(ArchiveBuilder::new().add("empty/", Vec::new()));

        archive.extract_all(dir.path()).unwrap();
        assert!(dir.path().join("empty").is_dir());
    }

    #[test]
    fn test_extract_to_writer() {
        let mut archive = open(ArchiveBuilder::new().add_deflated("a.txt", b"hello".to_vec()));
        let mut out = Vec::new();

        let n = archive.extractor().extract_to_writer("a.txt", &mut out).unwrap();
        assert_eq!(n, 5);
        assert_eq!(out, b"hello");
    }

    #[test]
    fn test_extract_to_writer_error_names_entry() {
        struct BrokenPipe;
        impl Write for BrokenPipe {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut archive = open(ArchiveBuilder::new().add("a.txt", b"hello".to_vec()));
        let err = archive
            .extractor()
            .extract_to_writer("a.txt", &mut BrokenPipe)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(
            err.to_string(),
            "Entry 'a.txt': write failed for 'a.txt': closed"
        );
    }

    #[test]
    fn test_extract_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = open(ArchiveBuilder::new().add("a.txt", b"a".to_vec()));
        archive.close();

        let err = archive.extract_all(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HandleClosed);
    }
}
