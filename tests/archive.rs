//! End-to-end tests over archives written to disk.

use byteorder::{LittleEndian, WriteBytesExt};
use pretty_assertions::assert_eq;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use runzim::{Archive, ArchiveBuilder, Error, ErrorKind, IndexEntry};

const SIGNATURE: &[u8] = b"ZIM\x00\x00\x00\x00\x00\x00\x00\x00";

fn header(version: u32, created: i64) -> Vec<u8> {
    let mut buf = SIGNATURE.to_vec();
    buf.write_u32::<LittleEndian>(version).unwrap();
    buf.write_i64::<LittleEndian>(created).unwrap();
    buf
}

/// Archive with a single "a.html" entry of 50 bytes at offset 1024
fn padded_archive() -> (Vec<u8>, Vec<u8>) {
    let body: Vec<u8> = (0..50u8).map(|i| b'a' + i % 26).collect();

    let mut data = header(1, 1_700_000_000);
    data.write_u32::<LittleEndian>(1).unwrap();
    data.write_u16::<LittleEndian>(6).unwrap();
    data.write_all(b"a.html").unwrap();
    data.write_u64::<LittleEndian>(1024).unwrap();
    data.write_u64::<LittleEndian>(50).unwrap();
    data.resize(1024, 0);
    data.extend_from_slice(&body);

    (data, body)
}

fn write(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}

#[test]
fn open_header_only_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "bare.zim", &header(1, 1_234_567_890));

    let mut archive = Archive::open(&path).unwrap();
    assert_eq!(archive.header().unwrap().version, 1);
    assert_eq!(archive.header().unwrap().unix_timestamp(), 1_234_567_890);
    assert!(archive.index().unwrap().is_empty());

    archive.close();
    archive.close();
}

#[test]
fn open_rejects_missing_signature() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = b"NOTZIM".to_vec();
    data.resize(128, 0);
    let path = write(dir.path(), "not.zim", &data);

    let result = Archive::open(&path);
    assert!(matches!(result, Err(Error::InvalidFormat(_))));
}

#[test]
fn open_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Archive::open(dir.path().join("absent.zim")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("absent.zim"));
}

#[test]
fn read_entry_at_fixed_offset() {
    let dir = tempfile::tempdir().unwrap();
    let (data, body) = padded_archive();
    assert_eq!(data.len(), 1074);
    let path = write(dir.path(), "padded.zim", &data);

    let mut archive = Archive::open(&path).unwrap();
    let entry = archive.lookup("a.html").unwrap();
    assert_eq!(entry, IndexEntry::new(1024, 50));

    let bytes = archive.read_entry(&entry).unwrap();
    assert_eq!(bytes, body);
}

#[test]
fn read_entry_on_short_archive_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let (mut data, _) = padded_archive();
    data.truncate(1050);
    let path = write(dir.path(), "short.zim", &data);

    let mut archive = Archive::open(&path).unwrap();
    let entry = archive.lookup("a.html").unwrap();

    match archive.read_entry(&entry) {
        Err(Error::TruncatedRead {
            offset,
            len,
            available,
        }) => assert_eq!((offset, len, available), (1024, 50, 26)),
        other => panic!("expected TruncatedRead, got {other:?}"),
    }
}

#[test]
fn file_truncated_after_open_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let (data, _) = padded_archive();
    let path = write(dir.path(), "shrinking.zim", &data);

    let mut archive = Archive::open(&path).unwrap();
    let entry = archive.lookup("a.html").unwrap();

    OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_len(1030)
        .unwrap();

    let err = archive.read_entry(&entry).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TruncatedRead);
}

#[test]
fn extract_all_reproduces_entries() {
    let dir = tempfile::tempdir().unwrap();
    let page = b"<html><body>page</body></html>".to_vec();
    let image: Vec<u8> = (0..=255u8).collect();
    let path = dir.path().join("site.zim");
    ArchiveBuilder::new()
        .add("dir/page.html", page.clone())
        .add("image.png", image.clone())
        .write_file(&path)
        .unwrap();

    let out = dir.path().join("out");
    let mut archive = Archive::open(&path).unwrap();
    archive.extract_all(&out).unwrap();
    archive.close();

    assert_eq!(fs::read(out.join("dir").join("page.html")).unwrap(), page);
    assert_eq!(fs::read(out.join("image.png")).unwrap(), image);
}

#[test]
fn extraction_and_lookup_see_same_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.zim");
    ArchiveBuilder::new()
        .add("A/one.html", b"one".to_vec())
        .add_deflated("A/two.html", b"two two two two".to_vec())
        .add("M/Title", b"Example".to_vec())
        .write_file(&path)
        .unwrap();

    let out = dir.path().join("out");
    let mut archive = Archive::open(&path).unwrap();
    let written = archive.extract_all(&out).unwrap();

    let names: Vec<String> = archive
        .index()
        .unwrap()
        .sorted()
        .into_iter()
        .map(|(name, _)| name.to_string())
        .collect();
    assert_eq!(written.len(), names.len());

    for name in &names {
        let contents = archive.fetch(name).unwrap();
        assert_eq!(fs::read(out.join(name)).unwrap(), contents, "{name}");
    }
}

#[test]
fn extraction_stops_on_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.zim");
    ArchiveBuilder::new()
        .add("a.txt", b"first".to_vec())
        .add("b.txt", b"second".to_vec())
        .add("c.txt", b"third".to_vec())
        .write_file(&path)
        .unwrap();

    let mut archive = Archive::open(&path).unwrap();
    let b = archive.lookup("b.txt").unwrap();

    // Cut the file inside b.txt's payload
    OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_len(b.offset + 2)
        .unwrap();

    let out = dir.path().join("out");
    let err = archive.extract_all(&out).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TruncatedRead);
    assert!(matches!(err, Error::Entry { ref name, .. } if name == "b.txt"));

    // Not rolled back, and nothing after the failure
    assert_eq!(fs::read(out.join("a.txt")).unwrap(), b"first");
    assert!(!out.join("b.txt").exists());
    assert!(!out.join("c.txt").exists());
}
