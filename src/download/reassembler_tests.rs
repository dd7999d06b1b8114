//! Unit tests for `ChunkReassembler`.

use std::{
    fs,
    io::{self, Cursor, Write},
    path::{Path, PathBuf},
};

use rstest::{fixture, rstest};
use sha1::{Digest, Sha1};
use tempfile::TempDir;

use super::*;

fn digest(data: &[u8]) -> String { hex::encode(Sha1::digest(data)) }

#[fixture]
fn dir() -> TempDir { TempDir::new().expect("tempdir") }

fn reassembler() -> ChunkReassembler { ChunkReassembler::new(LocalFs, 10) }

// ============================================================================
// Successful transfers
// ============================================================================

#[rstest]
fn chunks_are_written_in_order_and_verified(dir: TempDir) {
    let path = dir.path().join("song.mp3");
    let mut reassembler = reassembler();
    reassembler.begin(path.clone(), "song.mp3", 3).expect("open");

    let whole = b"first-second-third";
    assert_eq!(
        reassembler.push(1, 3, b"first-", None).expect("chunk 1"),
        ChunkOutcome::Pending
    );
    assert_eq!(
        reassembler.push(2, 3, b"second-", None).expect("chunk 2"),
        ChunkOutcome::Pending
    );
    let outcome = reassembler
        .push(3, 3, b"third", Some(&digest(whole)))
        .expect("chunk 3");

    assert_eq!(outcome, ChunkOutcome::Completed { path: path.clone() });
    assert!(!reassembler.is_active());
    assert_eq!(fs::read(&path).expect("read"), whole);
}

#[rstest]
fn upper_case_digest_is_accepted(dir: TempDir) {
    let path = dir.path().join("a");
    let mut reassembler = reassembler();
    reassembler.begin(path.clone(), "a", 1).expect("open");
    let outcome = reassembler
        .push(1, 1, b"abc", Some(&digest(b"abc").to_uppercase()))
        .expect("verified");
    assert_eq!(outcome, ChunkOutcome::Completed { path });
}

#[rstest]
fn begin_truncates_previous_content(dir: TempDir) {
    let path = dir.path().join("old");
    fs::write(&path, b"stale bytes that must vanish").expect("seed");

    let mut reassembler = reassembler();
    reassembler.begin(path.clone(), "old", 1).expect("open");
    reassembler
        .push(1, 1, b"new", Some(&digest(b"new")))
        .expect("verified");
    assert_eq!(fs::read(&path).expect("read"), b"new");
}

// ============================================================================
// Failures delete the partial file
// ============================================================================

#[rstest]
fn corrupted_chunk_deletes_file(dir: TempDir) {
    let path = dir.path().join("bad");
    let mut reassembler = reassembler();
    reassembler.begin(path.clone(), "bad", 2).expect("open");
    reassembler.push(1, 2, b"hellO", None).expect("chunk 1");

    let err = reassembler
        .push(2, 2, b" world", Some(&digest(b"hello world")))
        .expect_err("checksum mismatch");

    assert!(matches!(err, ReassemblyError::ChecksumMismatch { .. }));
    assert!(!path.exists());
    assert!(!reassembler.is_active());
}

#[rstest]
fn missing_checksum_is_an_error(dir: TempDir) {
    let path = dir.path().join("unsigned");
    let mut reassembler = reassembler();
    reassembler.begin(path.clone(), "unsigned", 1).expect("open");
    let err = reassembler.push(1, 1, b"data", None).expect_err("no hash");
    assert!(matches!(err, ReassemblyError::MissingChecksum { .. }));
    assert!(!path.exists());
}

#[rstest]
#[case::skipped_ahead(2)]
#[case::repeated_offer(0)]
fn out_of_order_chunk_abandons_file(dir: TempDir, #[case] chunk_number: u32) {
    let path = dir.path().join("gappy");
    let mut reassembler = reassembler();
    reassembler.begin(path.clone(), "gappy", 3).expect("open");

    let err = reassembler
        .push(chunk_number, 3, b"x", None)
        .expect_err("sequence violation");
    assert!(matches!(
        err,
        ReassemblyError::OutOfOrder { expected: 1, actual, .. } if actual == chunk_number
    ));
    assert!(!path.exists());
}

#[test]
fn push_without_open_file_is_rejected() {
    let mut reassembler = reassembler();
    let err = reassembler.push(1, 1, b"x", None).expect_err("nothing open");
    assert!(matches!(err, ReassemblyError::NoActiveFile { chunk_number: 1 }));
}

#[rstest]
fn abandon_is_idempotent(dir: TempDir) {
    let path = dir.path().join("partial");
    let mut reassembler = reassembler();
    reassembler.begin(path.clone(), "partial", 2).expect("open");
    reassembler.push(1, 2, b"half", None).expect("chunk 1");

    assert_eq!(reassembler.abandon(), Some(path.clone()));
    assert_eq!(reassembler.abandon(), None);
    assert!(!path.exists());
}

#[rstest]
fn abandon_incomplete_reports_progress(dir: TempDir) {
    let mut reassembler = reassembler();
    reassembler.begin(dir.path().join("f"), "f", 4).expect("open");
    reassembler.push(1, 4, b"a", None).expect("chunk 1");

    let err = reassembler.abandon_incomplete().expect("file was open");
    assert!(matches!(
        err,
        ReassemblyError::Incomplete { received: 1, count: 4, .. }
    ));
    assert!(reassembler.abandon_incomplete().is_none());
}

#[rstest]
fn dropping_reassembler_deletes_partial_file(dir: TempDir) {
    let path = dir.path().join("dropped");
    {
        let mut reassembler = reassembler();
        reassembler.begin(path.clone(), "dropped", 2).expect("open");
        reassembler.push(1, 2, b"half", None).expect("chunk 1");
        assert!(path.exists());
    }
    assert!(!path.exists());
}

#[rstest]
fn begin_replaces_unfinished_file(dir: TempDir) {
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    let mut reassembler = reassembler();
    reassembler.begin(first.clone(), "first", 2).expect("open first");
    reassembler.begin(second.clone(), "second", 1).expect("open second");

    assert!(!first.exists());
    assert_eq!(reassembler.active_path(), Some(second.as_path()));
}

// ============================================================================
// Write failures
// ============================================================================

/// Filesystem whose files accept only a fixed number of bytes in total.
#[derive(Default)]
struct CappedFs {
    capacity: usize,
    removed: std::cell::RefCell<Vec<PathBuf>>,
}

struct CappedFile {
    inner: Cursor<Vec<u8>>,
    capacity: usize,
}

impl Write for CappedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.capacity.saturating_sub(self.inner.get_ref().len());
        if room == 0 {
            return Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"));
        }
        let n = buf.len().min(room).min(1);
        self.inner.write(&buf[..n])
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

impl DownloadFs for CappedFs {
    type File = CappedFile;

    fn exists(&self, _path: &Path) -> bool { false }

    fn is_dir(&self, _path: &Path) -> bool { true }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> { Ok(()) }

    fn open_for_write(&self, _path: &Path) -> io::Result<CappedFile> {
        Ok(CappedFile {
            inner: Cursor::new(Vec::new()),
            capacity: self.capacity,
        })
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.removed.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> { Ok(()) }
}

#[test]
fn exhausted_retry_budget_deletes_partial_file() {
    let fs = CappedFs {
        capacity: 1024,
        ..CappedFs::default()
    };
    let mut reassembler = ChunkReassembler::new(fs, 10);
    reassembler.begin(PathBuf::from("slow"), "slow", 1).expect("open");

    // One byte per write call: 11 bytes cannot fit in 10 attempts.
    let err = reassembler
        .push(1, 1, b"eleven byte", None)
        .expect_err("retry limit");

    assert!(matches!(err, ReassemblyError::RetryLimit { attempts: 10, .. }));
    assert_eq!(*reassembler.fs().removed.borrow(), vec![PathBuf::from("slow")]);
}

#[test]
fn hard_write_error_deletes_partial_file() {
    let fs = CappedFs {
        capacity: 2,
        ..CappedFs::default()
    };
    let mut reassembler = ChunkReassembler::new(fs, 10);
    reassembler.begin(PathBuf::from("full"), "full", 1).expect("open");

    let err = reassembler.push(1, 1, b"abc", None).expect_err("disk full");

    assert!(matches!(err, ReassemblyError::Write { .. }));
    assert!(!reassembler.is_active());
    assert_eq!(reassembler.fs().removed.borrow().len(), 1);
}

#[test]
fn write_only_file_is_verified_from_received_chunks() {
    let fs = CappedFs {
        capacity: 1024,
        ..CappedFs::default()
    };
    let mut reassembler = ChunkReassembler::new(fs, 100);
    reassembler.begin(PathBuf::from("stream"), "stream", 2).expect("open");

    let first = reassembler.push(1, 2, b"ab", None).expect("first chunk");
    let last = reassembler
        .push(2, 2, b"c", Some(&digest(b"abc")))
        .expect("verified");

    assert_eq!(first, ChunkOutcome::Pending);
    assert_eq!(
        last,
        ChunkOutcome::Completed {
            path: PathBuf::from("stream")
        }
    );
    assert!(reassembler.fs().removed.borrow().is_empty());
}
