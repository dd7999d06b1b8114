//! Unit tests for `DownloadCoordinator`.

use std::fs;

use rstest::{fixture, rstest};
use sha1::{Digest, Sha1};
use tempfile::TempDir;

use super::*;
use crate::message::SongMetadata;

fn offer(file_number: u32, filename: &str, size: u64, chunk_count: u32) -> ResponseSongFileChunk {
    ResponseSongFileChunk {
        chunk_number: 0,
        chunk_count,
        file_number,
        size,
        song_metadata: Some(SongMetadata {
            filename: filename.to_owned(),
            file_size: size,
            ..SongMetadata::default()
        }),
        data: Vec::new(),
        file_hash: None,
    }
}

fn data(
    file_number: u32,
    chunk_number: u32,
    chunk_count: u32,
    bytes: &[u8],
    whole: Option<&[u8]>,
) -> ResponseSongFileChunk {
    ResponseSongFileChunk {
        chunk_number,
        chunk_count,
        file_number,
        size: 0,
        song_metadata: None,
        data: bytes.to_vec(),
        file_hash: whole.map(|content| hex::encode(Sha1::digest(content))),
    }
}

struct Harness {
    dir: TempDir,
    coordinator: DownloadCoordinator,
}

#[fixture]
fn harness() -> Harness {
    let dir = TempDir::new().expect("tempdir");
    let coordinator = DownloadCoordinator::new(LocalFs, dir.path().to_path_buf(), false, 10);
    Harness { dir, coordinator }
}

// ============================================================================
// Batch scenarios
// ============================================================================

#[rstest]
fn skipped_existing_file_still_counts_towards_progress(mut harness: Harness) {
    fs::write(harness.dir.path().join("one.mp3"), b"already here").expect("seed");
    let second = vec![0xA5_u8; 1000];
    let c = &mut harness.coordinator;

    c.on_total_size_announced(2, 2000);

    let report = c.on_chunk(&offer(1, "one.mp3", 1000, 1));
    assert_eq!(report.offer_accepted, Some(false));
    assert_eq!(report.progress, Some(0.5));
    assert!(report.summary.is_none());

    let report = c.on_chunk(&offer(2, "two.mp3", 1000, 1));
    assert_eq!(report.offer_accepted, Some(true));

    let report = c.on_chunk(&data(2, 1, 1, &second, Some(second.as_slice())));
    assert_eq!(report.progress, Some(1.0));
    let summary = report.summary.expect("batch finished");

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.total, 2);
    assert_eq!(
        summary.errors,
        vec!["[1 / 2] skipping file one.mp3 (already exists)".to_owned()]
    );
    assert_eq!(c.bytes_downloaded(), 2000);
    assert_eq!(
        fs::read(harness.dir.path().join("two.mp3")).expect("read"),
        second
    );
    assert!(c.on_queue_empty().is_none(), "summary is reported once");
}

#[rstest]
fn overwrite_replaces_existing_file() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("song.mp3"), b"old").expect("seed");
    let mut c = DownloadCoordinator::new(LocalFs, dir.path().to_path_buf(), true, 10);

    c.on_total_size_announced(1, 3);
    assert_eq!(c.on_chunk(&offer(1, "song.mp3", 3, 1)).offer_accepted, Some(true));
    let summary = c
        .on_chunk(&data(1, 1, 1, b"new", Some(&b"new"[..])))
        .summary
        .expect("finished");

    assert_eq!(summary.completed, 1);
    assert!(summary.errors.is_empty());
    assert_eq!(fs::read(dir.path().join("song.mp3")).expect("read"), b"new");
}

#[rstest]
fn corrupted_file_is_deleted_and_not_counted(mut harness: Harness) {
    let c = &mut harness.coordinator;
    c.on_total_size_announced(1, 10);
    c.on_chunk(&offer(1, "bad.mp3", 10, 2));
    c.on_chunk(&data(1, 1, 2, b"01234", None));
    let summary = c
        .on_chunk(&data(1, 2, 2, b"5678X", Some(&b"0123456789"[..])))
        .summary
        .expect("finished");

    assert_eq!(summary.completed, 0);
    assert_eq!(summary.errors, vec!["[1 / 1] error file bad.mp3 (wrong sha1)".to_owned()]);
    assert!(!harness.dir.path().join("bad.mp3").exists());
}

#[rstest]
#[case::no_metadata(None, 10, "[1 / 2] file offer without metadata")]
#[case::zero_size(Some("empty.mp3"), 0, "[1 / 2] file offer without metadata")]
#[case::absolute(
    Some("/tmp/evil.mp3"),
    10,
    "[1 / 2] skipping file /tmp/evil.mp3 (not a plain file name)"
)]
#[case::parent(
    Some("../evil.mp3"),
    10,
    "[1 / 2] skipping file ../evil.mp3 (not a plain file name)"
)]
#[case::nested(
    Some("sub/evil.mp3"),
    10,
    "[1 / 2] skipping file sub/evil.mp3 (not a plain file name)"
)]
fn unusable_offer_is_rejected(
    mut harness: Harness,
    #[case] filename: Option<&str>,
    #[case] size: u64,
    #[case] error: &str,
) {
    let c = &mut harness.coordinator;
    c.on_total_size_announced(2, 10);
    let mut chunk = offer(1, filename.unwrap_or_default(), size, 1);
    if filename.is_none() {
        chunk.song_metadata = None;
    }

    let report = c.on_chunk(&chunk);

    assert_eq!(report.offer_accepted, Some(false));
    let summary = c.on_queue_empty().expect("summary");
    assert_eq!(summary.errors, vec![error.to_owned()]);
}

#[rstest]
#[case::absolute(true)]
#[case::parent(false)]
fn offered_path_outside_destination_is_never_written(#[case] absolute: bool) {
    let root = TempDir::new().expect("tempdir");
    let destination = root.path().join("downloads");
    fs::create_dir(&destination).expect("destination");
    let outside = TempDir::new().expect("outside");
    let (filename, escaped) = if absolute {
        let target = outside.path().join("evil.mp3");
        (target.display().to_string(), target)
    } else {
        ("../evil.mp3".to_owned(), root.path().join("evil.mp3"))
    };
    let mut c = DownloadCoordinator::new(LocalFs, destination, false, 10);
    c.on_total_size_announced(1, 4);

    let report = c.on_chunk(&offer(1, &filename, 4, 1));
    let stray = c.on_chunk(&data(1, 1, 1, b"evil", Some(&b"evil"[..])));

    assert_eq!(report.offer_accepted, Some(false));
    assert_eq!(stray, ChunkReport::default());
    assert!(!escaped.exists());
}

#[rstest]
fn offer_without_batch_is_rejected(mut harness: Harness) {
    let report = harness.coordinator.on_chunk(&offer(1, "x.mp3", 1, 1));
    assert_eq!(report.offer_accepted, Some(false));
    assert!(harness.coordinator.on_queue_empty().is_none());
}

#[rstest]
fn chunks_for_rejected_file_are_not_written(mut harness: Harness) {
    fs::write(harness.dir.path().join("dup.mp3"), b"keep me").expect("seed");
    let c = &mut harness.coordinator;
    c.on_total_size_announced(2, 8);

    c.on_chunk(&offer(1, "dup.mp3", 4, 1));
    let stray = c.on_chunk(&data(1, 1, 1, b"evil", Some(&b"evil"[..])));

    assert_eq!(stray, ChunkReport::default());
    assert_eq!(c.bytes_downloaded(), 4);
    assert_eq!(
        fs::read(harness.dir.path().join("dup.mp3")).expect("read"),
        b"keep me"
    );
}

// ============================================================================
// Cancellation
// ============================================================================

#[rstest]
fn cancel_mid_file_deletes_it_and_rejects_later_offers(mut harness: Harness) {
    let c = &mut harness.coordinator;
    c.on_total_size_announced(2, 20);
    c.on_chunk(&offer(1, "a.mp3", 10, 2));
    c.on_chunk(&data(1, 1, 2, b"01234", None));

    c.cancel();
    c.cancel();

    let report = c.on_chunk(&data(1, 2, 2, b"56789", Some(&b"0123456789"[..])));
    assert_eq!(report.progress, Some(0.5));
    assert!(!harness.dir.path().join("a.mp3").exists());

    let report = c.on_chunk(&offer(2, "b.mp3", 10, 1));
    assert_eq!(report.offer_accepted, Some(false));
    assert_eq!(report.progress, Some(1.0));
    let summary = report.summary.expect("finished");

    assert_eq!(summary.completed, 0);
    assert_eq!(
        summary.errors,
        vec!["[1 / 2] download cancelled from a.mp3".to_owned()],
        "cancellation is reported once"
    );
}

#[rstest]
fn cancel_handle_is_shared(harness: Harness) {
    let handle = harness.coordinator.cancel_handle();
    handle.cancel();
    assert!(harness.coordinator.cancel_handle().is_cancelled());
}

#[rstest]
fn new_batch_clears_cancellation(mut harness: Harness) {
    let c = &mut harness.coordinator;
    c.cancel();
    c.on_total_size_announced(1, 1);
    assert_eq!(c.on_chunk(&offer(1, "fresh.mp3", 1, 1)).offer_accepted, Some(true));
}

// ============================================================================
// Queue end and reset
// ============================================================================

#[rstest]
fn queue_empty_abandons_unfinished_file(mut harness: Harness) {
    let c = &mut harness.coordinator;
    c.on_total_size_announced(3, 30);
    c.on_chunk(&offer(1, "cut.mp3", 10, 2));
    c.on_chunk(&data(1, 1, 2, b"01234", None));

    let summary = c.on_queue_empty().expect("summary");

    assert_eq!(summary.total, 3);
    assert_eq!(
        summary.errors,
        vec!["[1 / 3] error file cut.mp3 (transfer ended after chunk 1 of 2)".to_owned()]
    );
    assert!(!harness.dir.path().join("cut.mp3").exists());
    assert!(!c.is_running());
}

#[rstest]
fn reset_discards_batch(mut harness: Harness) {
    let c = &mut harness.coordinator;
    c.on_total_size_announced(1, 10);
    c.on_chunk(&offer(1, "gone.mp3", 10, 2));
    c.on_chunk(&data(1, 1, 2, b"01234", None));

    c.reset();

    assert!(!harness.dir.path().join("gone.mp3").exists());
    assert_eq!(c.bytes_downloaded(), 0);
    assert!(c.on_queue_empty().is_none());
}

#[rstest]
fn prepare_destination_rejects_file(mut harness: Harness) {
    let occupied = harness.dir.path().join("playlists");
    fs::write(&occupied, b"not a dir").expect("seed");

    let err = harness
        .coordinator
        .prepare_destination(occupied.join("road trip"))
        .expect_err("parent is a file");
    let summary = DownloadSummary::failed(&err);

    assert_eq!(summary.completed, 0);
    assert_eq!(summary.total, 0);
    assert_eq!(summary.errors.len(), 1);
}

#[rstest]
fn prepare_destination_creates_playlist_folder(mut harness: Harness) {
    let target = harness.dir.path().join("playlists").join("road trip");
    harness
        .coordinator
        .prepare_destination(target.clone())
        .expect("created");
    assert!(target.is_dir());
    assert_eq!(harness.coordinator.destination(), target.as_path());
}
