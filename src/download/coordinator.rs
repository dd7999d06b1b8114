//! Batch-level bookkeeping for song downloads.
//!
//! The player announces a batch with `DOWNLOAD_TOTAL_SIZE`, then streams
//! each file as an offer (chunk `0`) followed by data chunks `1..=n`. The
//! [`DownloadCoordinator`] decides whether to accept each offer, drives the
//! [`ChunkReassembler`], tracks progress and per-file errors, and reports a
//! single [`DownloadSummary`] per batch.

use std::{
    collections::BTreeMap,
    path::{Component, Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::{debug, info, warn};

use super::{
    error::{BatchError, ReassemblyError},
    fs::{DownloadFs, LocalFs, ensure_directory},
    reassembler::{ChunkOutcome, ChunkReassembler},
};
use crate::{
    message::ResponseSongFileChunk,
    metrics::{self, ErrorKind},
};

/// Shared, advisory cancellation flag for the current batch.
///
/// Cancelling is observed at the next chunk boundary. Setting it more than
/// once has no further effect.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Request cancellation of the current batch.
    pub fn cancel(&self) { self.0.store(true, Ordering::Relaxed); }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Relaxed) }

    fn clear(&self) { self.0.store(false, Ordering::Relaxed); }
}

/// Final report for one batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Files written and verified.
    pub completed: u32,
    /// Files announced for the batch.
    pub total: u32,
    /// One `"[n / N] reason"` entry per failed file, ordered by file number.
    pub errors: Vec<String>,
}

impl DownloadSummary {
    /// Summary for a batch that failed before any file was processed.
    #[must_use]
    pub fn failed(err: &BatchError) -> Self {
        Self {
            completed: 0,
            total: 0,
            errors: vec![err.to_string()],
        }
    }
}

/// What the caller must do after a chunk was processed.
#[derive(Debug, Default, PartialEq)]
pub struct ChunkReport {
    /// Answer to send for an offer chunk.
    pub offer_accepted: Option<bool>,
    /// Updated progress fraction in `0.0..=1.0`.
    pub progress: Option<f64>,
    /// Set once, when the last announced file has been resolved.
    pub summary: Option<DownloadSummary>,
}

#[derive(Debug, Default)]
struct DownloadJob {
    file_count: u32,
    total_bytes: u64,
    bytes_downloaded: u64,
    completed: u32,
    /// File whose offer was accepted and whose chunks are expected.
    accepted_file: Option<u32>,
    current_filename: String,
    errors: BTreeMap<u32, String>,
    cancel_recorded: bool,
    finished: bool,
}

impl DownloadJob {
    fn new(file_count: u32, total_bytes: u64) -> Self {
        Self {
            file_count,
            total_bytes,
            ..Self::default()
        }
    }

    fn progress(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        #[expect(clippy::cast_precision_loss, reason = "progress is approximate")]
        let fraction = self.bytes_downloaded as f64 / self.total_bytes as f64;
        fraction.min(1.0)
    }

    fn record(&mut self, file_number: u32, err: &ReassemblyError) {
        warn!(file_number, error = %err, "download failed for file");
        metrics::inc_errors(ErrorKind::Download);
        self.errors.entry(file_number).or_insert_with(|| err.to_string());
    }

    fn record_cancel(&mut self, file_number: u32) {
        if self.cancel_recorded {
            return;
        }
        self.cancel_recorded = true;
        let err = ReassemblyError::Cancelled {
            filename: self.current_filename.clone(),
        };
        self.record(file_number, &err);
    }

    fn summary(&self) -> DownloadSummary {
        DownloadSummary {
            completed: self.completed,
            total: self.file_count,
            errors: self
                .errors
                .iter()
                .map(|(n, reason)| format!("[{n} / {}] {reason}", self.file_count))
                .collect(),
        }
    }

    fn finish_if_last(&mut self, file_number: u32) -> Option<DownloadSummary> {
        if self.finished || file_number < self.file_count {
            return None;
        }
        self.finished = true;
        Some(self.summary())
    }
}

/// Tracks one song batch at a time.
pub struct DownloadCoordinator<F: DownloadFs = LocalFs> {
    reassembler: ChunkReassembler<F>,
    destination: PathBuf,
    overwrite: bool,
    cancel: CancelHandle,
    job: Option<DownloadJob>,
}

impl<F: DownloadFs> DownloadCoordinator<F> {
    /// Create a coordinator writing into `destination`.
    pub fn new(fs: F, destination: PathBuf, overwrite: bool, write_attempts: u32) -> Self {
        Self {
            reassembler: ChunkReassembler::new(fs, write_attempts),
            destination,
            overwrite,
            cancel: CancelHandle::default(),
            job: None,
        }
    }

    /// Handle for cancelling the running batch from another task.
    pub fn cancel_handle(&self) -> CancelHandle { self.cancel.clone() }

    /// Request cancellation of the running batch.
    pub fn cancel(&self) { self.cancel.cancel(); }

    /// Directory the next batch is written to.
    pub fn destination(&self) -> &Path { &self.destination }

    /// Bytes accounted so far, including skipped files.
    pub fn bytes_downloaded(&self) -> u64 { self.job.as_ref().map_or(0, |job| job.bytes_downloaded) }

    /// Whether a batch has been announced and not yet finished.
    pub fn is_running(&self) -> bool { self.job.as_ref().is_some_and(|job| !job.finished) }

    /// Make `destination` the target of the next batch, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns a [`BatchError`] if `destination` is not a usable directory.
    /// The caller reports it with [`DownloadSummary::failed`] and does not
    /// request the batch.
    pub fn prepare_destination(&mut self, destination: PathBuf) -> Result<(), BatchError> {
        ensure_directory(self.reassembler.fs(), &destination)?;
        debug!(path = %destination.display(), "download destination ready");
        self.destination = destination;
        Ok(())
    }

    /// Start a new batch of `file_count` files totalling `total_bytes`.
    ///
    /// Any previous batch state is discarded and the cancel flag is cleared.
    pub fn on_total_size_announced(&mut self, file_count: u32, total_bytes: u64) {
        self.reassembler.abandon();
        self.cancel.clear();
        info!(file_count, total_bytes, "download batch announced");
        self.job = Some(DownloadJob::new(file_count, total_bytes));
    }

    /// Process one `SONG_FILE_CHUNK`.
    pub fn on_chunk(&mut self, chunk: &ResponseSongFileChunk) -> ChunkReport {
        if chunk.chunk_number == 0 {
            self.on_offer(chunk)
        } else {
            self.on_data(chunk)
        }
    }

    /// The player signalled the end of the batch.
    ///
    /// Returns the summary unless it was already reported.
    pub fn on_queue_empty(&mut self) -> Option<DownloadSummary> {
        let job = self.job.as_mut()?;
        if let Some(err) = self.reassembler.abandon_incomplete() {
            let file_number = job.accepted_file.take().unwrap_or(job.file_count);
            job.record(file_number, &err);
        }
        if job.finished {
            return None;
        }
        job.finished = true;
        Some(job.summary())
    }

    /// Drop all batch state, deleting any partially written file.
    pub fn reset(&mut self) {
        self.reassembler.abandon();
        self.cancel.clear();
        self.job = None;
    }

    fn on_offer(&mut self, chunk: &ResponseSongFileChunk) -> ChunkReport {
        let file_number = chunk.file_number;
        let cancelled = self.cancel.is_cancelled();

        let Some(job) = self.job.as_mut() else {
            warn!(file_number, "file offer outside an announced batch");
            return ChunkReport {
                offer_accepted: Some(false),
                ..ChunkReport::default()
            };
        };

        if let Some(err) = self.reassembler.abandon_incomplete() {
            let previous = job.accepted_file.unwrap_or(file_number);
            job.record(previous, &err);
        }
        job.accepted_file = None;

        let decision = match chunk.song_metadata.as_ref() {
            Some(song) if chunk.size != 0 => {
                job.current_filename.clone_from(&song.filename);
                if cancelled {
                    job.record_cancel(file_number);
                    None
                } else if is_plain_file_name(&song.filename) {
                    Some(song.filename.as_str())
                } else {
                    job.record(
                        file_number,
                        &ReassemblyError::UnsafeFilename {
                            filename: song.filename.clone(),
                        },
                    );
                    None
                }
            }
            _ => {
                job.record(file_number, &ReassemblyError::MissingMetadata);
                None
            }
        };

        let accepted = match decision {
            None => false,
            Some(filename) => {
                let path = self.destination.join(filename);
                if !self.overwrite && self.reassembler.fs().exists(&path) {
                    job.record(
                        file_number,
                        &ReassemblyError::AlreadyExists {
                            filename: filename.to_owned(),
                        },
                    );
                    false
                } else {
                    match self.reassembler.begin(path, filename, chunk.chunk_count) {
                        Ok(()) => true,
                        Err(err) => {
                            job.record(file_number, &err);
                            false
                        }
                    }
                }
            }
        };

        let mut report = ChunkReport {
            offer_accepted: Some(accepted),
            ..ChunkReport::default()
        };
        if accepted {
            job.accepted_file = Some(file_number);
        } else {
            job.bytes_downloaded += chunk.size;
            report.summary = job.finish_if_last(file_number);
        }
        debug!(file_number, accepted, "answered file offer");
        report.progress = Some(job.progress());
        report
    }

    fn on_data(&mut self, chunk: &ResponseSongFileChunk) -> ChunkReport {
        let file_number = chunk.file_number;
        let Some(job) = self.job.as_mut() else {
            warn!(file_number, "file chunk outside an announced batch");
            return ChunkReport::default();
        };
        if job.accepted_file != Some(file_number) {
            debug!(file_number, chunk = chunk.chunk_number, "ignoring chunk of a rejected file");
            return ChunkReport::default();
        }

        let received = chunk.data.len() as u64;
        job.bytes_downloaded += received;
        metrics::add_download_bytes(received);

        if self.cancel.is_cancelled() {
            if self.reassembler.abandon().is_some() {
                info!(file_number, "deleted partial file after cancellation");
            }
            job.record_cancel(file_number);
        } else if self.reassembler.is_active() {
            match self.reassembler.push(
                chunk.chunk_number,
                chunk.chunk_count,
                &chunk.data,
                chunk.file_hash.as_deref(),
            ) {
                Ok(ChunkOutcome::Pending) => {}
                Ok(ChunkOutcome::Completed { path }) => {
                    job.completed += 1;
                    info!(file_number, path = %path.display(), "file downloaded");
                }
                Err(err) => job.record(file_number, &err),
            }
        }

        let mut report = ChunkReport {
            progress: Some(job.progress()),
            ..ChunkReport::default()
        };
        if chunk.chunk_number >= chunk.chunk_count {
            job.accepted_file = None;
            report.summary = job.finish_if_last(file_number);
        }
        report
    }
}

/// Whether `filename` names an entry directly inside the destination.
///
/// Absolute paths, `..` and nested components are refused.
fn is_plain_file_name(filename: &str) -> bool {
    let mut components = Path::new(filename).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;

