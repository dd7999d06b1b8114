//! Library snapshot receiver.
//!
//! The player streams its music library as a single chunked file. There is no
//! offer step: chunk `1` always starts a fresh snapshot. Data is written to
//! `<library_dir>/<session>.library.part` and renamed to
//! `<session>.library` once the SHA-1 matches, so a failed refresh never
//! clobbers the previous snapshot.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{
    error::ReassemblyError,
    fs::{DownloadFs, LocalFs, ensure_directory},
    reassembler::{ChunkOutcome, ChunkReassembler},
};
use crate::{
    message::ResponseLibraryChunk,
    metrics::{self, ErrorKind},
};

const SNAPSHOT_EXTENSION: &str = "library";

/// What happened after a library chunk was processed.
#[derive(Debug)]
pub enum LibraryOutcome {
    /// Transfer continues; progress fraction in `0.0..=1.0`.
    Progress(f64),
    /// The snapshot is verified and ready to be loaded.
    Ready(PathBuf),
    /// The transfer failed; any previous snapshot is untouched.
    Failed(ReassemblyError),
    /// Chunk ignored because no transfer is in progress.
    Ignored,
}

/// Receives library snapshot transfers.
pub struct LibraryChunkReceiver<F: DownloadFs = LocalFs> {
    reassembler: ChunkReassembler<F>,
    library_dir: PathBuf,
    session: String,
    bytes_received: u64,
    declared_size: u64,
}

impl<F: DownloadFs> LibraryChunkReceiver<F> {
    /// Create a receiver storing snapshots under `library_dir`.
    pub fn new(fs: F, library_dir: PathBuf, write_attempts: u32) -> Self {
        Self {
            reassembler: ChunkReassembler::new(fs, write_attempts),
            library_dir,
            session: String::from("default"),
            bytes_received: 0,
            declared_size: 0,
        }
    }

    /// Name the session whose snapshot is being received.
    pub fn set_session(&mut self, session: impl Into<String>) { self.session = session.into(); }

    /// Location of the verified snapshot for the current session.
    pub fn snapshot_path(&self) -> PathBuf {
        self.library_dir
            .join(format!("{}.{SNAPSHOT_EXTENSION}", self.session))
    }

    fn part_path(&self) -> PathBuf {
        self.library_dir
            .join(format!("{}.{SNAPSHOT_EXTENSION}.part", self.session))
    }

    /// Directory holding snapshots.
    pub fn library_dir(&self) -> &Path { &self.library_dir }

    /// Whether a transfer is in progress.
    pub fn is_receiving(&self) -> bool { self.reassembler.is_active() }

    /// Process one `LIBRARY_CHUNK`.
    pub fn on_chunk(&mut self, chunk: &ResponseLibraryChunk) -> LibraryOutcome {
        if chunk.chunk_number == 1 {
            if let Err(err) = self.start(chunk) {
                return self.fail(err);
            }
        } else if !self.reassembler.is_active() {
            warn!(chunk = chunk.chunk_number, "library chunk without a transfer in progress");
            return LibraryOutcome::Ignored;
        }

        let received = chunk.data.len() as u64;
        self.bytes_received += received;
        metrics::add_download_bytes(received);

        match self.reassembler.push(
            chunk.chunk_number,
            chunk.chunk_count,
            &chunk.data,
            chunk.file_hash.as_deref(),
        ) {
            Ok(ChunkOutcome::Pending) => LibraryOutcome::Progress(self.progress()),
            Ok(ChunkOutcome::Completed { path }) => {
                let target = self.snapshot_path();
                match self.reassembler.fs().rename(&path, &target) {
                    Ok(()) => {
                        info!(path = %target.display(), bytes = self.bytes_received, "library snapshot ready");
                        LibraryOutcome::Ready(target)
                    }
                    Err(source) => {
                        if let Err(err) = self.reassembler.fs().remove(&path) {
                            warn!(path = %path.display(), error = %err, "failed to delete partial file");
                        }
                        self.fail(ReassemblyError::Write {
                            filename: target.display().to_string(),
                            source,
                        })
                    }
                }
            }
            Err(err) => self.fail(err),
        }
    }

    /// Abandon any transfer in progress.
    pub fn reset(&mut self) {
        self.reassembler.abandon();
        self.bytes_received = 0;
        self.declared_size = 0;
    }

    fn start(&mut self, chunk: &ResponseLibraryChunk) -> Result<(), ReassemblyError> {
        ensure_directory(self.reassembler.fs(), &self.library_dir)?;
        self.bytes_received = 0;
        self.declared_size = chunk.size;
        let part = self.part_path();
        let filename = part.display().to_string();
        info!(size = chunk.size, chunks = chunk.chunk_count, "receiving library snapshot");
        self.reassembler.begin(part, filename, chunk.chunk_count)
    }

    fn progress(&self) -> f64 {
        if self.declared_size == 0 {
            return 0.0;
        }
        #[expect(clippy::cast_precision_loss, reason = "progress is approximate")]
        let fraction = self.bytes_received as f64 / self.declared_size as f64;
        fraction.min(1.0)
    }

    fn fail(&mut self, err: ReassemblyError) -> LibraryOutcome {
        warn!(error = %err, "library download failed");
        metrics::inc_errors(ErrorKind::Download);
        self.reset();
        LibraryOutcome::Failed(err)
    }
}
