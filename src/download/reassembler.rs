//! Single-file chunk receiver.
//!
//! [`ChunkReassembler`] writes the numbered chunks of one file to disk in
//! order and verifies the server-declared SHA-1 on the last one. The digest
//! is fed as chunks are written, so sealing a file never reads it back. At most one
//! file is open at a time; any partially written file is deleted when it is
//! abandoned, when a new file begins, or when the reassembler is dropped.

use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};
use tracing::{debug, warn};

use super::{
    error::ReassemblyError,
    fs::{DownloadFs, LocalFs, WriteFailure, write_with_retry},
};

/// Result of feeding a data chunk to the reassembler.
#[derive(Debug, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// More chunks are expected.
    Pending,
    /// The last chunk arrived and the checksum matched.
    Completed { path: PathBuf },
}

struct ActiveFile<H> {
    path: PathBuf,
    filename: String,
    handle: H,
    digest: Sha1,
    next_chunk: u32,
    chunk_count: u32,
}

/// Receives the chunks of one file at a time.
pub struct ChunkReassembler<F: DownloadFs = LocalFs> {
    fs: F,
    write_attempts: u32,
    active: Option<ActiveFile<F::File>>,
}

impl<F: DownloadFs> ChunkReassembler<F> {
    /// Create a reassembler making at most `write_attempts` write calls per chunk.
    pub fn new(fs: F, write_attempts: u32) -> Self {
        Self {
            fs,
            write_attempts: write_attempts.max(1),
            active: None,
        }
    }

    /// Filesystem collaborator backing this reassembler.
    pub fn fs(&self) -> &F { &self.fs }

    /// Whether a file is currently open.
    pub fn is_active(&self) -> bool { self.active.is_some() }

    /// Destination of the open file, if any.
    pub fn active_path(&self) -> Option<&Path> { self.active.as_ref().map(|file| file.path.as_path()) }

    /// Open `path` for a transfer of `chunk_count` chunks.
    ///
    /// Any file still open is abandoned first.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::Open`] if the destination cannot be opened.
    pub fn begin(
        &mut self,
        path: PathBuf,
        filename: impl Into<String>,
        chunk_count: u32,
    ) -> Result<(), ReassemblyError> {
        let filename = filename.into();
        if let Some(previous) = self.abandon() {
            warn!(path = %previous.display(), "abandoned unfinished file before starting a new one");
        }
        let handle = self
            .fs
            .open_for_write(&path)
            .map_err(|source| ReassemblyError::Open {
                filename: filename.clone(),
                source,
            })?;
        debug!(path = %path.display(), chunk_count, "receiving file");
        self.active = Some(ActiveFile {
            path,
            filename,
            handle,
            digest: Sha1::new(),
            next_chunk: 1,
            chunk_count,
        });
        Ok(())
    }

    /// Append one data chunk to the open file.
    ///
    /// `chunk_count` is taken from the chunk itself so that the final chunk is
    /// recognised even if the offer announced a different count. On any error
    /// the partial file has already been deleted.
    ///
    /// # Errors
    ///
    /// Returns a [`ReassemblyError`] describing why the file was abandoned.
    pub fn push(
        &mut self,
        chunk_number: u32,
        chunk_count: u32,
        data: &[u8],
        file_hash: Option<&str>,
    ) -> Result<ChunkOutcome, ReassemblyError> {
        let Some(file) = self.active.as_mut() else {
            return Err(ReassemblyError::NoActiveFile { chunk_number });
        };

        if chunk_number != file.next_chunk {
            let err = ReassemblyError::OutOfOrder {
                filename: file.filename.clone(),
                expected: file.next_chunk,
                actual: chunk_number,
            };
            self.abandon();
            return Err(err);
        }

        if let Err(failure) = write_with_retry(&mut file.handle, data, self.write_attempts) {
            let filename = file.filename.clone();
            self.abandon();
            return Err(match failure {
                WriteFailure::Io(source) => ReassemblyError::Write { filename, source },
                WriteFailure::RetryLimit(attempts) => ReassemblyError::RetryLimit { filename, attempts },
            });
        }

        file.digest.update(data);
        file.chunk_count = chunk_count;
        if chunk_number < chunk_count {
            file.next_chunk += 1;
            return Ok(ChunkOutcome::Pending);
        }
        self.seal(file_hash)
    }

    /// Delete the open file, returning its path.
    ///
    /// Returns `None` if no file was open, so repeated calls are harmless.
    pub fn abandon(&mut self) -> Option<PathBuf> {
        let file = self.active.take()?;
        drop(file.handle);
        if let Err(err) = self.fs.remove(&file.path) {
            warn!(path = %file.path.display(), error = %err, "failed to delete partial file");
        }
        Some(file.path)
    }

    /// Abandon the open file and describe how far it got.
    pub fn abandon_incomplete(&mut self) -> Option<ReassemblyError> {
        let file = self.active.as_ref()?;
        let err = ReassemblyError::Incomplete {
            filename: file.filename.clone(),
            received: file.next_chunk.saturating_sub(1),
            count: file.chunk_count,
        };
        self.abandon();
        Some(err)
    }

    fn seal(&mut self, file_hash: Option<&str>) -> Result<ChunkOutcome, ReassemblyError> {
        let Some(mut file) = self.active.take() else {
            return Err(ReassemblyError::NoActiveFile { chunk_number: 0 });
        };

        let verdict = match file_hash {
            None => Err(ReassemblyError::MissingChecksum {
                filename: file.filename.clone(),
            }),
            Some(expected) => {
                let actual = hex::encode(file.digest.finalize_reset());
                if actual.eq_ignore_ascii_case(expected) {
                    Ok(())
                } else {
                    Err(ReassemblyError::ChecksumMismatch {
                        filename: file.filename.clone(),
                        expected: expected.to_owned(),
                        actual,
                    })
                }
            }
        };

        match verdict {
            Ok(()) => {
                drop(file.handle);
                debug!(path = %file.path.display(), "file verified");
                Ok(ChunkOutcome::Completed { path: file.path })
            }
            Err(err) => {
                self.active = Some(file);
                self.abandon();
                Err(err)
            }
        }
    }
}

impl<F: DownloadFs> Drop for ChunkReassembler<F> {
    fn drop(&mut self) { self.abandon(); }
}

#[cfg(test)]
#[path = "reassembler_tests.rs"]
mod tests;
