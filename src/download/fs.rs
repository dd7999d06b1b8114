//! Filesystem collaborator used by the download subsystem.
//!
//! [`DownloadFs`] is the seam between chunk bookkeeping and the disk.
//! [`LocalFs`] is the production implementation; tests substitute their own
//! to simulate write failures.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::Path,
};

use thiserror::Error;

use super::error::BatchError;

/// Filesystem operations needed to receive files.
pub trait DownloadFs {
    /// Handle returned by [`DownloadFs::open_for_write`].
    type File: Write;

    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Create `path` and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create or truncate `path` for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn open_for_write(&self, path: &Path) -> io::Result<Self::File>;

    /// Delete the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Atomically move `from` to `to`, replacing `to`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// [`DownloadFs`] backed by `std::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl DownloadFs for LocalFs {
    type File = File;

    fn exists(&self, path: &Path) -> bool { path.exists() }

    fn is_dir(&self, path: &Path) -> bool { path.is_dir() }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> { fs::create_dir_all(path) }

    fn open_for_write(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
    }

    fn remove(&self, path: &Path) -> io::Result<()> { fs::remove_file(path) }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> { fs::rename(from, to) }
}

/// Make sure `path` is a usable directory, creating it when missing.
///
/// # Errors
///
/// Returns [`BatchError::NotADirectory`] if something other than a directory
/// occupies `path`, or [`BatchError::CreateDir`] if it cannot be created.
pub fn ensure_directory<F: DownloadFs>(fs: &F, path: &Path) -> Result<(), BatchError> {
    if fs.exists(path) {
        if fs.is_dir(path) {
            return Ok(());
        }
        return Err(BatchError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    fs.create_dir_all(path).map_err(|source| BatchError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Why [`write_with_retry`] gave up.
#[derive(Debug, Error)]
pub enum WriteFailure {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("retry limit of {0} reached")]
    RetryLimit(u32),
}

/// Write all of `data`, reissuing the remaining bytes after short writes.
///
/// At most `attempts` write calls are made. Interrupted writes count as an
/// attempt.
///
/// # Errors
///
/// Returns [`WriteFailure::Io`] on a hard write error or
/// [`WriteFailure::RetryLimit`] when the budget runs out with bytes left.
pub fn write_with_retry<W: Write>(
    writer: &mut W,
    data: &[u8],
    attempts: u32,
) -> Result<(), WriteFailure> {
    let mut written = 0;
    let mut used = 0;
    while written < data.len() {
        if used == attempts {
            return Err(WriteFailure::RetryLimit(attempts));
        }
        used += 1;
        match writer.write(&data[written..]) {
            Ok(n) => written += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
