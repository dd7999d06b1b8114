//! Error types for chunked downloads.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure affecting a single file of a transfer.
///
/// These never abort sibling files; they are collected and reported with the
/// batch summary.
#[derive(Debug, Error)]
pub enum ReassemblyError {
    #[error("skipping file {filename} (already exists)")]
    AlreadyExists { filename: String },

    #[error("skipping file {filename} (not a plain file name)")]
    UnsafeFilename { filename: String },

    #[error("file offer without metadata")]
    MissingMetadata,

    #[error("no download batch announced for file offer")]
    NoBatch,

    #[error("can't write file {filename}: {source}")]
    Open {
        filename: String,
        #[source]
        source: io::Error,
    },

    #[error("error writing file {filename}: {source}")]
    Write {
        filename: String,
        #[source]
        source: io::Error,
    },

    #[error("error writing file {filename} (retry limit of {attempts} reached)")]
    RetryLimit { filename: String, attempts: u32 },

    #[error("error file {filename} (wrong sha1)")]
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },

    #[error("error file {filename} (no sha1 on last chunk)")]
    MissingChecksum { filename: String },

    #[error("error file {filename} (chunk {actual} received, expected {expected})")]
    OutOfOrder {
        filename: String,
        expected: u32,
        actual: u32,
    },

    #[error("error file {filename} (transfer ended after chunk {received} of {count})")]
    Incomplete {
        filename: String,
        received: u32,
        count: u32,
    },

    #[error("chunk {chunk_number} received without an open file")]
    NoActiveFile { chunk_number: u32 },

    #[error("download cancelled from {filename}")]
    Cancelled { filename: String },

    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Precondition failure that stops a whole batch before any file is processed.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{} already exists but is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("error creating download folder {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
