//! Chunked file transfers: song batches and library snapshots.
//!
//! Both kinds share [`ChunkReassembler`], which writes numbered chunks to
//! disk and verifies the final SHA-1. [`DownloadCoordinator`] adds batch
//! bookkeeping for songs; [`LibraryChunkReceiver`] handles the single-file
//! library snapshot.
//!
//! File writes are synchronous and happen on the connection task at chunk
//! boundaries. Chunks are bounded by the envelope size, so each write is
//! short.

pub mod coordinator;
pub mod error;
pub mod fs;
pub mod library;
pub mod reassembler;

pub use coordinator::{CancelHandle, ChunkReport, DownloadCoordinator, DownloadSummary};
pub use error::{BatchError, ReassemblyError};
pub use fs::{DownloadFs, LocalFs};
pub use library::{LibraryChunkReceiver, LibraryOutcome};
pub use reassembler::{ChunkOutcome, ChunkReassembler};
