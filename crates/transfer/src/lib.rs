//! Local side of a relay transfer: staged temp files, chunked file reads,
//! progress estimation, and file-name arithmetic.

mod chunked;
mod format;
mod names;
mod progress;
mod staged;

pub use chunked::{Chunk, ChunkReader};
pub use format::human_size;
pub use names::{apply_rename, is_keep_sentinel, split_extension};
pub use progress::{Progress, Throttle, estimate};
pub use staged::StagedFile;

/// Default read chunk size: 1 MiB.
///
/// Each chunk is fully written out before the next is requested, bounding
/// peak memory to one chunk regardless of file size.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
