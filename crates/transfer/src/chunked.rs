use std::io::SeekFrom;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// One contiguous slice of a staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Byte offset of the first byte within the file.
    pub offset: u64,
    pub data: Vec<u8>,
}

impl Chunk {
    /// Offset one past the last byte of this chunk.
    pub fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Reads a file in fixed-size chunks for sequential upload.
pub struct ChunkReader {
    file: File,
    chunk_size: usize,
    offset: u64,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let file = File::open(path).await?;
        let file_size = file.metadata().await?.len();
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Ok(Self {
            file,
            chunk_size,
            offset: 0,
            file_size,
        })
    }

    /// Seeks to the given byte offset.
    ///
    /// Used to realign with the receiver when its acknowledged offset
    /// disagrees with the local position.
    pub async fn seek_to(&mut self, offset: u64) -> Result<(), TransferError> {
        self.file.seek(SeekFrom::Start(offset)).await?;
        self.offset = offset;
        Ok(())
    }

    /// Reads the next chunk. Returns `None` at EOF.
    ///
    /// Every chunk except the last is exactly `chunk_size` bytes.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        let remaining = self.file_size.saturating_sub(self.offset);
        if remaining == 0 {
            return Ok(None);
        }

        let read_size = std::cmp::min(remaining as usize, self.chunk_size);
        let mut buf = vec![0u8; read_size];
        let mut filled = 0;
        while filled < read_size {
            let n = self.file.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);

        let chunk = Chunk {
            offset: self.offset,
            data: buf,
        };
        self.offset += filled as u64;
        Ok(Some(chunk))
    }

    /// Current byte offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Total file size in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Bytes remaining to read.
    pub fn remaining(&self) -> u64 {
        self.file_size.saturating_sub(self.offset)
    }
}
