use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use driveferry_drive::{align_chunk_size, ChunkStatus, DriveClient};
use driveferry_transfer::{ChunkReader, StagedFile};

use crate::types::TransferEvent;
use crate::RelayError;

/// Drives a staged file through the resumable upload protocol.
///
/// Opens a session, sends chunks in order, realigns with the server's
/// confirmed offset whenever they disagree, and returns the terminal file
/// id. Reaching EOF without a terminal response is a protocol violation.
pub(crate) async fn upload_staged(
    drive: &DriveClient,
    staged: &StagedFile,
    folder_id: &str,
    final_name: &str,
    chunk_size: usize,
    cancel: &CancellationToken,
    events: &mpsc::Sender<TransferEvent>,
) -> Result<String, RelayError> {
    let chunk_size = align_chunk_size(chunk_size);
    let total = staged.size();

    let session = drive
        .begin_resumable_upload(final_name, folder_id)
        .await
        .map_err(|err| RelayError::Upload(err.to_string()))?;
    debug!(name = %final_name, total, chunk_size, "upload session open");

    let mut reader = ChunkReader::open(staged.path(), chunk_size).await?;
    while let Some(chunk) = reader.next_chunk().await? {
        if cancel.is_cancelled() {
            return Err(RelayError::Cancelled);
        }

        let status = drive
            .upload_chunk(&session, chunk.offset, &chunk.data, total)
            .await
            .map_err(|err| RelayError::Upload(err.to_string()))?;

        match status {
            ChunkStatus::Incomplete { received } => {
                let _ = events.try_send(TransferEvent::UploadProgress {
                    done: received,
                    total,
                });
                if received != reader.offset() {
                    // The server's confirmed offset wins.
                    debug!(confirmed = received, local = reader.offset(), "realigning");
                    reader.seek_to(received).await?;
                }
            }
            ChunkStatus::Complete { file_id } => {
                let _ = events.try_send(TransferEvent::UploadProgress { done: total, total });
                return Ok(file_id);
            }
        }
    }

    Err(RelayError::Upload(
        "file ended without a terminal response".into(),
    ))
}
