use std::time::{Duration, Instant};

use driveferry_chat::{ChatId, UserId};
use driveferry_fetch::Source;

/// One in-flight relay operation, owned by its transfer task.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub user: UserId,
    pub chat: ChatId,
    pub source: Source,
    /// When the triggering message was dispatched.
    pub started: Instant,
}

/// Lifecycle of a transfer, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Authenticating,
    Downloading,
    AwaitingRename,
    Uploading,
    Finalizing,
    Done,
    Aborted,
}

/// Events a transfer task emits while running.
///
/// Consumed by the status reporter, which owns the single status message.
/// Progress events are lossy by design; phase events are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEvent {
    Phase(TransferPhase),
    DownloadProgress { done: u64, total: u64 },
    UploadProgress { done: u64, total: u64 },
}

/// Summary of one completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Final name after the rename round-trip.
    pub file_name: String,
    /// Id assigned by the remote store.
    pub file_id: String,
    /// Anyone-with-the-link view URL.
    pub link: String,
    /// Bytes moved.
    pub bytes: u64,
    /// Wall time from trigger to link.
    pub elapsed: Duration,
    /// The requester's lifetime upload count, including this one.
    pub upload_count: u64,
}
