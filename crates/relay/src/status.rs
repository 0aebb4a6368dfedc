use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::warn;

use driveferry_chat::{ChatId, MessageId, Messenger};
use driveferry_transfer::{estimate, human_size, Progress, Throttle};

use crate::types::{TransferEvent, TransferPhase, TransferReceipt};
use crate::RelayError;

/// First status line, sent when the transfer task starts working.
pub(crate) const DOWNLOAD_STARTED: &str = "Downloading...";

/// Prompt rendered while the transfer waits for the rename reply.
pub(crate) const RENAME_PROMPT: &str =
    "Reply with a new file name (without extension), or no to keep the original.";

/// Owns a transfer's status message, rendering events into in-place edits.
///
/// Phase changes always render and reset the throttle; byte progress is
/// rate-limited. Edit failures are logged and skipped so a flaky status
/// line never aborts a transfer.
pub(crate) struct StatusReporter {
    messenger: Arc<dyn Messenger>,
    chat: ChatId,
    message: MessageId,
    interval: Duration,
    throttle: Throttle,
    phase_started: Instant,
}

impl StatusReporter {
    pub(crate) fn new(
        messenger: Arc<dyn Messenger>,
        chat: ChatId,
        message: MessageId,
        interval: Duration,
    ) -> Self {
        Self {
            messenger,
            chat,
            message,
            interval,
            throttle: Throttle::new(interval),
            phase_started: Instant::now(),
        }
    }

    /// Consumes events until the sender side closes.
    pub(crate) async fn run(mut self, mut events: mpsc::Receiver<TransferEvent>) {
        while let Some(event) = events.recv().await {
            let text = match event {
                TransferEvent::Phase(phase) => {
                    self.phase_started = Instant::now();
                    self.throttle = Throttle::new(self.interval);
                    match phase_line(phase) {
                        Some(line) => line.to_string(),
                        None => continue,
                    }
                }
                TransferEvent::DownloadProgress { done, total } => {
                    if !self.throttle.ready() {
                        continue;
                    }
                    progress_line("Downloading", self.phase_started, done, total)
                }
                TransferEvent::UploadProgress { done, total } => {
                    if !self.throttle.ready() {
                        continue;
                    }
                    progress_line("Uploading", self.phase_started, done, total)
                }
            };

            if let Err(err) = self
                .messenger
                .edit_message(self.chat, self.message, &text)
                .await
            {
                warn!(%err, "status edit failed");
            }
        }
    }
}

/// Static status line for a phase, if it has one.
///
/// Terminal phases return `None`: their lines carry per-transfer data and
/// are written by the transfer task after the reporter drains.
fn phase_line(phase: TransferPhase) -> Option<&'static str> {
    match phase {
        TransferPhase::Downloading => Some(DOWNLOAD_STARTED),
        TransferPhase::AwaitingRename => Some(RENAME_PROMPT),
        TransferPhase::Uploading => Some("Uploading to Google Drive..."),
        TransferPhase::Finalizing => Some("Finalizing..."),
        TransferPhase::Authenticating | TransferPhase::Done | TransferPhase::Aborted => None,
    }
}

/// One progress line: percentage and ETA when the total is known, a running
/// byte count otherwise.
fn progress_line(verb: &str, started: Instant, done: u64, total: u64) -> String {
    let Progress { percent, eta } = estimate(started, done, total);
    match percent {
        Some(percent) => {
            let eta = match eta {
                Some(eta) => format!("{}s", eta.as_secs()),
                None => "calculating...".to_string(),
            };
            format!("{verb}: {percent}% | ETA: {eta}")
        }
        None => format!("{verb}: {} so far", human_size(done)),
    }
}

/// Terminal line for a successful transfer.
pub(crate) fn success_line(receipt: &TransferReceipt) -> String {
    format!(
        "Uploaded {} ({})\n{}\nTook {:.2}s | Uploads so far: {}",
        receipt.file_name,
        human_size(receipt.bytes),
        receipt.link,
        receipt.elapsed.as_secs_f64(),
        receipt.upload_count,
    )
}

/// Terminal line naming the specific failure.
pub(crate) fn failure_line(err: &RelayError) -> String {
    match err {
        RelayError::Fetch(err) => format!("Download failed: {err}"),
        RelayError::RenameTimeout => "No rename reply received; transfer aborted.".to_string(),
        RelayError::Folder(err) => format!("Could not prepare the destination folder: {err}"),
        RelayError::Upload(err) => format!("Upload failed: {err}"),
        RelayError::Cancelled => "Transfer cancelled.".to_string(),
        err => format!("Transfer failed: {err}"),
    }
}
