use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use driveferry_chat::{
    InboundMessage, MediaDownloader, MessageBody, Messenger, ReplyWaiter,
};
use driveferry_drive::{share_link, DriveClient};
use driveferry_fetch::{Fetcher, ProgressFn, Source};
use driveferry_store::{CredentialStore, FolderStore, UploadCounters};
use driveferry_transfer::StagedFile;

use crate::destination::DestinationResolver;
use crate::status::{self, StatusReporter};
use crate::types::{TransferEvent, TransferPhase, TransferReceipt, TransferRequest};
use crate::{rename, uploader, RelayConfig, RelayError};

/// Reply sent when the requester has no usable stored credential.
const LOGIN_PROMPT: &str =
    "Not connected to Google Drive. Authenticate first, then send the file again.";

/// How an inbound message was dispatched.
pub enum Dispatch {
    /// Completed a pending rename wait; not a new transfer.
    Reply,
    /// Not a transfer trigger.
    Ignored,
    /// Spawned a transfer task.
    Transfer(JoinHandle<Result<TransferReceipt, RelayError>>),
}

/// The transfer orchestrator.
///
/// One `Relay` serves every user; each qualifying message spawns an
/// independent transfer task, so concurrent transfers interleave freely.
/// Shared state is limited to the injected stores, the upload counters,
/// and the per-user folder creation locks.
pub struct Relay {
    messenger: Arc<dyn Messenger>,
    downloader: Arc<dyn MediaDownloader>,
    credentials: Arc<dyn CredentialStore>,
    counters: Arc<UploadCounters>,
    replies: Arc<ReplyWaiter>,
    destination: Arc<DestinationResolver>,
    fetcher: Arc<Fetcher>,
    config: Arc<RelayConfig>,
    cancel: CancellationToken,
}

impl Relay {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        downloader: Arc<dyn MediaDownloader>,
        credentials: Arc<dyn CredentialStore>,
        folders: Arc<dyn FolderStore>,
        config: RelayConfig,
    ) -> Self {
        let destination = Arc::new(DestinationResolver::new(
            folders,
            config.folder_prefix.clone(),
        ));
        let fetcher = match &config.staging_dir {
            Some(dir) => Fetcher::new().with_staging_dir(dir.clone()),
            None => Fetcher::new(),
        };
        Self {
            messenger,
            downloader,
            credentials,
            counters: Arc::new(UploadCounters::new()),
            replies: Arc::new(ReplyWaiter::new()),
            destination,
            fetcher: Arc::new(fetcher),
            config: Arc::new(config),
            cancel: CancellationToken::new(),
        }
    }

    /// Per-user lifetime upload counters.
    pub fn counters(&self) -> Arc<UploadCounters> {
        Arc::clone(&self.counters)
    }

    /// Token that aborts every in-flight transfer when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Routes one inbound message.
    ///
    /// Text is offered to pending rename waits first; only unconsumed
    /// messages are classified as transfer triggers.
    pub async fn handle_message(&self, message: InboundMessage) -> Dispatch {
        if let MessageBody::Text(text) = &message.body {
            if self.replies.offer(message.user, message.chat, text).await {
                return Dispatch::Reply;
            }
        }

        let Some(source) = Source::from_body(&message.body) else {
            return Dispatch::Ignored;
        };

        let request = TransferRequest {
            user: message.user,
            chat: message.chat,
            source,
            started: Instant::now(),
        };
        let task = TransferTask {
            messenger: Arc::clone(&self.messenger),
            downloader: Arc::clone(&self.downloader),
            credentials: Arc::clone(&self.credentials),
            counters: Arc::clone(&self.counters),
            replies: Arc::clone(&self.replies),
            destination: Arc::clone(&self.destination),
            fetcher: Arc::clone(&self.fetcher),
            config: Arc::clone(&self.config),
            cancel: self.cancel.clone(),
            request,
        };

        let span = info_span!("transfer", id = %Uuid::new_v4(), user = %message.user);
        Dispatch::Transfer(tokio::spawn(task.run().instrument(span)))
    }
}

/// One transfer, end to end. Owns its request for the whole lifetime.
struct TransferTask {
    messenger: Arc<dyn Messenger>,
    downloader: Arc<dyn MediaDownloader>,
    credentials: Arc<dyn CredentialStore>,
    counters: Arc<UploadCounters>,
    replies: Arc<ReplyWaiter>,
    destination: Arc<DestinationResolver>,
    fetcher: Arc<Fetcher>,
    config: Arc<RelayConfig>,
    cancel: CancellationToken,
    request: TransferRequest,
}

impl TransferTask {
    async fn run(self) -> Result<TransferReceipt, RelayError> {
        let user = self.request.user;
        let chat = self.request.chat;

        // A missing or unusable credential is an instruction to the user,
        // not a fault; nothing is staged and no status message exists yet.
        let Some(credential) = self.credentials.get(user).await? else {
            info!("transfer refused: not authenticated");
            self.messenger.send_message(chat, LOGIN_PROMPT).await?;
            return Err(RelayError::Unauthenticated);
        };
        let Ok(drive) =
            DriveClient::with_endpoints(&credential.access_token, self.config.drive.clone())
        else {
            warn!("stored credential is not a usable bearer token");
            self.messenger.send_message(chat, LOGIN_PROMPT).await?;
            return Err(RelayError::Unauthenticated);
        };

        // The status message lives for the rest of the pipeline. Its
        // reporter drains before the terminal line is written, so the
        // terminal edit always lands last.
        let status_id = self
            .messenger
            .send_message(chat, status::DOWNLOAD_STARTED)
            .await?;
        let (events_tx, events_rx) = mpsc::channel(256);
        let reporter = StatusReporter::new(
            Arc::clone(&self.messenger),
            chat,
            status_id,
            self.config.status_interval,
        );
        let reporter_task = tokio::spawn(reporter.run(events_rx));

        let result = self.run_phases(&drive, &events_tx).await;

        drop(events_tx);
        let _ = reporter_task.await;

        let line = match &result {
            Ok(receipt) => status::success_line(receipt),
            Err(err) => status::failure_line(err),
        };
        if let Err(err) = self.messenger.edit_message(chat, status_id, &line).await {
            warn!(%err, "terminal status edit failed");
        }

        match &result {
            Ok(receipt) => {
                info!(file = %receipt.file_name, bytes = receipt.bytes, "transfer complete")
            }
            Err(err) => warn!(%err, "transfer aborted"),
        }
        result
    }

    async fn run_phases(
        &self,
        drive: &DriveClient,
        events: &mpsc::Sender<TransferEvent>,
    ) -> Result<TransferReceipt, RelayError> {
        let user = self.request.user;
        let chat = self.request.chat;

        // Download. Progress is forwarded lossily; dropping the fetch
        // future on cancellation also drops its partial temp file.
        let progress = events.clone();
        let on_progress: ProgressFn<'_> = Box::new(move |done, total| {
            let _ = progress.try_send(TransferEvent::DownloadProgress { done, total });
        });
        let staged = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(RelayError::Cancelled),
            result = self
                .fetcher
                .fetch(&self.request.source, self.downloader.as_ref(), on_progress) => result?,
        };
        info!(name = %staged.name(), size = staged.size(), "download complete");

        // Rename round-trip.
        let _ = events
            .send(TransferEvent::Phase(TransferPhase::AwaitingRename))
            .await;
        let final_name = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(RelayError::Cancelled),
            result = rename::negotiate(
                &self.replies,
                user,
                chat,
                staged.name(),
                self.config.rename_timeout,
            ) => result?,
        };

        // Upload into the user's folder.
        let _ = events
            .send(TransferEvent::Phase(TransferPhase::Uploading))
            .await;
        let folder_id = self.destination.ensure_folder(user, drive).await?;
        let file_id = uploader::upload_staged(
            drive,
            &staged,
            &folder_id,
            &final_name,
            self.config.upload_chunk_size,
            &self.cancel,
            events,
        )
        .await?;

        // Finalize: link access, staging cleanup, counter.
        let _ = events
            .send(TransferEvent::Phase(TransferPhase::Finalizing))
            .await;
        let bytes = staged.size();
        let link = self.finalize(drive, &file_id, staged).await?;
        let upload_count = self.counters.increment(user);

        Ok(TransferReceipt {
            file_name: final_name,
            file_id,
            link,
            bytes,
            elapsed: self.request.started.elapsed(),
            upload_count,
        })
    }

    /// Grants link access and releases the staged file.
    ///
    /// The staged file is discarded before the grant result is inspected:
    /// staging space is reclaimed even when the grant fails, and a failed
    /// grant aborts the transfer without counting it.
    async fn finalize(
        &self,
        drive: &DriveClient,
        file_id: &str,
        staged: StagedFile,
    ) -> Result<String, RelayError> {
        let grant = drive.grant_public_read(file_id).await;
        staged.discard();
        grant.map_err(|err| RelayError::Upload(format!("permission grant failed: {err}")))?;
        Ok(share_link(file_id))
    }
}
