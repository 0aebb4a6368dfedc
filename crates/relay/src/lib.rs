//! Transfer orchestration: one pipeline instance per qualifying inbound
//! message, from credential lookup to the shareable link.
//!
//! # Pipeline
//!
//! 1. **Authenticate** — look up the requester's stored credential
//! 2. **Download** — stage the source locally, reporting progress
//! 3. **Rename** — one prompt/reply round-trip for an optional new name
//! 4. **Upload** — resumable chunked upload into the user's folder
//! 5. **Finalize** — grant link access, reply with the share link
//!
//! The front-end feeds every inbound message to [`Relay::handle_message`];
//! everything past dispatch happens inside the spawned transfer task, which
//! narrates itself by editing a single status message in place.

mod config;
mod destination;
mod relay;
mod rename;
mod status;
#[cfg(test)]
mod testutil;
mod types;
mod uploader;

pub use config::RelayConfig;
pub use destination::DestinationResolver;
pub use relay::{Dispatch, Relay};
pub use types::{TransferEvent, TransferPhase, TransferReceipt, TransferRequest};

use driveferry_chat::ChatError;
use driveferry_fetch::FetchError;
use driveferry_store::StoreError;
use driveferry_transfer::TransferError;

/// Errors that abort a transfer.
///
/// Every abort path releases the staged file, leaves the status message
/// naming the failure, and leaves the upload counter untouched.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// No usable stored credential: an instruction to the user, not a fault.
    #[error("not authenticated with the remote store")]
    Unauthenticated,

    #[error("source fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("rename prompt timed out")]
    RenameTimeout,

    #[error("folder resolution failed: {0}")]
    Folder(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("chat transport error: {0}")]
    Chat(#[from] ChatError),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("transfer cancelled")]
    Cancelled,
}
