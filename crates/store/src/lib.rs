//! Injected state stores for the relay: per-user credentials, destination
//! folder mappings, and upload counters.
//!
//! The orchestrator receives these as explicit components instead of
//! reaching for process-wide state, so tests and teardown can address them
//! directly. Two backends ship here: in-memory maps and a single JSON
//! state file.

mod counters;
mod json;
mod memory;
mod token;
mod traits;

pub use counters::UploadCounters;
pub use json::JsonStateStore;
pub use memory::{MemoryCredentialStore, MemoryFolderStore};
pub use token::Credential;
pub use traits::{CredentialStore, FolderStore, StoreFuture};

/// Errors from the state stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored state failed strict deserialization. Malformed payloads are
    /// reported, never evaluated or silently dropped.
    #[error("corrupt stored state ({context}): {source}")]
    Corrupt {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
