//! Source classification and staging.
//!
//! An inbound message either references a platform attachment or is a bare
//! URL; [`Source`] decides which, and [`Fetcher`] streams the bytes into a
//! temp file that lives exactly as long as the transfer needs it.

mod fetcher;
mod source;

pub use fetcher::Fetcher;
pub use source::Source;

/// Progress callback: cumulative bytes done against the total (0 when the
/// total is unknown).
pub type ProgressFn<'a> = Box<dyn Fn(u64, u64) + Send + 'a>;

/// Errors while staging a source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source produced no bytes")]
    EmptySource,

    #[error("attachment download failed: {0}")]
    Download(#[from] driveferry_chat::ChatError),
}
