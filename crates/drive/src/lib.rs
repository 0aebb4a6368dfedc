//! Google Drive v3 REST client: folders, resumable uploads, permissions,
//! share links, and storage quota.
//!
//! The surface is exactly what the relay pipeline calls, authenticated with
//! a per-user Bearer token. Uploads follow the resumable protocol: open a
//! session, `PUT` sequential `Content-Range` chunks, treat 308 as an
//! acknowledgement carrying the confirmed offset, and read the created
//! file's id from the terminal response.

mod client;
mod types;

pub use client::{share_link, ChunkStatus, DriveClient, UploadSession};
pub use types::StorageQuota;

/// Default API host.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
/// Default upload host for resumable sessions.
const UPLOAD_API_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Resumable uploads require every non-final chunk to be a multiple of
/// 256 KiB.
pub const UPLOAD_CHUNK_GRANULARITY: usize = 256 * 1024;

/// API hosts used by [`DriveClient`], overridable for tests and
/// API-compatible proxies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: String,
    pub upload_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: UPLOAD_API_BASE.to_string(),
        }
    }
}

/// Rounds a requested chunk size down to the protocol granularity, never
/// below one granule.
pub fn align_chunk_size(requested: usize) -> usize {
    let aligned = requested - (requested % UPLOAD_CHUNK_GRANULARITY);
    aligned.max(UPLOAD_CHUNK_GRANULARITY)
}

/// Errors from the Drive API client.
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("access token is not a valid header value")]
    InvalidToken,

    #[error("protocol error: {0}")]
    Protocol(String),
}
