use std::path::PathBuf;
use std::time::Duration;

use driveferry_drive::Endpoints;

/// Tunables for the relay pipeline.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Per-user destination folders are named `{folder_prefix}_{user_id}`.
    pub folder_prefix: String,
    /// How long the rename prompt waits for a reply before aborting.
    pub rename_timeout: Duration,
    /// Minimum interval between progress edits of the status message.
    pub status_interval: Duration,
    /// Upload chunk size; aligned down to the protocol granularity.
    pub upload_chunk_size: usize,
    /// Staging directory for downloads (system temp directory if `None`).
    pub staging_dir: Option<PathBuf>,
    /// Drive API hosts, overridable for tests and proxies.
    pub drive: Endpoints,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            folder_prefix: "DriveFerry".to_string(),
            rename_timeout: Duration::from_secs(120),
            status_interval: Duration::from_millis(500),
            upload_chunk_size: 4 * 1024 * 1024,
            staging_dir: None,
            drive: Endpoints::default(),
        }
    }
}
