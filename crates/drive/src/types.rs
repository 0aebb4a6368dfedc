use serde::{Deserialize, Deserializer};

/// Minimal file resource returned by create and terminal-upload responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CreatedFile {
    pub id: String,
}

/// Wrapper for `about?fields=storageQuota`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AboutResponse {
    pub storage_quota: StorageQuota,
}

/// Account storage quota in bytes.
///
/// The API serializes both counters as decimal strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageQuota {
    #[serde(deserialize_with = "string_u64")]
    pub limit: u64,
    #[serde(deserialize_with = "string_u64")]
    pub usage: u64,
}

impl StorageQuota {
    /// Bytes still available.
    pub fn free(&self) -> u64 {
        self.limit.saturating_sub(self.usage)
    }
}

fn string_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
