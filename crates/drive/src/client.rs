use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, LOCATION, RANGE};
use reqwest::StatusCode;
use serde_json::json;
use tracing::debug;

use crate::types::{AboutResponse, CreatedFile};
use crate::{DriveError, Endpoints, StorageQuota};

/// MIME type marking a Drive entry as a folder.
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Authenticated client for the Drive v3 REST API.
///
/// Carries one user's Bearer token as a default header; every transfer gets
/// its own client built from the requester's stored credential.
#[derive(Debug)]
pub struct DriveClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

/// Handle to an open resumable upload, wrapping the session URI.
#[derive(Debug, Clone)]
pub struct UploadSession {
    uri: String,
}

/// Server acknowledgement for one uploaded chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkStatus {
    /// More bytes expected; `received` is the count confirmed so far.
    Incomplete { received: u64 },
    /// Upload finished and the file exists under `file_id`.
    Complete { file_id: String },
}

impl DriveClient {
    pub fn new(access_token: &str) -> Result<Self, DriveError> {
        Self::with_endpoints(access_token, Endpoints::default())
    }

    /// Builds a client against custom API hosts.
    pub fn with_endpoints(access_token: &str, endpoints: Endpoints) -> Result<Self, DriveError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}"))
                .map_err(|_| DriveError::InvalidToken)?,
        );

        // 308 acknowledgements from the resumable protocol must reach the
        // caller, not the redirect machinery.
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { http, endpoints })
    }

    /// Creates a folder and returns its id.
    pub async fn create_folder(&self, name: &str) -> Result<String, DriveError> {
        let url = format!("{}/files?fields=id", self.endpoints.api_base);
        let body = json!({ "name": name, "mimeType": FOLDER_MIME_TYPE });
        let response = self.http.post(&url).json(&body).send().await?;
        let response = check_status(response).await?;
        let created: CreatedFile = response.json().await?;
        debug!(folder = %name, id = %created.id, "folder created");
        Ok(created.id)
    }

    /// Opens a resumable upload session for `name` under `parent_id`.
    pub async fn begin_resumable_upload(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<UploadSession, DriveError> {
        let url = format!(
            "{}/files?uploadType=resumable&fields=id",
            self.endpoints.upload_base
        );
        let body = json!({ "name": name, "parents": [parent_id] });
        let response = self.http.post(&url).json(&body).send().await?;
        let response = check_status(response).await?;
        let uri = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                DriveError::Protocol("upload session response carried no Location header".into())
            })?
            .to_string();
        debug!(file = %name, "upload session open");
        Ok(UploadSession { uri })
    }

    /// Sends one chunk of a resumable upload.
    ///
    /// `offset` is the position of the chunk's first byte and `total` the
    /// full file size. A 308 means the server wants more; its `Range` header
    /// confirms how many bytes it holds (no header means none). A 2xx is
    /// terminal and carries the created file's id.
    pub async fn upload_chunk(
        &self,
        session: &UploadSession,
        offset: u64,
        data: &[u8],
        total: u64,
    ) -> Result<ChunkStatus, DriveError> {
        let last = offset + data.len() as u64 - 1;
        let content_range = format!("bytes {offset}-{last}/{total}");
        let response = self
            .http
            .put(&session.uri)
            .header(CONTENT_RANGE, content_range)
            .body(data.to_vec())
            .send()
            .await?;

        if response.status() == StatusCode::PERMANENT_REDIRECT {
            let received = match response.headers().get(RANGE) {
                Some(range) => confirmed_bytes(range.to_str().unwrap_or_default())?,
                None => 0,
            };
            return Ok(ChunkStatus::Incomplete { received });
        }

        let response = check_status(response).await?;
        let created: CreatedFile = response.json().await?;
        Ok(ChunkStatus::Complete {
            file_id: created.id,
        })
    }

    /// Grants anyone-with-the-link read access to `file_id`.
    pub async fn grant_public_read(&self, file_id: &str) -> Result<(), DriveError> {
        let url = format!("{}/files/{}/permissions", self.endpoints.api_base, file_id);
        let body = json!({ "role": "reader", "type": "anyone" });
        let response = self.http.post(&url).json(&body).send().await?;
        check_status(response).await?;
        debug!(file = %file_id, "public read granted");
        Ok(())
    }

    /// Reads the account's storage quota.
    pub async fn about(&self) -> Result<StorageQuota, DriveError> {
        let url = format!("{}/about?fields=storageQuota", self.endpoints.api_base);
        let response = self.http.get(&url).send().await?;
        let response = check_status(response).await?;
        let about: AboutResponse = response.json().await?;
        Ok(about.storage_quota)
    }
}

/// Anyone-with-the-link view URL for a file id.
pub fn share_link(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{file_id}/view?usp=sharing")
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DriveError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Parses a 308 `Range: bytes=0-N` header into the confirmed byte count.
fn confirmed_bytes(value: &str) -> Result<u64, DriveError> {
    let last = value
        .strip_prefix("bytes=")
        .and_then(|range| range.rsplit('-').next())
        .and_then(|end| end.parse::<u64>().ok())
        .ok_or_else(|| DriveError::Protocol(format!("unparseable Range header: {value}")))?;
    Ok(last + 1)
}
