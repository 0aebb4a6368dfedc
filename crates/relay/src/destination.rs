use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use driveferry_chat::UserId;
use driveferry_drive::DriveClient;
use driveferry_store::FolderStore;

use crate::RelayError;

/// Ensures each user has exactly one destination folder in the remote store.
///
/// Lookups hit the folder store; a miss creates the folder remotely and
/// upserts the mapping. First-use creation is serialized per user, so
/// concurrent transfers for the same user never create duplicate folders.
pub struct DestinationResolver {
    folders: Arc<dyn FolderStore>,
    prefix: String,
    creating: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl DestinationResolver {
    pub fn new(folders: Arc<dyn FolderStore>, prefix: impl Into<String>) -> Self {
        Self {
            folders,
            prefix: prefix.into(),
            creating: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the user's folder id, creating the folder on first use.
    pub async fn ensure_folder(
        &self,
        user: UserId,
        drive: &DriveClient,
    ) -> Result<String, RelayError> {
        if let Some(id) = self.lookup(user).await? {
            return Ok(id);
        }

        let lock = self.creation_lock(user).await;
        let _guard = lock.lock().await;

        // Re-check: another transfer may have created it while we waited.
        if let Some(id) = self.lookup(user).await? {
            return Ok(id);
        }

        let name = format!("{}_{}", self.prefix, user);
        let id = drive
            .create_folder(&name)
            .await
            .map_err(|err| RelayError::Folder(err.to_string()))?;
        self.folders
            .upsert(user, &id)
            .await
            .map_err(|err| RelayError::Folder(err.to_string()))?;

        info!(%user, folder = %id, "destination folder created");
        Ok(id)
    }

    async fn lookup(&self, user: UserId) -> Result<Option<String>, RelayError> {
        self.folders
            .get(user)
            .await
            .map_err(|err| RelayError::Folder(err.to_string()))
    }

    async fn creation_lock(&self, user: UserId) -> Arc<Mutex<()>> {
        let mut creating = self.creating.lock().await;
        Arc::clone(creating.entry(user).or_default())
    }
}
