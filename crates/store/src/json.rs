use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use driveferry_chat::UserId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::traits::{CredentialStore, FolderStore, StoreFuture};
use crate::{Credential, StoreError};

/// On-disk shape of the state file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    credentials: HashMap<UserId, Credential>,
    #[serde(default)]
    folders: HashMap<UserId, String>,
}

/// Single-file JSON backend for credentials and folder mappings.
///
/// State is cached in memory and written back after every mutation via a
/// temp file and rename, so readers never observe a half-written file. The
/// temp file is created 0600 and the rename keeps the mode; the file holds
/// tokens.
pub struct JsonStateStore {
    path: PathBuf,
    state: RwLock<StateFile>,
}

impl JsonStateStore {
    /// Opens the store at `path`, loading existing state.
    ///
    /// A missing file is an empty store; a file that fails strict parsing
    /// is [`StoreError::Corrupt`].
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let state = load_state(&path)?;
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    fn persist(&self, state: &StateFile) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state)?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %self.path.display(), "persisted state file");
        Ok(())
    }
}

fn load_state(path: &Path) -> Result<StateFile, StoreError> {
    if !path.exists() {
        return Ok(StateFile::default());
    }
    let data = std::fs::read_to_string(path)?;
    let state: StateFile =
        serde_json::from_str(&data).map_err(|source| StoreError::Corrupt {
            context: path.display().to_string(),
            source,
        })?;
    debug!(
        path = %path.display(),
        credentials = state.credentials.len(),
        folders = state.folders.len(),
        "loaded state file"
    );
    Ok(state)
}

impl CredentialStore for JsonStateStore {
    fn get<'a>(&'a self, user: UserId) -> StoreFuture<'a, Option<Credential>> {
        Box::pin(async move { Ok(self.state.read().unwrap().credentials.get(&user).cloned()) })
    }

    fn put<'a>(&'a self, user: UserId, credential: Credential) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.write().unwrap();
            state.credentials.insert(user, credential);
            self.persist(&state)
        })
    }

    fn delete<'a>(&'a self, user: UserId) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.write().unwrap();
            state.credentials.remove(&user);
            self.persist(&state)
        })
    }
}

impl FolderStore for JsonStateStore {
    fn get<'a>(&'a self, user: UserId) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.state.read().unwrap().folders.get(&user).cloned()) })
    }

    fn upsert<'a>(&'a self, user: UserId, folder_id: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.write().unwrap();
            state.folders.insert(user, folder_id.to_string());
            self.persist(&state)
        })
    }
}
