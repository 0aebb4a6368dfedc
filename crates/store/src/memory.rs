use std::collections::HashMap;
use std::sync::RwLock;

use driveferry_chat::UserId;

use crate::traits::{CredentialStore, FolderStore, StoreFuture};
use crate::Credential;

/// In-memory credential store for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryCredentialStore {
    records: RwLock<HashMap<UserId, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get<'a>(&'a self, user: UserId) -> StoreFuture<'a, Option<Credential>> {
        Box::pin(async move { Ok(self.records.read().unwrap().get(&user).cloned()) })
    }

    fn put<'a>(&'a self, user: UserId, credential: Credential) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.records.write().unwrap().insert(user, credential);
            Ok(())
        })
    }

    fn delete<'a>(&'a self, user: UserId) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.records.write().unwrap().remove(&user);
            Ok(())
        })
    }
}

/// In-memory folder mapping store.
#[derive(Default)]
pub struct MemoryFolderStore {
    mappings: RwLock<HashMap<UserId, String>>,
}

impl MemoryFolderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FolderStore for MemoryFolderStore {
    fn get<'a>(&'a self, user: UserId) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.mappings.read().unwrap().get(&user).cloned()) })
    }

    fn upsert<'a>(&'a self, user: UserId, folder_id: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.mappings
                .write()
                .unwrap()
                .insert(user, folder_id.to_string());
            Ok(())
        })
    }
}
