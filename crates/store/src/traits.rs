use std::future::Future;
use std::pin::Pin;

use driveferry_chat::UserId;

use crate::{Credential, StoreError};

/// Boxed future returned by store methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Per-user credential records, one per user.
///
/// Absence is a normal lookup result, not an error; the relay renders it as
/// an instruction to authenticate. `put` and `delete` exist for the external
/// authorization flow (handshake completion, de-authorization).
pub trait CredentialStore: Send + Sync {
    fn get<'a>(&'a self, user: UserId) -> StoreFuture<'a, Option<Credential>>;

    fn put<'a>(&'a self, user: UserId, credential: Credential) -> StoreFuture<'a, ()>;

    fn delete<'a>(&'a self, user: UserId) -> StoreFuture<'a, ()>;
}

/// Per-user destination folder mapping.
///
/// `upsert` replaces any existing mapping for the user; the destination
/// resolver serializes first-use creation per user so at most one folder id
/// is ever written per key.
pub trait FolderStore: Send + Sync {
    fn get<'a>(&'a self, user: UserId) -> StoreFuture<'a, Option<String>>;

    fn upsert<'a>(&'a self, user: UserId, folder_id: &'a str) -> StoreFuture<'a, ()>;
}
