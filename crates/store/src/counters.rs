use std::collections::HashMap;
use std::sync::RwLock;

use driveferry_chat::UserId;

/// Per-user count of completed transfers.
///
/// Held in process memory and reset on restart. Only the success path of a
/// transfer increments; aborted transfers leave the count untouched.
#[derive(Default)]
pub struct UploadCounters {
    counts: RwLock<HashMap<UserId, u64>>,
}

impl UploadCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumps the user's count, returning the new value.
    pub fn increment(&self, user: UserId) -> u64 {
        let mut counts = self.counts.write().unwrap();
        let count = counts.entry(user).or_insert(0);
        *count += 1;
        *count
    }

    /// Current count for a user (0 if they never completed a transfer).
    pub fn get(&self, user: UserId) -> u64 {
        self.counts.read().unwrap().get(&user).copied().unwrap_or(0)
    }

    /// Copy of all counts, for diagnostics.
    pub fn snapshot(&self) -> HashMap<UserId, u64> {
        self.counts.read().unwrap().clone()
    }
}
