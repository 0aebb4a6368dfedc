use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, oneshot};
use tracing::warn;

use crate::{ChatError, ChatId, UserId};

type WaitKey = (UserId, ChatId);

/// Registry of transfers suspended on the requester's next message.
///
/// The inbound dispatcher offers every text message here before normal
/// classification; a consumed message resumes the waiting transfer instead
/// of starting a new one. At most one wait is pending per (user, chat) —
/// a newer wait supersedes an older one.
pub struct ReplyWaiter {
    pending: Mutex<HashMap<WaitKey, (u64, oneshot::Sender<String>)>>,
    seq: AtomicU64,
}

impl ReplyWaiter {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            seq: AtomicU64::new(0),
        }
    }

    /// Suspends until the next message from `user` in `chat`, or `timeout`.
    ///
    /// The pending entry is removed on every exit path, so a timed-out wait
    /// never captures a later unrelated message.
    pub async fn wait(
        &self,
        user: UserId,
        chat: ChatId,
        timeout: Duration,
    ) -> Result<String, ChatError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if pending.insert((user, chat), (seq, tx)).is_some() {
                warn!(%user, %chat, "superseding pending reply wait");
            }
        }

        let result = tokio::time::timeout(timeout, rx).await;

        // Clean up our own entry; a superseding wait owns the slot now.
        {
            let mut pending = self.pending.lock().await;
            if pending.get(&(user, chat)).is_some_and(|(s, _)| *s == seq) {
                pending.remove(&(user, chat));
            }
        }

        match result {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(_)) => Err(ChatError::Superseded),
            Err(_) => Err(ChatError::Timeout),
        }
    }

    /// Completes a pending wait with `text`. Returns true if a waiting
    /// transfer consumed the message.
    pub async fn offer(&self, user: UserId, chat: ChatId, text: &str) -> bool {
        let entry = self.pending.lock().await.remove(&(user, chat));
        match entry {
            Some((_, tx)) => tx.send(text.to_string()).is_ok(),
            None => false,
        }
    }
}

impl Default for ReplyWaiter {
    fn default() -> Self {
        Self::new()
    }
}
