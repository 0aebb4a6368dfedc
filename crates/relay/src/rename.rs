use std::time::Duration;

use driveferry_chat::{ChatError, ChatId, ReplyWaiter, UserId};
use driveferry_transfer::apply_rename;

use crate::RelayError;

/// Resolves the final file name through one prompt/reply round-trip.
///
/// The prompt itself is rendered by the status reporter when the task
/// enters the awaiting-rename phase; this only waits for the reply and
/// applies the rename rules: the keep-sentinel preserves `original`,
/// anything else replaces the stem and keeps the original extension.
pub(crate) async fn negotiate(
    replies: &ReplyWaiter,
    user: UserId,
    chat: ChatId,
    original: &str,
    timeout: Duration,
) -> Result<String, RelayError> {
    match replies.wait(user, chat, timeout).await {
        Ok(reply) => Ok(apply_rename(original, &reply)),
        Err(ChatError::Timeout) => Err(RelayError::RenameTimeout),
        Err(err) => Err(RelayError::Chat(err)),
    }
}
