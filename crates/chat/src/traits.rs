use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::{Attachment, ChatError, ChatId, MessageId};

/// Boxed future returned by chat capability methods.
pub type ChatFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ChatError>> + Send + 'a>>;

/// Abstract message transport.
///
/// The front-end implements this on top of the actual platform SDK. Using a
/// trait keeps relay logic decoupled from the SDK and testable with mocks.
pub trait Messenger: Send + Sync {
    /// Sends a new message to `chat`, returning its id.
    fn send_message<'a>(&'a self, chat: ChatId, text: &'a str) -> ChatFuture<'a, MessageId>;

    /// Replaces the text of an existing message.
    fn edit_message<'a>(
        &'a self,
        chat: ChatId,
        message: MessageId,
        text: &'a str,
    ) -> ChatFuture<'a, ()>;
}

/// Abstract attachment downloader.
pub trait MediaDownloader: Send + Sync {
    /// Streams the platform-held bytes of `attachment` into the file at
    /// `dest`, overwriting it.
    ///
    /// `on_progress` receives (bytes done, bytes total) at a bounded
    /// cadence, never per byte.
    fn download_to<'a>(
        &'a self,
        attachment: &'a Attachment,
        dest: &'a Path,
        on_progress: Box<dyn Fn(u64, u64) + Send + 'a>,
    ) -> ChatFuture<'a, ()>;
}
