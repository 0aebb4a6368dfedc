//! Chat platform boundary.
//!
//! The relay never talks to a chat SDK directly: the front-end implements
//! [`Messenger`] and [`MediaDownloader`] on top of the actual platform and
//! feeds inbound traffic in as [`InboundMessage`] values. [`ReplyWaiter`]
//! suspends a transfer until the requester's next message in the same
//! conversation.

mod replies;
mod traits;
mod types;

pub use replies::ReplyWaiter;
pub use traits::{ChatFuture, MediaDownloader, Messenger};
pub use types::{Attachment, ChatId, InboundMessage, MessageBody, MessageId, UserId};

/// Errors from the chat boundary.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat transport error: {0}")]
    Transport(String),

    #[error("reply timed out")]
    Timeout,

    #[error("reply wait superseded")]
    Superseded,
}
