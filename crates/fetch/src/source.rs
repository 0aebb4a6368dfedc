use driveferry_chat::{Attachment, MessageBody};
use percent_encoding::percent_decode_str;
use url::Url;

/// Fallback name when an attachment carries no file name.
const ATTACHMENT_FALLBACK_NAME: &str = "file";
/// Fallback name when a URL has no usable last path segment.
const URL_FALLBACK_NAME: &str = "downloaded_file";

/// Where a transfer's bytes come from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A platform-held attachment, streamed through the chat SDK.
    Attachment(Attachment),
    /// A direct download URL, streamed over HTTP.
    Url(String),
}

impl Source {
    /// Classifies an inbound message body as a transfer trigger.
    ///
    /// Attachments always qualify. Text qualifies only when the whole
    /// trimmed message parses as an absolute http(s) URL; anything else is
    /// not a trigger.
    pub fn from_body(body: &MessageBody) -> Option<Self> {
        match body {
            MessageBody::Media(attachment) => Some(Self::Attachment(attachment.clone())),
            MessageBody::Text(text) => {
                let text = text.trim();
                let url = Url::parse(text).ok()?;
                matches!(url.scheme(), "http" | "https").then(|| Self::Url(text.to_string()))
            }
        }
    }

    /// Name the source suggests for the staged file.
    pub fn original_name(&self) -> String {
        match self {
            Self::Attachment(attachment) => attachment
                .file_name
                .clone()
                .unwrap_or_else(|| ATTACHMENT_FALLBACK_NAME.to_string()),
            Self::Url(url) => name_from_url(url),
        }
    }
}

/// Percent-decoded last path segment of `url`, or the generic fallback.
/// The query string never contributes to the name.
fn name_from_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return URL_FALLBACK_NAME.to_string();
    };
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty());
    match segment {
        Some(segment) => percent_decode_str(segment)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| segment.to_string()),
        None => URL_FALLBACK_NAME.to_string(),
    }
}
