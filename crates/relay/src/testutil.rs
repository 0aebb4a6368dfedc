//! Shared fixtures for the relay tests: a scripted HTTP server standing in
//! for the Drive API and source hosts, plus recording chat doubles.

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use driveferry_chat::{
    Attachment, ChatError, ChatFuture, ChatId, MediaDownloader, MessageId, Messenger,
};

/// Binds a listener and returns it with its `http://` base URL, so scripted
/// responses can reference the server's own address.
pub(crate) async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    (listener, url)
}

/// Answers one connection per scripted response, in order.
///
/// Each request is recorded as its head plus at most the first KiB of its
/// body, enough for header and small-body assertions without holding
/// multi-megabyte uploads in memory.
pub(crate) fn serve(
    listener: TcpListener,
    responses: Vec<Vec<u8>>,
) -> (Arc<Mutex<Vec<String>>>, JoinHandle<()>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let handle = tokio::spawn(async move {
        for response in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let request = read_request(&mut stream).await;
            let keep = request.len().min(head_len(&request) + 1024);
            recorder
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(&request[..keep]).into_owned());
            let _ = stream.write_all(&response).await;
            let _ = stream.shutdown().await;
        }
    });
    (seen, handle)
}

/// Convenience for the common one-exchange case.
pub(crate) async fn serve_once(response: Vec<u8>) -> (String, JoinHandle<()>) {
    let (listener, url) = bind().await;
    let (_seen, handle) = serve(listener, vec![response]);
    (url, handle)
}

pub(crate) fn response(status: u16, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {status} OK\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    )
    .into_bytes();
    for (name, value) in headers {
        out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out
}

pub(crate) fn ok_json(body: &str) -> Vec<u8> {
    response(200, &[], body.as_bytes())
}

/// Resumable-session opener: 200 with the session URI in `Location`.
pub(crate) fn session_opened(uri: &str) -> Vec<u8> {
    response(200, &[("Location", uri)], b"")
}

/// Chunk acknowledgement: 308 confirming `received` bytes.
pub(crate) fn chunk_ack(received: u64) -> Vec<u8> {
    let range = format!("bytes=0-{}", received - 1);
    response(308, &[("Range", range.as_str())], b"")
}

fn head_len(request: &[u8]) -> usize {
    request
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
        .unwrap_or(request.len())
}

/// Reads one request: headers plus the declared body length.
async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return buf;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(body_start) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..body_start]).to_lowercase();
            let declared = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() - (body_start + 4) >= declared {
                return buf;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Chat doubles
// ---------------------------------------------------------------------------

/// Messenger that records every send and edit.
pub(crate) struct RecordingMessenger {
    next_id: AtomicI64,
    fail_edits: bool,
    sends: Mutex<Vec<(ChatId, String)>>,
    edits: Mutex<Vec<(ChatId, MessageId, String)>>,
}

impl RecordingMessenger {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            fail_edits: false,
            sends: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
        }
    }

    /// Variant whose edits always fail, for edit-tolerance tests.
    pub(crate) fn with_failing_edits() -> Self {
        Self {
            fail_edits: true,
            ..Self::new()
        }
    }

    pub(crate) fn sent_texts(&self) -> Vec<String> {
        self.sends.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub(crate) fn edits(&self) -> Vec<(ChatId, MessageId, String)> {
        self.edits.lock().unwrap().clone()
    }

    pub(crate) fn edit_texts(&self) -> Vec<String> {
        self.edits.lock().unwrap().iter().map(|(_, _, t)| t.clone()).collect()
    }

    pub(crate) fn last_edit_text(&self) -> Option<String> {
        self.edit_texts().last().cloned()
    }
}

impl Messenger for RecordingMessenger {
    fn send_message<'a>(&'a self, chat: ChatId, text: &'a str) -> ChatFuture<'a, MessageId> {
        Box::pin(async move {
            let id = MessageId(self.next_id.fetch_add(1, Ordering::Relaxed));
            self.sends.lock().unwrap().push((chat, text.to_string()));
            Ok(id)
        })
    }

    fn edit_message<'a>(
        &'a self,
        chat: ChatId,
        message: MessageId,
        text: &'a str,
    ) -> ChatFuture<'a, ()> {
        Box::pin(async move {
            if self.fail_edits {
                return Err(ChatError::Transport("edit rejected".into()));
            }
            self.edits
                .lock()
                .unwrap()
                .push((chat, message, text.to_string()));
            Ok(())
        })
    }
}

/// Downloader that writes fixed bytes to the destination.
pub(crate) struct MockDownloader {
    pub(crate) data: Vec<u8>,
}

impl MockDownloader {
    pub(crate) fn empty() -> Self {
        Self { data: Vec::new() }
    }
}

impl MediaDownloader for MockDownloader {
    fn download_to<'a>(
        &'a self,
        attachment: &'a Attachment,
        dest: &'a Path,
        on_progress: Box<dyn Fn(u64, u64) + Send + 'a>,
    ) -> ChatFuture<'a, ()> {
        Box::pin(async move {
            tokio::fs::write(dest, &self.data)
                .await
                .map_err(|err| ChatError::Transport(err.to_string()))?;
            on_progress(self.data.len() as u64, attachment.size);
            Ok(())
        })
    }
}
