use std::path::PathBuf;

use futures_util::StreamExt;
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

use driveferry_chat::{Attachment, MediaDownloader};
use driveferry_transfer::{StagedFile, DEFAULT_CHUNK_SIZE};

use crate::{FetchError, ProgressFn, Source};

/// Stages transfer sources into local temp files.
///
/// Bytes are streamed to disk, never buffered whole in memory. Every error
/// path drops the partially written temp file, so a failed fetch leaves the
/// staging directory clean.
pub struct Fetcher {
    http: reqwest::Client,
    staging_dir: Option<PathBuf>,
}

impl Fetcher {
    /// Fetcher staging into the system temp directory.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            staging_dir: None,
        }
    }

    /// Stages files under `dir` instead of the system temp directory.
    pub fn with_staging_dir(mut self, dir: PathBuf) -> Self {
        self.staging_dir = Some(dir);
        self
    }

    /// Downloads `source` into a staged temp file.
    ///
    /// `on_progress` receives cumulative bytes against the total, once per
    /// written chunk; the total is 0 when the source does not declare one.
    pub async fn fetch(
        &self,
        source: &Source,
        downloader: &dyn MediaDownloader,
        on_progress: ProgressFn<'_>,
    ) -> Result<StagedFile, FetchError> {
        let name = source.original_name();
        match source {
            Source::Attachment(attachment) => {
                self.fetch_attachment(attachment, name, downloader, on_progress)
                    .await
            }
            Source::Url(url) => self.fetch_url(url, name, on_progress).await,
        }
    }

    async fn fetch_attachment(
        &self,
        attachment: &Attachment,
        name: String,
        downloader: &dyn MediaDownloader,
        on_progress: ProgressFn<'_>,
    ) -> Result<StagedFile, FetchError> {
        let temp = self.temp_path()?;
        downloader.download_to(attachment, &temp, on_progress).await?;

        let size = tokio::fs::metadata(&temp).await?.len();
        if size == 0 {
            return Err(FetchError::EmptySource);
        }

        info!(name = %name, size, "attachment staged");
        Ok(StagedFile::new(temp, name, size))
    }

    async fn fetch_url(
        &self,
        url: &str,
        name: String,
        on_progress: ProgressFn<'_>,
    ) -> Result<StagedFile, FetchError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        // 0 means unknown; percentage and ETA degrade downstream.
        let total = response.content_length().unwrap_or(0);

        let temp = self.temp_path()?;
        let file = File::create(&temp).await?;
        let mut writer = BufWriter::with_capacity(DEFAULT_CHUNK_SIZE, file);
        let mut done: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(piece) = stream.next().await {
            let piece = piece?;
            writer.write_all(&piece).await?;
            done += piece.len() as u64;
            on_progress(done, total);
        }
        writer.flush().await?;

        if done == 0 {
            return Err(FetchError::EmptySource);
        }

        info!(name = %name, size = done, "url staged");
        Ok(StagedFile::new(temp, name, done))
    }

    fn temp_path(&self) -> Result<TempPath, FetchError> {
        let file = match &self.staging_dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new()?,
        };
        Ok(file.into_temp_path())
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use driveferry_chat::{ChatError, ChatFuture};

    use super::*;

    struct MockDownloader {
        data: Vec<u8>,
        fail: bool,
    }

    impl MediaDownloader for MockDownloader {
        fn download_to<'a>(
            &'a self,
            attachment: &'a Attachment,
            dest: &'a Path,
            on_progress: Box<dyn Fn(u64, u64) + Send + 'a>,
        ) -> ChatFuture<'a, ()> {
            Box::pin(async move {
                if self.fail {
                    return Err(ChatError::Transport("stream reset".into()));
                }
                tokio::fs::write(dest, &self.data)
                    .await
                    .map_err(|err| ChatError::Transport(err.to_string()))?;
                on_progress(self.data.len() as u64, attachment.size);
                Ok(())
            })
        }
    }

    fn unused_downloader() -> MockDownloader {
        MockDownloader {
            data: Vec::new(),
            fail: true,
        }
    }

    fn attachment(name: Option<&str>, size: u64) -> Attachment {
        Attachment {
            file_id: "BAAD".into(),
            file_name: name.map(str::to_string),
            size,
        }
    }

    /// Serves one connection: reads the request, writes `head` + `body`.
    async fn serve_once(head: String, body: Vec<u8>) -> (String, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
        let handle = tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let _ = stream.write_all(head.as_bytes()).await;
            let _ = stream.write_all(&body).await;
            let _ = stream.shutdown().await;
        });
        (url, handle)
    }

    fn ok_head(len: usize) -> String {
        format!("HTTP/1.1 200 OK\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n")
    }

    fn progress_recorder() -> (Arc<Mutex<Vec<(u64, u64)>>>, ProgressFn<'static>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let callback: ProgressFn<'static> =
            Box::new(move |done, total| recorder.lock().unwrap().push((done, total)));
        (seen, callback)
    }

    fn dir_is_empty(dir: &TempDir) -> bool {
        std::fs::read_dir(dir.path()).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn url_download_stages_file() {
        let body = b"0123456789".to_vec();
        let (url, handle) = serve_once(ok_head(body.len()), body.clone()).await;
        let staging = TempDir::new().unwrap();
        let fetcher = Fetcher::new().with_staging_dir(staging.path().to_path_buf());
        let (seen, on_progress) = progress_recorder();

        let source = Source::Url(format!("{url}/files/report.pdf"));
        let staged = fetcher
            .fetch(&source, &unused_downloader(), on_progress)
            .await
            .unwrap();

        assert_eq!(staged.name(), "report.pdf");
        assert_eq!(staged.size(), 10);
        assert_eq!(std::fs::read(staged.path()).unwrap(), body);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.last(), Some(&(10, 10)));
        assert!(seen.iter().all(|&(_, total)| total == 10));
        drop(seen);
        handle.abort();
    }

    #[tokio::test]
    async fn url_without_content_length_reports_unknown_total() {
        let head = "HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_string();
        let (url, handle) = serve_once(head, b"abcdef".to_vec()).await;
        let fetcher = Fetcher::new();
        let (seen, on_progress) = progress_recorder();

        let source = Source::Url(format!("{url}/data.bin"));
        let staged = fetcher
            .fetch(&source, &unused_downloader(), on_progress)
            .await
            .unwrap();

        assert_eq!(staged.size(), 6);
        assert!(seen.lock().unwrap().iter().all(|&(_, total)| total == 0));
        handle.abort();
    }

    #[tokio::test]
    async fn url_error_status_is_surfaced() {
        let head = "HTTP/1.1 404 X\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string();
        let (url, handle) = serve_once(head, Vec::new()).await;
        let fetcher = Fetcher::new();

        let source = Source::Url(format!("{url}/missing.bin"));
        let err = fetcher
            .fetch(&source, &unused_downloader(), Box::new(|_, _| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404 }));
        handle.abort();
    }

    #[tokio::test]
    async fn url_empty_body_is_rejected_and_cleaned_up() {
        let (url, handle) = serve_once(ok_head(0), Vec::new()).await;
        let staging = TempDir::new().unwrap();
        let fetcher = Fetcher::new().with_staging_dir(staging.path().to_path_buf());

        let source = Source::Url(format!("{url}/empty.bin"));
        let err = fetcher
            .fetch(&source, &unused_downloader(), Box::new(|_, _| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::EmptySource));
        assert!(dir_is_empty(&staging));
        handle.abort();
    }

    #[tokio::test]
    async fn url_mid_stream_drop_cleans_staging() {
        // Declares 1000 bytes but closes after 400.
        let (url, handle) = serve_once(ok_head(1000), vec![0xAB; 400]).await;
        let staging = TempDir::new().unwrap();
        let fetcher = Fetcher::new().with_staging_dir(staging.path().to_path_buf());

        let source = Source::Url(format!("{url}/big.bin"));
        let err = fetcher
            .fetch(&source, &unused_downloader(), Box::new(|_, _| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
        assert!(dir_is_empty(&staging));
        handle.abort();
    }

    #[tokio::test]
    async fn attachment_download_uses_metadata_name() {
        let downloader = MockDownloader {
            data: b"%PDF-123".to_vec(),
            fail: false,
        };
        let fetcher = Fetcher::new();
        let (seen, on_progress) = progress_recorder();

        let source = Source::Attachment(attachment(Some("report.pdf"), 8));
        let staged = fetcher.fetch(&source, &downloader, on_progress).await.unwrap();

        assert_eq!(staged.name(), "report.pdf");
        assert_eq!(staged.size(), 8);
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"%PDF-123");
        assert_eq!(seen.lock().unwrap().last(), Some(&(8, 8)));
    }

    #[tokio::test]
    async fn unnamed_attachment_falls_back_to_generic_name() {
        let downloader = MockDownloader {
            data: b"bytes".to_vec(),
            fail: false,
        };
        let fetcher = Fetcher::new();

        let source = Source::Attachment(attachment(None, 5));
        let staged = fetcher
            .fetch(&source, &downloader, Box::new(|_, _| {}))
            .await
            .unwrap();
        assert_eq!(staged.name(), "file");
    }

    #[tokio::test]
    async fn empty_attachment_is_rejected() {
        let downloader = MockDownloader {
            data: Vec::new(),
            fail: false,
        };
        let staging = TempDir::new().unwrap();
        let fetcher = Fetcher::new().with_staging_dir(staging.path().to_path_buf());

        let source = Source::Attachment(attachment(Some("ghost.bin"), 0));
        let err = fetcher
            .fetch(&source, &downloader, Box::new(|_, _| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::EmptySource));
        assert!(dir_is_empty(&staging));
    }

    #[tokio::test]
    async fn downloader_failure_propagates_and_cleans_up() {
        let downloader = MockDownloader {
            data: Vec::new(),
            fail: true,
        };
        let staging = TempDir::new().unwrap();
        let fetcher = Fetcher::new().with_staging_dir(staging.path().to_path_buf());

        let source = Source::Attachment(attachment(Some("doc.bin"), 100));
        let err = fetcher
            .fetch(&source, &downloader, Box::new(|_, _| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Download(_)));
        assert!(dir_is_empty(&staging));
    }
}
