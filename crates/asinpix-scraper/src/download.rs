//! Image download with retry and atomic writes.

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;

use crate::error::DownloadError;
use crate::retry::retry_with_backoff;
use crate::types::DownloadOutcome;

/// Fetches image bytes over HTTP and writes them to disk.
///
/// Nothing is written at the destination until the full body has arrived.
/// Each download writes a uniquely named temporary file beside the target
/// and renames it into place, so a failed download never leaves a truncated
/// image behind and concurrent downloads to the same path never share a
/// temporary file. Existing files at the destination are overwritten on
/// success and left untouched on failure.
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    client: Client,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ImageDownloader {
    /// Creates an `ImageDownloader` with the given timeout, `User-Agent`, and
    /// retry policy. `max_retries = 0` disables retries.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Downloads `url` to `destination`, folding any error into
    /// [`DownloadOutcome::Failed`].
    pub async fn download(&self, url: &str, destination: &Path) -> DownloadOutcome {
        match self.try_download(url, destination).await {
            Ok(bytes) => DownloadOutcome::Saved {
                path: destination.to_path_buf(),
                bytes,
            },
            Err(e) => DownloadOutcome::Failed {
                url: url.to_owned(),
                reason: e.to_string(),
            },
        }
    }

    /// Downloads `url` to `destination` and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::NotFound`]: HTTP 404 (not retried).
    /// - [`DownloadError::RateLimited`]: HTTP 429 after all retries.
    /// - [`DownloadError::UnexpectedStatus`]: any other non-2xx status (5xx retried).
    /// - [`DownloadError::Http`]: network failure after all retries.
    /// - [`DownloadError::Write`]: the file could not be written.
    pub async fn try_download(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, "image/avif,image/webp,image/*,*/*;q=0.8")
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(DownloadError::RateLimited {
                    url: url.to_owned(),
                });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DownloadError::NotFound {
                    url: url.to_owned(),
                });
            }

            if !status.is_success() {
                return Err(DownloadError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            Ok(response.bytes().await?)
        })
        .await?;

        let len = u64::try_from(body.len()).unwrap_or(u64::MAX);
        write_atomically(destination, body).await?;
        Ok(len)
    }
}

/// Writes `bytes` to a fresh temporary file in the destination directory,
/// then renames it onto `destination`. The temporary file is removed if any
/// step fails.
fn persist_bytes(destination: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let Some(name) = destination.file_name() else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "destination has no file name",
        ));
    };
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut prefix = OsString::from(".");
    prefix.push(name);
    prefix.push(".");
    let mut part = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".part")
        .tempfile_in(dir)?;
    part.write_all(bytes)?;
    part.flush()?;
    part.persist(destination).map_err(|e| e.error)?;
    Ok(())
}

async fn write_atomically<B>(destination: &Path, bytes: B) -> Result<(), DownloadError>
where
    B: AsRef<[u8]> + Send + 'static,
{
    let target = destination.to_path_buf();
    let written = tokio::task::spawn_blocking(move || persist_bytes(&target, bytes.as_ref()))
        .await
        .unwrap_or_else(|e| Err(std::io::Error::other(e)));
    written.map_err(|source| DownloadError::Write {
        path: destination.display().to_string(),
        source,
    })
}
