use thiserror::Error;

/// A page could not be retrieved or rendered for one (identifier, storefront).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {timeout_secs}s loading {url}")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("failed to read rendered document for {url}: {reason}")]
    Content { url: String, reason: String },

    /// The session itself is gone; later fetches on it cannot succeed.
    #[error("fetch session lost while loading {url}: {reason}")]
    SessionLost { url: String, reason: String },
}

impl FetchError {
    #[must_use]
    pub fn is_session_lost(&self) -> bool {
        matches!(self, FetchError::SessionLost { .. })
    }
}

/// A fetch session could not be created or released.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to open fetch session: {0}")]
    Open(String),

    #[error("failed to close fetch session: {0}")]
    Close(String),
}

/// One image URL could not be retrieved or written.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited fetching {url}")]
    RateLimited { url: String },

    #[error("image not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
