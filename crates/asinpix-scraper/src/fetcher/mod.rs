//! Rendered-page retrieval.
//!
//! A [`PageFetcher`] opens [`FetchSession`]s; each session is one live
//! rendering context that is reused for every storefront of a single
//! identifier and closed exactly once by its owner.

#[cfg(feature = "chromium")]
mod chromium;

use async_trait::async_trait;

use crate::error::{FetchError, SessionError};

#[cfg(feature = "chromium")]
pub use chromium::{ChromiumFetcher, ChromiumOptions};

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Creates a new, exclusively owned session.
    async fn open_session(&self) -> Result<Box<dyn FetchSession>, SessionError>;
}

#[async_trait]
pub trait FetchSession: Send {
    /// Navigates to `url` and returns the document HTML after scripts have run.
    ///
    /// A failed fetch leaves the session usable unless the error is
    /// [`FetchError::SessionLost`].
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError>;

    /// Releases the session. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), SessionError>;
}
