//! Headless Chromium sessions via `chromiumoxide`.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use asinpix_core::AppConfig;

use super::{FetchSession, PageFetcher};
use crate::error::{FetchError, SessionError};

const READY_STATE_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    /// Browser executable; `chromiumoxide` auto-detects one when `None`.
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    pub user_agent: String,
    pub page_load_timeout: Duration,
    /// Longest wait for `document.readyState == "complete"` after navigation.
    pub settle_timeout: Duration,
}

impl ChromiumOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            chrome_path: config.chrome_path.clone(),
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            page_load_timeout: Duration::from_secs(config.page_load_timeout_secs),
            settle_timeout: Duration::from_secs(config.page_settle_secs),
        }
    }
}

/// Launches one browser process per session.
#[derive(Debug, Clone)]
pub struct ChromiumFetcher {
    options: ChromiumOptions,
}

impl ChromiumFetcher {
    #[must_use]
    pub fn new(options: ChromiumOptions) -> Self {
        Self { options }
    }

    fn browser_config(&self, user_data_dir: &TempDir) -> Result<BrowserConfig, SessionError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.options.page_load_timeout)
            .window_size(1920, 1080)
            .user_data_dir(user_data_dir.path())
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--mute-audio")
            .arg(format!("--user-agent={}", self.options.user_agent));

        if let Some(path) = &self.options.chrome_path {
            builder = builder.chrome_executable(path);
        }
        if !self.options.headless {
            builder = builder.with_head();
        }

        builder
            .build()
            .map_err(|e| SessionError::Open(format!("invalid browser config: {e}")))
    }
}

#[async_trait]
impl PageFetcher for ChromiumFetcher {
    async fn open_session(&self) -> Result<Box<dyn FetchSession>, SessionError> {
        // Concurrent sessions need separate profiles.
        let user_data_dir = tempfile::Builder::new()
            .prefix("asinpix-chrome-")
            .tempdir()
            .map_err(|e| SessionError::Open(format!("failed to create profile dir: {e}")))?;

        let config = self.browser_config(&user_data_dir)?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Open(format!("failed to launch browser: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser handler error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(SessionError::Open(format!("failed to open page: {e}")));
            }
        };

        tracing::debug!(profile = %user_data_dir.path().display(), "browser session opened");

        Ok(Box::new(ChromiumSession {
            browser,
            handler,
            page: Some(page),
            page_load_timeout: self.options.page_load_timeout,
            settle_timeout: self.options.settle_timeout,
            _user_data_dir: user_data_dir,
            closed: false,
        }))
    }
}

struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Option<Page>,
    page_load_timeout: Duration,
    settle_timeout: Duration,
    // Removed from disk on drop, after the browser is gone.
    _user_data_dir: TempDir,
    closed: bool,
}

impl ChromiumSession {
    fn lost(&self, url: &str, reason: impl Into<String>) -> FetchError {
        FetchError::SessionLost {
            url: url.to_owned(),
            reason: reason.into(),
        }
    }

    /// Polls `document.readyState` until it reports `complete` or the
    /// settle timeout elapses. Timing out here is not an error.
    async fn settle(page: &Page, settle_timeout: Duration) {
        let deadline = Instant::now() + settle_timeout;
        loop {
            let ready = page
                .evaluate("document.readyState")
                .await
                .ok()
                .and_then(|r| r.into_value::<String>().ok());
            if ready.as_deref() == Some("complete") {
                return;
            }
            if Instant::now() >= deadline {
                tracing::debug!(?ready, "page did not settle before timeout");
                return;
            }
            tokio::time::sleep(READY_STATE_POLL).await;
        }
    }
}

#[async_trait]
impl FetchSession for ChromiumSession {
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        if self.closed || self.handler.is_finished() {
            return Err(self.lost(url, "browser connection closed"));
        }
        let Some(page) = self.page.as_ref() else {
            return Err(self.lost(url, "no open page"));
        };

        let navigation = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        };

        match tokio::time::timeout(self.page_load_timeout, navigation).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                if self.handler.is_finished() {
                    return Err(self.lost(url, e.to_string()));
                }
                return Err(FetchError::Navigation {
                    url: url.to_owned(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_owned(),
                    timeout_secs: self.page_load_timeout.as_secs(),
                });
            }
        }

        Self::settle(page, self.settle_timeout).await;

        page.content().await.map_err(|e| FetchError::Content {
            url: url.to_owned(),
            reason: e.to_string(),
        })
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "failed to close page before browser shutdown");
            }
        }

        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Close(e.to_string()));
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "failed waiting for browser process to exit");
        }
        self.handler.abort();
        result
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // `Browser`'s own drop kills the child process.
        self.handler.abort();
        if !self.closed {
            tracing::warn!("browser session dropped without close");
        }
    }
}
