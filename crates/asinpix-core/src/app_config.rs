use std::path::PathBuf;

/// Browser and HTTP user agent used when none is configured.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Worker pool size: the number of fetch sessions open at once.
    pub max_concurrent_jobs: usize,
    /// Upper bound on the post-navigation wait for the page to settle.
    pub page_settle_secs: u64,
    pub page_load_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub user_agent: String,
    pub download_max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Explicit browser executable; auto-detected when `None`.
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
}
