use std::path::PathBuf;

use crate::app_config::{AppConfig, DEFAULT_USER_AGENT};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let log_level = or_default("ASINPIX_LOG_LEVEL", "info");

    let max_concurrent_jobs = parse_usize("ASINPIX_MAX_CONCURRENT_JOBS", "3")?;
    if max_concurrent_jobs == 0 {
        return Err(invalid(
            "ASINPIX_MAX_CONCURRENT_JOBS",
            "must be at least 1".to_string(),
        ));
    }

    let page_settle_secs = parse_u64("ASINPIX_PAGE_SETTLE_SECS", "10")?;
    let parse_timeout = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let secs = parse_u64(var, default)?;
        if secs == 0 {
            return Err(invalid(var, "must be at least 1 second".to_string()));
        }
        Ok(secs)
    };

    let page_load_timeout_secs = parse_timeout("ASINPIX_PAGE_LOAD_TIMEOUT_SECS", "30")?;
    let download_timeout_secs = parse_timeout("ASINPIX_DOWNLOAD_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("ASINPIX_USER_AGENT", DEFAULT_USER_AGENT);
    let download_max_retries = parse_u32("ASINPIX_DOWNLOAD_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("ASINPIX_RETRY_BACKOFF_BASE_MS", "500")?;
    let chrome_path = lookup("ASINPIX_CHROME_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let headless = parse_bool("ASINPIX_HEADLESS", "true")?;

    Ok(AppConfig {
        log_level,
        max_concurrent_jobs,
        page_settle_secs,
        page_load_timeout_secs,
        download_timeout_secs,
        user_agent,
        download_max_retries,
        retry_backoff_base_ms,
        chrome_path,
        headless,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
