pub mod app_config;
pub mod config;
pub mod identifiers;
pub mod storefront;

use thiserror::Error;

pub use app_config::{AppConfig, DEFAULT_USER_AGENT};
pub use config::{load_app_config, load_app_config_from_env};
pub use identifiers::{load_identifiers, parse_identifiers, Identifier, IdentifierList};
pub use storefront::{Storefront, CATALOG};

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Problems with caller-supplied input, surfaced before any job is scheduled.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read identifier file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid identifier {value:?} on line {line}: expected ASCII letters and digits only")]
    InvalidIdentifier { line: usize, value: String },

    #[error("identifier list contains no identifiers")]
    NoIdentifiers,

    #[error("no storefronts selected")]
    NoStorefronts,

    #[error("unknown storefront \"{0}\"")]
    UnknownStorefront(String),

    #[error("output directory {path} cannot be created: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
