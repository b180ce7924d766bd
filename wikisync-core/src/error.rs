//! Error types for wikisync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while talking to the package registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Network-level failure (DNS, connect, TLS, read timeout).
    #[error("registry transport error: {0}")]
    Transport(String),

    /// The registry answered with a non-success HTTP status.
    #[error("registry returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The response body did not match the expected package list shape.
    #[error("failed to decode registry response: {0}")]
    Decode(String),

    /// A local package snapshot could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ureq::Error> for RegistryError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => RegistryError::Status {
                status,
                url: response.get_url().to_string(),
            },
            ureq::Error::Transport(transport) => RegistryError::Transport(transport.to_string()),
        }
    }
}

/// Invalid startup configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Exactly one of username / password was supplied.
    #[error("wiki credentials are incomplete: both username and password are required")]
    IncompleteCredentials,

    /// Live mode needs an API endpoint.
    #[error("wiki API URL is required when credentials are configured")]
    MissingApiUrl,

    /// Only one half of the extra header pair was supplied.
    #[error("extra authorization header needs both a name and a value")]
    IncompleteHeader,
}
