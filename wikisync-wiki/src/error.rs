//! Error types for wikisync-wiki.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from wiki gateway operations.
#[derive(Debug, Error)]
pub enum WikiError {
    /// The page (or its content) does not exist. Expected during gating.
    #[error("page does not exist: {title}")]
    NotFound { title: String },

    /// The session or CSRF token was rejected.
    #[error("authentication expired: {0}")]
    AuthExpired(String),

    /// HTTP-level failure talking to the wiki.
    #[error("wiki transport error: {0}")]
    Transport(String),

    /// The response did not have the shape expected for the action.
    #[error("malformed {action} response: {detail}")]
    MalformedResponse { action: String, detail: String },

    /// The API answered with an `error` envelope.
    #[error("API error: {code} - {info}")]
    Api { code: String, info: String },

    /// Login was refused.
    #[error("login failed: {reason}")]
    LoginFailed { reason: String },

    /// The edit action returned something other than `Success`.
    #[error("edit of {title} rejected: {result}")]
    EditRejected { title: String, result: String },

    /// Offline store I/O failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WikiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, WikiError::NotFound { .. })
    }

    pub(crate) fn malformed(action: &str, detail: impl Into<String>) -> Self {
        WikiError::MalformedResponse {
            action: action.to_string(),
            detail: detail.into(),
        }
    }
}

/// Convenience constructor for [`WikiError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WikiError {
    WikiError::Io {
        path: path.into(),
        source,
    }
}
