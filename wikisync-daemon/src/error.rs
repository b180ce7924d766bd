use thiserror::Error;

/// Error surface for the daemon runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error ({context}): {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Building the initial wiki session failed (bad credentials, unreachable wiki).
    #[error("wiki error: {0}")]
    Wiki(#[from] wikisync_wiki::WikiError),

    #[error("{task} task join failure: {detail}")]
    Join { task: &'static str, detail: String },

    #[error("unknown log format {0:?} (expected \"text\" or \"json\")")]
    LogFormat(String),
}

pub(crate) fn io_err(context: &'static str, source: std::io::Error) -> DaemonError {
    DaemonError::Io { context, source }
}
