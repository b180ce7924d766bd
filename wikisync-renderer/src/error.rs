//! Error types for wikisync-renderer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error (template parse, filter, or render).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),
}
