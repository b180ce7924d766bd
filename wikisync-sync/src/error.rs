//! Error types for wikisync-sync.

use thiserror::Error;

use wikisync_core::error::RegistryError;
use wikisync_renderer::RenderError;
use wikisync_wiki::WikiError;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing packages failed; the pass has nothing to reconcile against.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("wiki error: {0}")]
    Wiki(#[from] WikiError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// A version page whose content is not a strict semantic version.
    #[error("page {title} does not hold a semantic version: {content:?}")]
    InvalidVersion { title: String, content: String },
}
