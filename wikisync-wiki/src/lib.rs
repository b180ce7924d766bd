//! # wikisync-wiki
//!
//! Page read / write / delete / list against either the live MediaWiki
//! action API ([`LiveWiki`]) or a local directory store ([`OfflineWiki`]).
//!
//! Writes are idempotent: [`WikiGateway::edit_page`] compares the trimmed new
//! text with the trimmed current content and skips the write when they match.
//! Live writes go through a single re-login retry when the CSRF token is
//! rejected.

pub mod api;
pub mod error;
pub mod live;
pub mod offline;
pub mod tokens;
pub mod transport;

pub use error::WikiError;
pub use live::LiveWiki;
pub use offline::OfflineWiki;
pub use tokens::{TokenCache, TokenKind};
pub use transport::{HttpTransport, Transport};

use wikisync_core::config::{WikiConfig, WikiMode};

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of a single page mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// The page did not exist and was written.
    Created { title: String },
    /// The page existed with different content and was overwritten.
    Updated { title: String },
    /// Trimmed content already matched; nothing was sent.
    Unchanged { title: String },
    /// The page was removed.
    Deleted { title: String },
    /// Delete requested for a page that was already gone (offline store only).
    AlreadyAbsent { title: String },
}

impl WriteResult {
    pub fn title(&self) -> &str {
        match self {
            WriteResult::Created { title }
            | WriteResult::Updated { title }
            | WriteResult::Unchanged { title }
            | WriteResult::Deleted { title }
            | WriteResult::AlreadyAbsent { title } => title,
        }
    }

    /// True when the wiki was actually modified.
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            WriteResult::Created { .. } | WriteResult::Updated { .. } | WriteResult::Deleted { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Page-level operations shared by the live and offline backends.
pub trait WikiGateway: Send + Sync {
    /// Current page content; [`WikiError::NotFound`] when the page is absent.
    fn get_content(&self, title: &str) -> Result<String, WikiError>;

    /// Write `text` unless the trimmed content is already identical.
    fn edit_page(&self, title: &str, text: &str, bot: bool) -> Result<WriteResult, WikiError>;

    fn delete_page(&self, title: &str, reason: &str) -> Result<WriteResult, WikiError>;

    /// All page titles starting with `prefix`. A `Template:` prefix restricts
    /// the listing to the template namespace.
    fn list_pages(&self, prefix: &str) -> Result<Vec<String>, WikiError>;

    fn exists(&self, title: &str) -> Result<bool, WikiError> {
        match self.get_content(title) {
            Ok(_) => Ok(true),
            Err(WikiError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Decide whether and how to write `text` over `current`.
///
/// Returns `None` when the trimmed contents match. Otherwise returns the edit
/// summary and the result to report once the write succeeds.
pub(crate) fn plan_edit(
    title: &str,
    current: Option<&str>,
    text: &str,
) -> Option<(String, WriteResult)> {
    let set_summary = || format!("Set: `{text}`");
    match current {
        None => Some((
            set_summary(),
            WriteResult::Created {
                title: title.to_string(),
            },
        )),
        Some(current) => {
            let current = current.trim();
            if current == text.trim() {
                return None;
            }
            let summary = if current.is_empty() {
                set_summary()
            } else {
                format!("`{current}` => `{text}`")
            };
            Some((
                summary,
                WriteResult::Updated {
                    title: title.to_string(),
                },
            ))
        }
    }
}

/// Build the gateway selected by `config`.
///
/// Live mode logs in immediately, so invalid credentials fail here.
pub fn connect(config: &WikiConfig) -> Result<Box<dyn WikiGateway>, WikiError> {
    match &config.mode {
        WikiMode::Offline { dir } => {
            tracing::info!(dir = %dir.display(), "offline mode enabled: writing wiki pages to files");
            Ok(Box::new(OfflineWiki::new(dir.clone())))
        }
        WikiMode::Live {
            api_url,
            credentials,
        } => {
            let transport = HttpTransport::new(api_url.clone(), config.extra_header.clone());
            let wiki = LiveWiki::connect(transport, Some(credentials.clone()))?;
            Ok(Box::new(wiki))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_page_is_created_with_set_summary() {
        let (summary, result) = plan_edit("T", None, "1.0.0").expect("write");
        assert_eq!(summary, "Set: `1.0.0`");
        assert!(matches!(result, WriteResult::Created { .. }));
    }

    #[test]
    fn whitespace_only_difference_is_unchanged() {
        assert!(plan_edit("T", Some("1.0.0\n"), "  1.0.0").is_none());
    }

    #[test]
    fn empty_page_gets_set_summary() {
        let (summary, result) = plan_edit("T", Some("  "), "MIT").expect("write");
        assert_eq!(summary, "Set: `MIT`");
        assert!(matches!(result, WriteResult::Updated { .. }));
    }

    #[test]
    fn changed_page_gets_transition_summary() {
        let (summary, _) = plan_edit("T", Some("1.0.0\n"), "1.1.0").expect("write");
        assert_eq!(summary, "`1.0.0` => `1.1.0`");
    }

    #[test]
    fn only_mutations_count_as_changes() {
        let t = || "T".to_string();
        assert!(WriteResult::Created { title: t() }.is_change());
        assert!(WriteResult::Deleted { title: t() }.is_change());
        assert!(!WriteResult::Unchanged { title: t() }.is_change());
        assert!(!WriteResult::AlreadyAbsent { title: t() }.is_change());
    }
}
