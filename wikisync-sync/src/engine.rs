//! Gated create-or-update policy for managed pages.
//!
//! Main pages (`Latest_*` and specific-version pages) are never created here.
//! When one exists its content is brought up to date and the metadata
//! subpages beneath it are reconciled:
//!
//! | Subpage       | Content                                 |
//! |---------------|-----------------------------------------|
//! | `Description` | package description                     |
//! | `DisplayName` | display name                            |
//! | `License`     | license identifier                      |
//! | `VPM`         | first non-empty listing URL             |
//! | `Author_<n>`  | n-th comma-separated author (n ≤ 4)     |
//!
//! Author slots past the current author count are deleted when they still
//! exist. That is the only deletion the engine performs.

use std::collections::HashMap;

use serde::Serialize;

use wikisync_core::markup::escape;
use wikisync_core::title::{
    author_title, main_title, subpage_title, LatestKind, DESCRIPTION, DISPLAY_NAME, LICENSE,
    LISTING,
};
use wikisync_core::types::{Package, MAX_AUTHORS};
use wikisync_core::version::parse_strict;
use wikisync_wiki::{WikiError, WikiGateway, WriteResult};

use crate::error::SyncError;

pub const AUTHOR_REMOVED_REASON: &str = "Author removed from package";

/// A single page that could not be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFailure {
    pub title: String,
    pub error: String,
}

impl PageFailure {
    pub fn new(title: impl Into<String>, error: impl ToString) -> Self {
        PageFailure {
            title: title.into(),
            error: error.to_string(),
        }
    }
}

/// Writes and per-page failures produced by one engine call.
#[derive(Debug, Clone, Default)]
pub struct PageChanges {
    pub writes: Vec<WriteResult>,
    pub failures: Vec<PageFailure>,
}

impl PageChanges {
    fn record(&mut self, title: &str, result: Result<WriteResult, WikiError>) {
        match result {
            Ok(write) => self.writes.push(write),
            Err(err) => {
                tracing::warn!(title, error = %err, "page update failed");
                self.failures.push(PageFailure::new(title, err));
            }
        }
    }

    pub fn extend(&mut self, other: PageChanges) {
        self.writes.extend(other.writes);
        self.failures.extend(other.failures);
    }

    /// Number of writes that actually modified the wiki.
    pub fn changed(&self) -> usize {
        self.writes.iter().filter(|w| w.is_change()).count()
    }
}

/// Strictly parse a version page's content, returning the canonical form.
pub fn page_version(title: &str, content: &str) -> Result<String, SyncError> {
    parse_strict(content)
        .map(|v| v.to_string())
        .ok_or_else(|| SyncError::InvalidVersion {
            title: title.to_string(),
            content: content.trim().to_string(),
        })
}

pub struct GatedUpdater<'a> {
    wiki: &'a dyn WikiGateway,
}

impl<'a> GatedUpdater<'a> {
    pub fn new(wiki: &'a dyn WikiGateway) -> Self {
        GatedUpdater { wiki }
    }

    pub fn update_latest_version_pages(&self, pkg: &Package) -> Result<PageChanges, SyncError> {
        self.update_latest(LatestKind::Latest, pkg)
    }

    pub fn update_latest_stable_version_pages(
        &self,
        pkg: &Package,
    ) -> Result<PageChanges, SyncError> {
        self.update_latest(LatestKind::Stable, pkg)
    }

    pub fn update_latest_unstable_version_pages(
        &self,
        pkg: &Package,
    ) -> Result<PageChanges, SyncError> {
        self.update_latest(LatestKind::Unstable, pkg)
    }

    /// Write `pkg.version` to the `kind` main page and reconcile its
    /// subpages. An absent main page is a successful no-op.
    pub fn update_latest(&self, kind: LatestKind, pkg: &Package) -> Result<PageChanges, SyncError> {
        let title = main_title(&pkg.name, kind.segment());
        if !self.wiki.exists(&title)? {
            tracing::debug!(title = %title, "main page absent, skipping");
            return Ok(PageChanges::default());
        }

        let mut changes = PageChanges::default();
        changes
            .writes
            .push(self.wiki.edit_page(&title, &escape(&pkg.version), true)?);
        changes.extend(self.update_subpages(&pkg.name, kind.segment(), pkg));
        Ok(changes)
    }

    /// Reconcile the subpages of `Template:VPM/<package>/<tag>`.
    ///
    /// The page content, not its title, names the version. Pages holding
    /// something other than a strict semantic version are skipped with a
    /// warning, as are versions missing from `known`.
    pub fn process_specific_version_page(
        &self,
        package: &str,
        tag: &str,
        known: &HashMap<String, Package>,
    ) -> Result<PageChanges, SyncError> {
        let title = main_title(package, tag);
        let content = match self.wiki.get_content(&title) {
            Ok(content) => content,
            Err(err) if err.is_not_found() => return Ok(PageChanges::default()),
            Err(err) => return Err(err.into()),
        };

        let version = match page_version(&title, &content) {
            Ok(version) => version,
            Err(err @ SyncError::InvalidVersion { .. }) => {
                tracing::warn!(package, page = %title, error = %err, "skipping non-semver version page");
                return Ok(PageChanges::default());
            }
            Err(err) => return Err(err),
        };

        match known.get(&version) {
            Some(pkg) => Ok(self.update_subpages(package, tag, pkg)),
            None => {
                tracing::info!(package, version = %version, page = %title, "version not in registry, leaving page untouched");
                Ok(PageChanges::default())
            }
        }
    }

    /// Reconcile the metadata subpages under `<package>/<segment>`.
    ///
    /// Each page is attempted even when an earlier one fails.
    pub fn update_subpages(&self, package: &str, segment: &str, pkg: &Package) -> PageChanges {
        let mut changes = PageChanges::default();
        let fields = [
            (DESCRIPTION, pkg.description()),
            (DISPLAY_NAME, pkg.display_name.as_str()),
            (LICENSE, pkg.license()),
            (LISTING, pkg.listing_url()),
        ];
        for (subpage, value) in fields {
            let title = subpage_title(package, segment, subpage);
            changes.record(&title, self.wiki.edit_page(&title, &escape(value), true));
        }

        let authors = pkg.authors();
        for (i, author) in authors.iter().enumerate() {
            if author.is_empty() {
                continue;
            }
            let title = author_title(package, segment, i + 1);
            changes.record(&title, self.wiki.edit_page(&title, &escape(author), true));
        }
        for slot in authors.len() + 1..=MAX_AUTHORS {
            self.retire_author(&author_title(package, segment, slot), &mut changes);
        }
        changes
    }

    fn retire_author(&self, title: &str, changes: &mut PageChanges) {
        match self.wiki.exists(title) {
            Ok(false) => {}
            Ok(true) => {
                let result = self.wiki.delete_page(title, AUTHOR_REMOVED_REASON);
                changes.record(title, result);
            }
            Err(err) => changes.record(title, Err(err)),
        }
    }
}
