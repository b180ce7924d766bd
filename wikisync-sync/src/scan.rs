//! One-shot enumeration of every managed page on the wiki.

use std::collections::BTreeMap;

use wikisync_core::title::{parse_title, PageKind, ParsedTitle, PAGE_PREFIX};
use wikisync_renderer::KnownVersionTags;
use wikisync_wiki::WikiGateway;

use crate::error::SyncError;

/// Managed pages found in a single listing.
#[derive(Debug, Clone, Default)]
pub struct WikiScan {
    /// Title → parsed classification.
    pub index: BTreeMap<String, ParsedTitle>,
    /// Package → every managed title under it.
    pub package_pages: BTreeMap<String, Vec<String>>,
    /// Package → tags of its specific-version main pages.
    pub known_tags: KnownVersionTags,
}

impl WikiScan {
    pub fn from_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut scan = WikiScan::default();
        for title in titles {
            let title = title.into();
            let Some(parsed) = parse_title(&title) else {
                continue;
            };
            scan.package_pages
                .entry(parsed.package.clone())
                .or_default()
                .push(title.clone());
            if parsed.kind == PageKind::Version && !parsed.tag.trim().is_empty() {
                scan.known_tags
                    .entry(parsed.package.clone())
                    .or_default()
                    .insert(parsed.tag.clone());
            }
            scan.index.insert(title, parsed);
        }
        scan
    }

    pub fn has_page(&self, title: &str) -> bool {
        self.index.contains_key(title)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// List everything under the managed prefix and classify it.
pub fn scan(wiki: &dyn WikiGateway) -> Result<WikiScan, SyncError> {
    let titles = wiki.list_pages(PAGE_PREFIX)?;
    let scan = WikiScan::from_titles(titles);
    tracing::info!(
        pages = scan.len(),
        packages = scan.package_pages.len(),
        "scanned managed wiki pages"
    );
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_pages_and_collects_version_tags() {
        let scan = WikiScan::from_titles([
            "Template:VPM/Foo/Latest_version",
            "Template:VPM/Foo/Latest_version/Description",
            "Template:VPM/Foo/2.1.0",
            "Template:VPM/Foo/2.1.0/License",
            "Template:VPM/Version summary",
            "Main Page",
        ]);

        assert_eq!(scan.len(), 4);
        assert_eq!(scan.package_pages["Foo"].len(), 4);
        assert_eq!(
            scan.known_tags["Foo"].iter().collect::<Vec<_>>(),
            vec!["2.1.0"]
        );
        assert!(!scan.has_page("Template:VPM/Version summary"));
    }

    #[test]
    fn duplicate_tags_collapse() {
        let scan = WikiScan::from_titles(["Template:VPM/Foo/1.0.0", "Template:VPM/Foo/1.0.0"]);
        assert_eq!(scan.known_tags["Foo"].len(), 1);
    }
}
