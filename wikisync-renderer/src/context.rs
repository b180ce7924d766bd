//! Summary table payload built from wiki-known version tags and registry
//! version sets.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use wikisync_core::title::{main_title, LatestKind};
use wikisync_core::types::{Package, VersionSet};
use wikisync_core::version::{self, compare_tags, VersionTrio};

use crate::error::RenderError;

/// Version tags found as page titles on the wiki, per package.
pub type KnownVersionTags = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Serialize)]
pub struct SummaryContext {
    pub rows: Vec<SummaryRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub name: String,
    pub display_name: String,
    pub links: Vec<SummaryLink>,
}

/// One bullet in a row's version cell.
///
/// `version` / `version_target` are set for the `Latest …` links, which
/// also point at the resolved version's own page.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SummaryLink {
    pub target: String,
    pub label: String,
    pub version: Option<String>,
    pub version_target: Option<String>,
}

impl SummaryLink {
    fn latest(package: &str, kind: LatestKind, resolved: &Package) -> Self {
        SummaryLink {
            target: main_title(package, kind.label()),
            label: kind.label().to_string(),
            version: Some(resolved.version.clone()),
            version_target: Some(main_title(package, &resolved.version)),
        }
    }

    fn version_page(package: &str, tag: &str) -> Self {
        SummaryLink {
            target: main_title(package, tag),
            label: tag.to_string(),
            version: None,
            version_target: None,
        }
    }
}

impl SummaryContext {
    /// Rows for every package named by either side, ordered
    /// case-insensitively by name.
    pub fn build(known_tags: &KnownVersionTags, sets: &VersionSet) -> Self {
        let mut names: Vec<&String> = sets.keys().chain(known_tags.keys()).collect();
        names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
        names.dedup();

        let empty: Vec<Package> = Vec::new();
        let rows = names
            .into_iter()
            .map(|name| {
                let versions = sets.get(name).unwrap_or(&empty);
                let trio = version::resolve(versions);
                SummaryRow {
                    name: name.clone(),
                    display_name: display_name(name, versions, &trio),
                    links: links(name, versions, &trio, known_tags.get(name)),
                }
            })
            .collect();
        SummaryContext { rows }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

fn display_name(name: &str, versions: &[Package], trio: &VersionTrio) -> String {
    trio.latest
        .iter()
        .chain(versions.iter())
        .map(|p| p.display_name.trim())
        .find(|d| !d.is_empty())
        .unwrap_or(name)
        .to_string()
}

fn links(
    name: &str,
    versions: &[Package],
    trio: &VersionTrio,
    known: Option<&BTreeSet<String>>,
) -> Vec<SummaryLink> {
    let mut out = Vec::new();
    let slots = [
        (LatestKind::Latest, &trio.latest),
        (LatestKind::Stable, &trio.stable),
        (LatestKind::Unstable, &trio.unstable),
    ];
    for (kind, resolved) in slots {
        if let Some(pkg) = resolved {
            out.push(SummaryLink::latest(name, kind, pkg));
        }
    }

    if let Some(known) = known {
        let real: BTreeSet<&str> = versions.iter().map(|p| p.version.as_str()).collect();
        let mut tags: Vec<&str> = known
            .iter()
            .map(String::as_str)
            .filter(|t| real.contains(t))
            .collect();
        tags.sort_by(|a, b| compare_tags(a, b));
        out.extend(tags.into_iter().map(|t| SummaryLink::version_page(name, t)));
    }
    out
}
