//! Domain types for registry packages.
//!
//! A [`Package`] is one immutable `(name, version)` record as returned by the
//! registry. Several records sharing a `name` form that package's version set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Author fanout is capped at this many `Author_N` subpages.
pub const MAX_AUTHORS: usize = 4;

/// Per-package version sets keyed by package name.
pub type VersionSet = BTreeMap<String, Vec<Package>>;

// ---------------------------------------------------------------------------
// Package
// ---------------------------------------------------------------------------

/// Author block attached to a package record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageAuthor {
    /// Comma-separated list of author names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A single package version as published by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(default)]
    pub author: PackageAuthor,
}

impl Package {
    /// Author names split on commas and trimmed, capped at [`MAX_AUTHORS`].
    ///
    /// Empty entries are kept so that slot numbers stay aligned with the
    /// position in the source list. Returns an empty vec when no author name
    /// is set.
    pub fn authors(&self) -> Vec<String> {
        let Some(raw) = self.author.name.as_deref() else {
            return Vec::new();
        };
        if raw.trim().is_empty() {
            return Vec::new();
        }
        raw.split(',')
            .map(|a| a.trim().to_string())
            .take(MAX_AUTHORS)
            .collect()
    }

    /// First non-blank listing URL, or an empty string.
    pub fn listing_url(&self) -> &str {
        self.urls
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|u| !u.trim().is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn license(&self) -> &str {
        self.license.as_deref().unwrap_or("")
    }
}

/// Group a flat registry listing into per-name version sets.
pub fn group_by_name(packages: impl IntoIterator<Item = Package>) -> VersionSet {
    let mut sets = VersionSet::new();
    for pkg in packages {
        sets.entry(pkg.name.clone()).or_default().push(pkg);
    }
    sets
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
