//! Version resolution: latest / stable / unstable selection over an unordered
//! version set.
//!
//! Registry versions are parsed leniently (`v1.2.3`, `1.2`, `1` are accepted);
//! page content that claims to be a version is parsed strictly. Selection is
//! always by semantic-version order, never by arrival order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use semver::Version;

use crate::types::{Package, VersionSet};

/// The resolved trio for one package. Each slot is absent when no version in
/// the set qualifies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionTrio {
    /// Highest valid version overall.
    pub latest: Option<Package>,
    /// Highest version without a prerelease component.
    pub stable: Option<Package>,
    /// Highest version with a prerelease component.
    pub unstable: Option<Package>,
}

impl VersionTrio {
    pub fn is_empty(&self) -> bool {
        self.latest.is_none()
    }
}

/// Parse a registry version string, tolerating a leading `v` and missing
/// minor/patch components.
pub fn parse_lenient(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    if let Ok(v) = Version::parse(trimmed) {
        return Some(v);
    }

    // Pad `1` / `1.2` (optionally followed by `-pre` / `+build`) to three parts.
    let split_at = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, rest) = trimmed.split_at(split_at);
    let parts = core.split('.').count();
    if core.is_empty() || parts >= 3 {
        return None;
    }
    let padded = format!("{core}{}{rest}", ".0".repeat(3 - parts));
    Version::parse(&padded).ok()
}

/// Parse page content as an exact `MAJOR.MINOR.PATCH[-PRE][+BUILD]` version.
pub fn parse_strict(raw: &str) -> Option<Version> {
    Version::parse(raw.trim()).ok()
}

/// Compute the trio for a single package's version set.
pub fn resolve(versions: &[Package]) -> VersionTrio {
    let mut latest: Option<(Version, &Package)> = None;
    let mut stable: Option<(Version, &Package)> = None;
    let mut unstable: Option<(Version, &Package)> = None;

    for pkg in versions {
        let Some(parsed) = parse_lenient(&pkg.version) else {
            tracing::debug!(package = %pkg.name, version = %pkg.version, "ignoring unparsable version");
            continue;
        };
        let bucket = if parsed.pre.is_empty() {
            &mut stable
        } else {
            &mut unstable
        };
        promote(bucket, &parsed, pkg);
        promote(&mut latest, &parsed, pkg);
    }

    VersionTrio {
        latest: latest.map(|(_, p)| p.clone()),
        stable: stable.map(|(_, p)| p.clone()),
        unstable: unstable.map(|(_, p)| p.clone()),
    }
}

fn promote<'a>(slot: &mut Option<(Version, &'a Package)>, candidate: &Version, pkg: &'a Package) {
    let replace = match slot {
        Some((best, _)) => *candidate > *best,
        None => true,
    };
    if replace {
        *slot = Some((candidate.clone(), pkg));
    }
}

/// Compute trios for every package that has at least one parsable version.
pub fn resolve_all(sets: &VersionSet) -> BTreeMap<String, VersionTrio> {
    sets.iter()
        .map(|(name, versions)| (name.clone(), resolve(versions)))
        .filter(|(_, trio)| !trio.is_empty())
        .collect()
}

/// Total order over version tags: parsable tags first in semantic version
/// order (lexical on ties), then unparsable tags in lexical order.
pub fn compare_tags(a: &str, b: &str) -> Ordering {
    match (parse_lenient(a), parse_lenient(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
