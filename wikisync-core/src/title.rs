//! Managed page title grammar.
//!
//! ```text
//! Template:VPM/<package>/<segment>[/<sub-segment>]
//! ```
//!
//! `<segment>` is one of the three `Latest …` pages (compared case- and
//! underscore-insensitively) or a literal version tag.

use std::fmt;

/// Namespace prefix shared by every page this system manages.
pub const PAGE_PREFIX: &str = "Template:VPM/";

/// Aggregate page listing all packages.
pub const SUMMARY_PAGE: &str = "Template:VPM/Version summary";

/// Metadata subpages reconciled beneath every managed main page.
pub const DESCRIPTION: &str = "Description";
pub const DISPLAY_NAME: &str = "DisplayName";
pub const LICENSE: &str = "License";
pub const LISTING: &str = "VPM";

/// Classification of a managed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageKind {
    LatestVersion,
    LatestVersionSubpage,
    LatestStableVersion,
    LatestStableVersionSubpage,
    LatestUnstableVersion,
    LatestUnstableVersionSubpage,
    Version,
    VersionSubpage,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::LatestVersion => "latest_version",
            PageKind::LatestVersionSubpage => "latest_version_subpage",
            PageKind::LatestStableVersion => "latest_stable_version",
            PageKind::LatestStableVersionSubpage => "latest_stable_version_subpage",
            PageKind::LatestUnstableVersion => "latest_unstable_version",
            PageKind::LatestUnstableVersionSubpage => "latest_unstable_version_subpage",
            PageKind::Version => "version",
            PageKind::VersionSubpage => "version_subpage",
        }
    }

    pub fn is_subpage(&self) -> bool {
        matches!(
            self,
            PageKind::LatestVersionSubpage
                | PageKind::LatestStableVersionSubpage
                | PageKind::LatestUnstableVersionSubpage
                | PageKind::VersionSubpage
        )
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three `Latest …` page families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatestKind {
    Latest,
    Stable,
    Unstable,
}

impl LatestKind {
    pub fn all() -> &'static [LatestKind] {
        &[LatestKind::Latest, LatestKind::Stable, LatestKind::Unstable]
    }

    /// Title segment as written on the wiki.
    pub fn segment(&self) -> &'static str {
        match self {
            LatestKind::Latest => "Latest_version",
            LatestKind::Stable => "Latest_stable_version",
            LatestKind::Unstable => "Latest_unstable_version",
        }
    }

    /// Human label used for links in the summary table.
    pub fn label(&self) -> &'static str {
        match self {
            LatestKind::Latest => "Latest version",
            LatestKind::Stable => "Latest stable version",
            LatestKind::Unstable => "Latest unstable version",
        }
    }

    fn main_kind(&self) -> PageKind {
        match self {
            LatestKind::Latest => PageKind::LatestVersion,
            LatestKind::Stable => PageKind::LatestStableVersion,
            LatestKind::Unstable => PageKind::LatestUnstableVersion,
        }
    }

    fn subpage_kind(&self) -> PageKind {
        match self {
            LatestKind::Latest => PageKind::LatestVersionSubpage,
            LatestKind::Stable => PageKind::LatestStableVersionSubpage,
            LatestKind::Unstable => PageKind::LatestUnstableVersionSubpage,
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        let normalized = segment.replace('_', " ").trim().to_lowercase();
        LatestKind::all()
            .iter()
            .copied()
            .find(|k| k.label().to_lowercase() == normalized)
    }
}

/// A managed title broken into its parts.
///
/// `tag` is the version tag for [`PageKind::Version`] / [`PageKind::VersionSubpage`],
/// and the subpage name for the `Latest …` subpage kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub package: String,
    pub kind: PageKind,
    pub tag: String,
    /// Subpage name for version subpages (`Description`, `Author_2`, …).
    pub subpage: Option<String>,
}

/// Parse a page title. Returns `None` for titles outside the managed prefix or
/// with fewer than two segments after the prefix.
pub fn parse_title(title: &str) -> Option<ParsedTitle> {
    let remainder = title.strip_prefix(PAGE_PREFIX)?;
    let parts: Vec<&str> = remainder.split('/').collect();
    if parts.len() < 2 || parts[0].is_empty() {
        return None;
    }
    let package = parts[0].to_string();
    let sub = parts.get(2).map(|s| s.to_string());

    let parsed = match LatestKind::from_segment(parts[1]) {
        Some(latest) => match sub {
            None => ParsedTitle {
                package,
                kind: latest.main_kind(),
                tag: String::new(),
                subpage: None,
            },
            Some(sub) => ParsedTitle {
                package,
                kind: latest.subpage_kind(),
                tag: sub.clone(),
                subpage: Some(sub),
            },
        },
        None => ParsedTitle {
            package,
            kind: if sub.is_some() {
                PageKind::VersionSubpage
            } else {
                PageKind::Version
            },
            tag: parts[1].to_string(),
            subpage: sub,
        },
    };
    Some(parsed)
}

/// Title of a main page: `Template:VPM/<package>/<segment>`.
pub fn main_title(package: &str, segment: &str) -> String {
    format!("{PAGE_PREFIX}{package}/{segment}")
}

/// Title of a metadata subpage beneath a main page.
pub fn subpage_title(package: &str, segment: &str, subpage: &str) -> String {
    format!("{PAGE_PREFIX}{package}/{segment}/{subpage}")
}

/// Title of the `Author_<slot>` subpage (slots are 1-based).
pub fn author_title(package: &str, segment: &str, slot: usize) -> String {
    subpage_title(package, segment, &format!("Author_{slot}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
