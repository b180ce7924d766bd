//! Directory-backed stand-in for the live wiki.
//!
//! One `.md` file per page. Titles are first brought to the wiki's canonical
//! spelling (`_` and ` ` are the same character), then flattened into
//! filesystem-safe names. Flattening is lossy, so a `_titles.json` manifest
//! records the canonical title each file holds. Listing reads the manifest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{io_err, WikiError};
use crate::{plan_edit, WikiGateway, WriteResult};

pub const PAGE_EXTENSION: &str = "md";
pub const MANIFEST_FILE: &str = "_titles.json";
const EMPTY_NAME: &str = "page";
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Canonical spelling of a title: underscores read as spaces, outer
/// whitespace dropped.
pub fn canonical_title(title: &str) -> String {
    title.trim().replace('_', " ")
}

/// Flatten a page title into a file name.
///
/// Control and path-special characters become `_`, runs of `_` collapse to
/// one, and leading/trailing spaces and underscores are dropped.
pub fn sanitize_filename(title: &str) -> String {
    let mut out = String::with_capacity(title.len() + 3);
    let mut prev_underscore = false;
    for c in title.trim().chars() {
        let c = if c.is_control() || FORBIDDEN.contains(&c) {
            '_'
        } else {
            c
        };
        if c == '_' {
            if prev_underscore {
                continue;
            }
            prev_underscore = true;
        } else {
            prev_underscore = false;
        }
        out.push(c);
    }
    let trimmed = out.trim_matches(|c| c == ' ' || c == '_');
    let stem = if trimmed.is_empty() { EMPTY_NAME } else { trimmed };
    format!("{stem}.{PAGE_EXTENSION}")
}

#[derive(Debug)]
pub struct OfflineWiki {
    dir: PathBuf,
    // Serializes manifest read-modify-write cycles.
    manifest_lock: Mutex<()>,
}

impl OfflineWiki {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        OfflineWiki {
            dir: dir.into(),
            manifest_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn page_path(&self, title: &str) -> PathBuf {
        self.dir.join(sanitize_filename(&canonical_title(title)))
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    fn load_manifest(&self) -> Result<BTreeMap<String, String>, WikiError> {
        let path = self.manifest_path();
        match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                WikiError::malformed("manifest", format!("{}: {e}", path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(io_err(path, e)),
        }
    }

    fn save_manifest(&self, manifest: &BTreeMap<String, String>) -> Result<(), WikiError> {
        let json = serde_json::to_string_pretty(manifest)
            .map_err(|e| WikiError::malformed("manifest", e.to_string()))?;
        atomic_write(&self.manifest_path(), &json)
    }

    fn record(&self, title: &str, present: bool) -> Result<(), WikiError> {
        let _guard = self.manifest_lock.lock();
        let mut manifest = self.load_manifest()?;
        let title = canonical_title(title);
        let file = sanitize_filename(&title);
        let changed = if present {
            manifest.insert(file, title.clone()).as_deref() != Some(title.as_str())
        } else {
            manifest.remove(&file).is_some()
        };
        if changed {
            self.save_manifest(&manifest)?;
        }
        Ok(())
    }
}

/// Write to `<path>.tmp` and rename over `path`.
fn atomic_write(path: &Path, content: &str) -> Result<(), WikiError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

impl WikiGateway for OfflineWiki {
    fn get_content(&self, title: &str) -> Result<String, WikiError> {
        let path = self.page_path(title);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(WikiError::NotFound {
                title: title.to_string(),
            }),
            Err(e) => Err(io_err(path, e)),
        }
    }

    fn edit_page(&self, title: &str, text: &str, bot: bool) -> Result<WriteResult, WikiError> {
        let current = match self.get_content(title) {
            Ok(content) => Some(content),
            Err(WikiError::NotFound { .. }) => None,
            Err(err) => return Err(err),
        };
        let Some((summary, result)) = plan_edit(title, current.as_deref(), text) else {
            tracing::debug!(title, "offline page unchanged");
            return Ok(WriteResult::Unchanged {
                title: title.to_string(),
            });
        };

        let path = self.page_path(title);
        atomic_write(&path, text)?;
        self.record(title, true)?;
        tracing::info!(title, file = %path.display(), bot, summary = %summary, "offline write success");
        Ok(result)
    }

    fn delete_page(&self, title: &str, reason: &str) -> Result<WriteResult, WikiError> {
        let path = self.page_path(title);
        let result = match std::fs::remove_file(&path) {
            Ok(()) => WriteResult::Deleted {
                title: title.to_string(),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => WriteResult::AlreadyAbsent {
                title: title.to_string(),
            },
            Err(e) => return Err(io_err(path, e)),
        };
        self.record(title, false)?;
        tracing::info!(title, file = %path.display(), reason = reason.trim(), "offline delete success");
        Ok(result)
    }

    fn list_pages(&self, prefix: &str) -> Result<Vec<String>, WikiError> {
        let manifest = {
            let _guard = self.manifest_lock.lock();
            self.load_manifest()?
        };
        let prefix = canonical_title(prefix);
        let mut titles: Vec<String> = manifest
            .into_iter()
            .filter(|(file, title)| title.starts_with(&prefix) && self.dir.join(file).is_file())
            .map(|(_, title)| title)
            .collect();
        titles.sort();
        Ok(titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sanitizes_path_characters() {
        assert_eq!(
            sanitize_filename("Template:VPM/com.foo/Latest version"),
            "Template_VPM_com.foo_Latest version.md"
        );
    }

    #[test]
    fn collapses_and_trims_underscores() {
        assert_eq!(sanitize_filename("  a//\\\\b  "), "a_b.md");
        assert_eq!(sanitize_filename("__x__"), "x.md");
        assert_eq!(sanitize_filename("a\tb\nc"), "a_b_c.md");
    }

    #[test]
    fn empty_title_gets_placeholder() {
        assert_eq!(sanitize_filename(""), "page.md");
        assert_eq!(sanitize_filename("/:?*"), "page.md");
    }

    #[test]
    fn write_read_and_delete_roundtrip() {
        let dir = TempDir::new().unwrap();
        let wiki = OfflineWiki::new(dir.path().join("out"));
        let title = "Template:VPM/a/Latest version";

        assert!(!wiki.exists(title).unwrap());
        let created = wiki.edit_page(title, "1.0.0", true).unwrap();
        assert!(matches!(created, WriteResult::Created { .. }));
        assert_eq!(wiki.get_content(title).unwrap(), "1.0.0");

        let again = wiki.edit_page(title, "1.0.0\n", true).unwrap();
        assert!(matches!(again, WriteResult::Unchanged { .. }));

        let updated = wiki.edit_page(title, "1.1.0", true).unwrap();
        assert!(matches!(updated, WriteResult::Updated { .. }));

        let deleted = wiki.delete_page(title, "gone").unwrap();
        assert!(matches!(deleted, WriteResult::Deleted { .. }));
        assert!(!wiki.exists(title).unwrap());
    }

    #[test]
    fn deleting_missing_page_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let wiki = OfflineWiki::new(dir.path());
        let result = wiki.delete_page("Template:VPM/a/Author_4", "").unwrap();
        assert!(matches!(result, WriteResult::AlreadyAbsent { .. }));
    }

    #[test]
    fn listing_returns_original_titles_by_prefix() {
        let dir = TempDir::new().unwrap();
        let wiki = OfflineWiki::new(dir.path());
        wiki.edit_page("Template:VPM/b/1.0.0", "1.0.0", true).unwrap();
        wiki.edit_page("Template:VPM/a/Latest version", "1.0.0", true).unwrap();
        wiki.edit_page("Main Page", "hello", false).unwrap();

        let titles = wiki.list_pages("Template:VPM/").unwrap();
        assert_eq!(
            titles,
            vec!["Template:VPM/a/Latest version", "Template:VPM/b/1.0.0"]
        );
    }

    #[test]
    fn underscore_and_space_spellings_are_one_page() {
        let dir = TempDir::new().unwrap();
        let wiki = OfflineWiki::new(dir.path());
        wiki.edit_page("Template:VPM/foo/Latest version", "1.0.0", false)
            .unwrap();

        assert!(wiki.exists("Template:VPM/foo/Latest_version").unwrap());
        let result = wiki
            .edit_page("Template:VPM/foo/Latest_version", "2.0.0", true)
            .unwrap();
        assert!(matches!(result, WriteResult::Updated { .. }));
        assert_eq!(
            wiki.get_content("Template:VPM/foo/Latest version").unwrap(),
            "2.0.0"
        );
        assert_eq!(
            wiki.list_pages("Template:VPM/foo/Latest_").unwrap(),
            vec!["Template:VPM/foo/Latest version"]
        );
    }

    #[test]
    fn listing_skips_files_removed_behind_its_back() {
        let dir = TempDir::new().unwrap();
        let wiki = OfflineWiki::new(dir.path());
        wiki.edit_page("Template:VPM/a/1.0.0", "1.0.0", true).unwrap();
        std::fs::remove_file(wiki.page_path("Template:VPM/a/1.0.0")).unwrap();
        assert!(wiki.list_pages("Template:VPM/").unwrap().is_empty());
    }
}
