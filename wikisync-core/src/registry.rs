//! Package registry access.
//!
//! # Endpoints
//!
//! ```text
//! GET {base}/packages   -> JSON array of Package records (one per version)
//! GET {base}/sse        -> text/event-stream of package.added / .updated / .removed
//! ```
//!
//! The full-sync pass only needs [`PackageSource::list_packages`]; the change
//! stream is opened by the daemon through [`RegistryClient::open_change_stream`].

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{RegistryConfig, HTTP_TIMEOUT};
use crate::error::RegistryError;
use crate::types::Package;

/// Stream reads block at most this long before the consumer regains control.
pub const STREAM_READ_TIMEOUT: Duration = Duration::from_secs(90);

/// Anything that can produce the registry's flat package listing.
pub trait PackageSource: Send + Sync {
    fn list_packages(&self) -> Result<Vec<Package>, RegistryError>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Blocking HTTP client for the registry API.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    config: RegistryConfig,
    agent: ureq::Agent,
    stream_agent: ureq::Agent,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(HTTP_TIMEOUT).build();
        let stream_agent = ureq::AgentBuilder::new()
            .timeout_connect(HTTP_TIMEOUT)
            .timeout_read(STREAM_READ_TIMEOUT)
            .build();
        RegistryClient {
            config,
            agent,
            stream_agent,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Open the change stream, resuming after `last_event_id` when given.
    ///
    /// The returned reader yields raw `text/event-stream` bytes until the
    /// server closes the connection or a read times out.
    pub fn open_change_stream(
        &self,
        last_event_id: Option<&str>,
    ) -> Result<Box<dyn Read + Send + Sync + 'static>, RegistryError> {
        let url = self.config.stream_url();
        let mut request = self
            .stream_agent
            .get(&url)
            .set("Accept", "text/event-stream")
            .set("Cache-Control", "no-cache");
        if let Some(id) = last_event_id.filter(|id| !id.is_empty()) {
            request = request.set("Last-Event-ID", id);
        }
        let response = request.call()?;
        tracing::info!(url = %url, resume_from = ?last_event_id, "change stream connected");
        Ok(response.into_reader())
    }
}

impl PackageSource for RegistryClient {
    fn list_packages(&self) -> Result<Vec<Package>, RegistryError> {
        let url = self.config.packages_url();
        let response = self
            .agent
            .get(&url)
            .set("Accept", "application/json")
            .call()?;
        let packages: Vec<Package> = response
            .into_json()
            .map_err(|e| RegistryError::Decode(e.to_string()))?;
        tracing::debug!(count = packages.len(), "listed registry packages");
        Ok(packages)
    }
}

// ---------------------------------------------------------------------------
// File snapshot
// ---------------------------------------------------------------------------

/// Reads a JSON array of packages from disk on every call.
#[derive(Debug, Clone)]
pub struct FilePackageSource {
    path: PathBuf,
}

impl FilePackageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FilePackageSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PackageSource for FilePackageSource {
    fn list_packages(&self) -> Result<Vec<Package>, RegistryError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| RegistryError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|e| RegistryError::Decode(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_source_reads_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("packages.json");
        std::fs::write(
            &path,
            r#"[{"name":"a","version":"1.0.0"},{"name":"a","version":"1.1.0-rc.1"}]"#,
        )
        .unwrap();

        let pkgs = FilePackageSource::new(&path).list_packages().expect("list");
        assert_eq!(pkgs.len(), 2);
        assert_eq!(pkgs[1].version, "1.1.0-rc.1");
    }

    #[test]
    fn file_source_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = FilePackageSource::new(dir.path().join("nope.json"))
            .list_packages()
            .unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
    }

    #[test]
    fn file_source_reports_bad_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("packages.json");
        std::fs::write(&path, r#"{"not":"a list"}"#).unwrap();
        let err = FilePackageSource::new(&path).list_packages().unwrap_err();
        assert!(matches!(err, RegistryError::Decode(_)));
    }
}
