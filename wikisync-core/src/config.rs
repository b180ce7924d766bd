//! Startup configuration.
//!
//! All environment / flag resolution happens once in the binary; the values
//! here are passed explicitly into the gateway and registry client.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default registry base URL.
pub const DEFAULT_REGISTRY_URL: &str = "https://vpmm.dev";

/// Default directory for the offline page store.
pub const DEFAULT_OFFLINE_DIR: &str = "./wiki-output";

/// Timeout applied to every non-streaming HTTP request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Wiki bot credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Extra header sent with every wiki request (gateway authentication).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraHeader {
    pub name: String,
    pub value: String,
}

/// How the wiki gateway is backed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WikiMode {
    /// Live MediaWiki action API with bot login.
    Live {
        api_url: String,
        credentials: Credentials,
    },
    /// One file per page under `dir`.
    Offline { dir: PathBuf },
}

/// Fully resolved wiki configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiConfig {
    pub mode: WikiMode,
    pub extra_header: Option<ExtraHeader>,
}

impl WikiConfig {
    /// Resolve raw (possibly blank) inputs into a config.
    ///
    /// Offline mode is selected when neither username nor password is given.
    pub fn resolve(
        api_url: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
        header_name: Option<&str>,
        header_value: Option<&str>,
        offline_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let username = non_blank(username);
        let password = non_blank(password);
        let extra_header = match (non_blank(header_name), non_blank(header_value)) {
            (Some(name), Some(value)) => Some(ExtraHeader { name, value }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteHeader),
        };

        let mode = match (username, password) {
            (None, None) => WikiMode::Offline {
                dir: offline_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OFFLINE_DIR)),
            },
            (Some(username), Some(password)) => WikiMode::Live {
                api_url: non_blank(api_url).ok_or(ConfigError::MissingApiUrl)?,
                credentials: Credentials { username, password },
            },
            _ => return Err(ConfigError::IncompleteCredentials),
        };

        Ok(WikiConfig { mode, extra_header })
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.mode, WikiMode::Offline { .. })
    }
}

/// Package registry endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub base_url: String,
}

impl RegistryConfig {
    pub fn new(base_url: Option<&str>) -> Self {
        let base = non_blank(base_url).unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());
        RegistryConfig {
            base_url: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn packages_url(&self) -> String {
        format!("{}/packages", self.base_url)
    }

    pub fn stream_url(&self) -> String {
        format!("{}/sse", self.base_url)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
