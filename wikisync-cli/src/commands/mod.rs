//! Subcommands and the connection settings they share.

pub mod page;
pub mod run;
pub mod scan;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use wikisync_core::config::{RegistryConfig, WikiConfig};
use wikisync_daemon::LogFormat;
use wikisync_wiki::WikiGateway;

/// Registry and wiki settings, from flags or the environment.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Package registry base URL.
    #[arg(long, env = "VPMM_API_BASE_URL", global = true)]
    pub registry_url: Option<String>,

    /// MediaWiki action API endpoint (`.../api.php`).
    #[arg(long, env = "VRCWIKI_API_URL", global = true)]
    pub wiki_api_url: Option<String>,

    /// Bot username. Leave unset together with the password for offline mode.
    #[arg(long, env = "VRCWIKI_USERNAME", global = true)]
    pub wiki_username: Option<String>,

    #[arg(long, env = "VRCWIKI_PASSWORD", global = true, hide_env_values = true)]
    pub wiki_password: Option<String>,

    /// Extra header sent with every wiki request.
    #[arg(long, env = "VRCWIKI_AUTHORIZATION_HEADER", global = true)]
    pub wiki_auth_header: Option<String>,

    #[arg(
        long,
        env = "VRCWIKI_AUTHORIZATION_VALUE",
        global = true,
        hide_env_values = true
    )]
    pub wiki_auth_value: Option<String>,

    /// Directory for the offline page store.
    #[arg(long, env = "WIKISYNC_OFFLINE_DIR", global = true)]
    pub offline_dir: Option<PathBuf>,

    /// Log output format: text or json.
    #[arg(long, env = "WIKISYNC_LOG_FORMAT", global = true, default_value = "text")]
    pub log_format: String,
}

impl GlobalArgs {
    pub fn log_format(&self) -> Result<LogFormat> {
        LogFormat::from_name(&self.log_format).context("invalid --log-format")
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::new(self.registry_url.as_deref())
    }

    pub fn wiki_config(&self) -> Result<WikiConfig> {
        WikiConfig::resolve(
            self.wiki_api_url.as_deref(),
            self.wiki_username.as_deref(),
            self.wiki_password.as_deref(),
            self.wiki_auth_header.as_deref(),
            self.wiki_auth_value.as_deref(),
            self.offline_dir.clone(),
        )
        .context("invalid wiki configuration")
    }

    /// Resolve the wiki config and connect. Live mode logs in here.
    pub fn connect_wiki(&self) -> Result<Box<dyn WikiGateway>> {
        let config = self.wiki_config()?;
        wikisync_wiki::connect(&config).context("failed to connect to the wiki")
    }
}
