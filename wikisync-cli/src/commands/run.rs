//! `wikisync run`: the long-running daemon.

use anyhow::{Context, Result};

use super::GlobalArgs;

pub fn run(global: &GlobalArgs) -> Result<()> {
    let wiki = global.wiki_config()?;
    wikisync_daemon::start_blocking(global.registry_config(), &wiki)
        .context("daemon exited with error")
}
