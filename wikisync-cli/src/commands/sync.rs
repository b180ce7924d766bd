//! `wikisync sync`: one full reconciliation pass.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use wikisync_core::registry::{FilePackageSource, PackageSource, RegistryClient};
use wikisync_sync::{run_full_sync, PassReport};

use super::GlobalArgs;

/// Arguments for `wikisync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Read packages from a JSON snapshot instead of the registry.
    #[arg(long)]
    pub packages_file: Option<PathBuf>,

    /// Emit the pass report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let wiki = global.connect_wiki()?;
        let source: Box<dyn PackageSource> = match &self.packages_file {
            Some(path) => Box::new(FilePackageSource::new(path)),
            None => Box::new(RegistryClient::new(global.registry_config())),
        };

        let report = run_full_sync(source.as_ref(), wiki.as_ref()).context("full sync failed")?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to render report JSON")?
            );
        } else {
            print_report(&report);
        }

        if !report.is_clean() {
            bail!("{} page(s) failed to sync", report.failures.len());
        }
        Ok(())
    }
}

fn print_report(report: &PassReport) {
    let mark = if report.is_clean() {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!(
        "{mark} synced {} packages in {}ms ({} created, {} updated, {} unchanged, {} deleted)",
        report.packages,
        report.duration.as_millis(),
        report.created,
        report.updated,
        report.unchanged,
        report.deleted,
    );
    for failure in &report.failures {
        println!("  {}  {}: {}", "!".red(), failure.title, failure.error);
    }
}
