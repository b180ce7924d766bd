//! `wikisync scan`: the managed page index.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use wikisync_sync::scan;

use super::GlobalArgs;

/// Arguments for `wikisync scan`.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct PageRow {
    #[tabled(rename = "package")]
    package: String,
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "tag")]
    tag: String,
    #[tabled(rename = "subpage")]
    subpage: String,
    #[tabled(rename = "title")]
    title: String,
}

impl ScanArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let wiki = global.connect_wiki()?;
        let index = scan(wiki.as_ref()).context("wiki scan failed")?;

        let rows: Vec<PageRow> = index
            .index
            .iter()
            .map(|(title, parsed)| PageRow {
                package: parsed.package.clone(),
                kind: parsed.kind.to_string(),
                tag: parsed.tag.clone(),
                subpage: parsed.subpage.clone().unwrap_or_default(),
                title: title.clone(),
            })
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to render scan JSON")?
            );
            return Ok(());
        }

        if rows.is_empty() {
            println!("No managed pages found.");
            return Ok(());
        }
        println!(
            "{} managed pages across {} packages",
            rows.len(),
            index.package_pages.len()
        );
        println!("{}", Table::new(rows).with(Style::rounded()));
        Ok(())
    }
}
