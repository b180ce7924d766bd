//! `wikisync page`: manual page operations through the configured gateway.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use wikisync_core::title::PAGE_PREFIX;
use wikisync_wiki::WriteResult;

use super::GlobalArgs;

#[derive(Subcommand, Debug)]
pub enum PageCommand {
    /// Print a page's content.
    Get { title: String },
    /// Write a page, creating it when absent.
    Put(PutArgs),
    /// Delete a page.
    Delete {
        title: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// List page titles under a prefix.
    List {
        #[arg(long, default_value = PAGE_PREFIX)]
        prefix: String,
    },
}

#[derive(Args, Debug)]
pub struct PutArgs {
    pub title: String,

    /// Page content.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub text: Option<String>,

    /// Read page content from a file.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Do not flag the edit as a bot edit.
    #[arg(long)]
    pub no_bot: bool,
}

pub fn run(command: PageCommand, global: &GlobalArgs) -> Result<()> {
    let wiki = global.connect_wiki()?;

    match command {
        PageCommand::Get { title } => {
            let content = wiki
                .get_content(&title)
                .with_context(|| format!("failed to read '{title}'"))?;
            println!("{content}");
        }
        PageCommand::Put(args) => {
            let text = match (&args.text, &args.file) {
                (Some(text), _) => text.clone(),
                (None, Some(path)) => std::fs::read_to_string(path)
                    .with_context(|| format!("read {}", path.display()))?,
                (None, None) => anyhow::bail!("provide --text or --file"),
            };
            let result = wiki
                .edit_page(&args.title, &text, !args.no_bot)
                .with_context(|| format!("failed to write '{}'", args.title))?;
            print_result(&result);
        }
        PageCommand::Delete { title, reason } => {
            let result = wiki
                .delete_page(&title, &reason)
                .with_context(|| format!("failed to delete '{title}'"))?;
            print_result(&result);
        }
        PageCommand::List { prefix } => {
            let titles = wiki
                .list_pages(&prefix)
                .with_context(|| format!("failed to list pages under '{prefix}'"))?;
            for title in titles {
                println!("{title}");
            }
        }
    }

    Ok(())
}

fn print_result(result: &WriteResult) {
    let verb = match result {
        WriteResult::Created { .. } => "created",
        WriteResult::Updated { .. } => "updated",
        WriteResult::Unchanged { .. } => "unchanged",
        WriteResult::Deleted { .. } => "deleted",
        WriteResult::AlreadyAbsent { .. } => "already absent",
    };
    println!("{verb}: {}", result.title());
}
