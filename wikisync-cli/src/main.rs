//! wikisync: mirror VPM registry versions onto `Template:VPM/...` wiki pages.
//!
//! # Usage
//!
//! ```text
//! wikisync run
//! wikisync sync [--packages-file <path>] [--json]
//! wikisync scan [--json]
//! wikisync page get <title>
//! wikisync page put <title> (--text <text> | --file <path>) [--no-bot]
//! wikisync page delete <title> [--reason <text>]
//! wikisync page list [--prefix <prefix>]
//! ```
//!
//! With no wiki username and password configured, every command works
//! against the offline page store in `--offline-dir`.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{page::PageCommand, scan::ScanArgs, sync::SyncArgs, GlobalArgs};

#[derive(Parser, Debug)]
#[command(
    name = "wikisync",
    version,
    about = "Keep VPM package version pages on the wiki in sync with the registry",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Follow the registry change stream and sync after each quiet period.
    Run,

    /// Run one full sync pass and print the report.
    Sync(SyncArgs),

    /// List the managed pages currently on the wiki.
    Scan(ScanArgs),

    /// Read, write, delete or list individual pages.
    Page {
        #[command(subcommand)]
        command: PageCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    wikisync_daemon::init_tracing(cli.global.log_format()?);

    match cli.command {
        Commands::Run => commands::run::run(&cli.global),
        Commands::Sync(args) => args.run(&cli.global),
        Commands::Scan(args) => args.run(&cli.global),
        Commands::Page { command } => commands::page::run(command, &cli.global),
    }
}
