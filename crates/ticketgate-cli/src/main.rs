//! ticketgate CLI - event check-in from the command line
//!
//! Provides `ticketgate issue`, `ticketgate scan`, `ticketgate list` and
//! the other registry commands.

mod commands;
mod logging;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ticketgate_core::{FileStore, Registry, Settings};

use commands::report::ReportCommands;

#[derive(Parser)]
#[command(name = "ticketgate")]
#[command(about = "ticketgate - QR ticket issuing and door check-in")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the stores, tickets and template (defaults to current directory)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to <data-dir>/ticketgate.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log more to stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an invitee and generate their QR image and PDF ticket
    Issue {
        /// Invitee identifier (number or ID)
        #[arg(long)]
        id: String,
        /// Invitee name
        #[arg(long)]
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Regenerate the QR image and PDF ticket for a registered code
    Render {
        /// Invite code
        code: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate codes at the door
    Scan {
        /// Code to validate (reads one code per line from stdin if omitted)
        #[arg(value_name = "CODE", conflicts_with = "image")]
        code: Option<String>,
        /// Photo of a QR code to decode and validate
        #[arg(short, long)]
        image: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    #[command(flatten)]
    Report(ReportCommands),
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(0) => {}
        Ok(status) => std::process::exit(status),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let settings = Settings::load(cli.config.as_deref(), cli.data_dir.as_deref())
        .context("Failed to load configuration")?;
    logging::init(&settings, cli.verbose);

    let mut registry = Registry::open(FileStore::from_settings(&settings))
        .context("Failed to load invite codes")?;
    tracing::debug!(
        data_dir = %settings.data_dir.display(),
        codes = registry.len(),
        "Registry loaded"
    );

    match cli.command {
        Commands::Issue { id, name, json } => {
            commands::issue::issue(&settings, &mut registry, &id, &name, json)?;
            Ok(0)
        }
        Commands::Render { code, json } => {
            commands::issue::render(&settings, &registry, &code, json)?;
            Ok(0)
        }
        Commands::Scan { code, image, json } => {
            commands::scan::execute(&mut registry, code.as_deref(), image.as_deref(), json)
        }
        Commands::Report(action) => {
            commands::report::execute(action, &registry)?;
            Ok(0)
        }
    }
}
