//! Registry report commands
//!
//! Handles: ticketgate list/show/log/status

use clap::Subcommand;
use ticketgate_core::{CheckinError, DurableStore, InviteRecord, Registry};

/// Number of scans shown by `log` unless `--limit` is given
const DEFAULT_LOG_LIMIT: usize = 20;

/// Read-only registry commands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// List registered invite codes
    List {
        /// Only codes already redeemed
        #[arg(long, conflicts_with = "unused")]
        used: bool,
        /// Only codes not yet redeemed
        #[arg(long)]
        unused: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one invite code
    Show {
        /// Invite code
        code: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the latest scans, newest first
    Log {
        /// Maximum number of scans
        #[arg(short = 'n', long, default_value_t = DEFAULT_LOG_LIMIT)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show registered, used and remaining counts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Execute report command
pub fn execute<S: DurableStore>(
    cmd: ReportCommands,
    registry: &Registry<S>,
) -> anyhow::Result<()> {
    match cmd {
        ReportCommands::List { used, unused, json } => {
            let records: Vec<&InviteRecord> = registry
                .iter()
                .filter(|r| (!used || r.used) && (!unused || !r.used))
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No invite codes found.");
            } else {
                println!("Invite codes:");
                for r in records {
                    let state = if r.used { "used" } else { "unused" };
                    println!("  {} - {} [{state}]", r.code, display_name(&r.name));
                }
            }
        }
        ReportCommands::Show { code, json } => {
            let record = registry
                .get(&code)
                .ok_or(CheckinError::UnknownCode { code })?;

            if json {
                println!("{}", serde_json::to_string_pretty(record)?);
            } else {
                println!("Code: {}", record.code);
                println!("Name: {}", display_name(&record.name));
                println!("Used: {}", if record.used { "yes" } else { "no" });
            }
        }
        ReportCommands::Log { limit, json } => {
            let scans = registry.recent_scans(limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&scans)?);
            } else if scans.is_empty() {
                println!("No scans recorded yet.");
            } else {
                println!("Latest scans:");
                for s in scans {
                    println!(
                        "  {}  {} - {}",
                        s.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        s.code,
                        display_name(&s.name)
                    );
                }
            }
        }
        ReportCommands::Status { json } => {
            let stats = registry.stats();

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Registered: {}", stats.total);
                println!("Used: {}", stats.used);
                println!("Remaining: {}", stats.remaining);
            }
        }
    }

    Ok(())
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "(no name)"
    } else {
        name
    }
}
