//! Standalone chain auditor.
//!
//! Verifies an exported ledger against the hash rule using only the public
//! entry types and the free verification function. Needs zero write
//! privileges; any member of the polity can run it against a copy of the
//! record.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use civitas_ledger::{verify_entries, LedgerEntry};

#[derive(Parser)]
#[command(name = "civitas-audit", about = "Verify a Civitas ledger export")]
#[command(version)]
struct Cli {
    /// Path to a JSON array of ledger entries, ordered by sequence number.
    entries: PathBuf,

    /// List every entry as it is verified.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let raw = match std::fs::read(&cli.entries) {
        Ok(raw) => raw,
        Err(e) => {
            error!(path = %cli.entries.display(), error = %e, "cannot read entries file");
            return ExitCode::FAILURE;
        }
    };

    let entries: Vec<LedgerEntry> = match serde_json::from_slice(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = %e, "entries file is not a JSON array of ledger entries");
            return ExitCode::FAILURE;
        }
    };

    if cli.verbose {
        for entry in &entries {
            println!(
                "{:>6}  {:<20}  {:<24}  {}",
                entry.sequence_number,
                format!("{:?}", entry.entry_type),
                entry.author_role,
                entry.entry_hash
            );
        }
    }

    match verify_entries(&entries) {
        Ok(report) => {
            println!(
                "chain verified: {} entries, tip {}",
                report.entries_verified, report.tip_hash
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "chain verification FAILED");
            ExitCode::FAILURE
        }
    }
}
