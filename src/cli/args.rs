use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "calldesk")]
#[command(about = "Transcribe sales calls, classify outcomes and browse call records", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the HTTP service (default)
    Serve,
    /// List stored calls
    Calls(CallsCliArgs),
    /// Export every call as CSV
    Export(ExportCliArgs),
    /// Print dashboard counters
    Summary,
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug, Default)]
pub struct CallsCliArgs {
    /// Filter by status (active, connected, ended, All)
    #[arg(short, long)]
    pub status: Option<String>,
    /// Lower bound on start time (e.g. 2024-05-01)
    #[arg(long)]
    pub from: Option<String>,
    /// Upper bound on start time (e.g. 2024-05-31 23:59:59)
    #[arg(long)]
    pub to: Option<String>,
    /// Minimum call duration in seconds
    #[arg(short = 'd', long)]
    pub min_duration: Option<i64>,
    /// Case-insensitive search over customer, phone, outcome and transcript
    #[arg(short = 'q', long)]
    pub search: Option<String>,
    /// Show the full record for one call id
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(ClapArgs, Debug, Default)]
pub struct ExportCliArgs {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
