use anyhow::Result;
use calldesk::{
    app,
    cli::{
        handle_calls_command, handle_export_command, handle_summary_command, Cli, CliCommand,
    },
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output such as CSV exports
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("calldesk {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(CliCommand::Calls(args)) => {
            handle_calls_command(args)?;
            return Ok(());
        }
        Some(CliCommand::Export(args)) => {
            handle_export_command(args)?;
            return Ok(());
        }
        Some(CliCommand::Summary) => {
            handle_summary_command()?;
            return Ok(());
        }
        Some(CliCommand::Serve) | None => {}
    }

    app::run_service().await
}
