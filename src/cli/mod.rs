pub mod args;
pub mod calls;

pub use args::{CallsCliArgs, Cli, CliCommand, ExportCliArgs};
pub use calls::{handle_calls_command, handle_export_command, handle_summary_command};
