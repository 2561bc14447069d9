//! CLI handlers for browsing call records offline.
//!
//! Terminal presentation only; queries go through the `records` module.

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use std::io::Write;

use super::args::{CallsCliArgs, ExportCliArgs};
use crate::config::Config;
use crate::db::{self, CallFilter};
use crate::records::{self, CallDetail, CallSummary};

fn open_db() -> Result<Connection> {
    let config = Config::load()?;
    db::init_db(&config.database_path()?)
}

impl CallsCliArgs {
    pub fn to_filter(&self) -> CallFilter {
        let mut filter = CallFilter::new().with_date_range(self.from.clone(), self.to.clone());
        if let Some(status) = &self.status {
            filter = filter.with_status(status.clone());
        }
        if let Some(seconds) = self.min_duration {
            filter = filter.with_min_duration(seconds);
        }
        if let Some(search) = &self.search {
            filter = filter.with_search(search.clone());
        }
        filter
    }
}

pub fn handle_calls_command(args: CallsCliArgs) -> Result<()> {
    let conn = open_db()?;

    if let Some(id) = args.id.as_deref() {
        let detail = records::detail(&conn, id)?
            .ok_or_else(|| anyhow!("Call {} not found", id))?;
        print!("{}", format_detail(&detail)?);
        return Ok(());
    }

    let calls = records::list(&conn, &args.to_filter())?;

    if calls.is_empty() {
        println!("No calls found matching your criteria.");
        return Ok(());
    }

    println!("Found {} call(s):\n", calls.len());
    for call in &calls {
        println!("{}", format_row(call));
    }

    println!("\nTo see a full record, use: calldesk calls --id <ID>");

    Ok(())
}

pub fn handle_export_command(args: ExportCliArgs) -> Result<()> {
    let conn = open_db()?;
    let csv = records::export_csv(&conn)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &csv)
                .with_context(|| format!("Failed to write CSV to {:?}", path))?;
            println!(
                "Exported {} call(s) to {}",
                csv.lines().count().saturating_sub(1),
                path.display()
            );
        }
        None => {
            std::io::stdout()
                .write_all(csv.as_bytes())
                .context("Failed to write CSV to stdout")?;
        }
    }

    Ok(())
}

pub fn handle_summary_command() -> Result<()> {
    let conn = open_db()?;
    let stats = records::summary(&conn)?;

    println!("Active calls:    {}", stats.active_calls);
    println!("Ended calls:     {}", stats.total_calls);
    println!("Connected calls: {}", stats.connected_calls);
    println!("Success rate:    {:.2}%", stats.success_rate);

    let outcomes = records::outcome_breakdown(&conn)?;
    if !outcomes.is_empty() {
        println!("\nOutcomes (ended calls):");
        for point in outcomes {
            println!("  {:<15} {}", point.label, point.value);
        }
    }

    Ok(())
}

fn format_row(call: &CallSummary) -> String {
    format!(
        "{}  {}  {:<9} {:>8}  {:<14} {:.2}  {} ({})",
        call.id,
        call.start_time,
        call.status,
        call.duration,
        call.outcome,
        call.sentiment,
        call.customer,
        call.phone
    )
}

fn format_detail(detail: &CallDetail) -> Result<String> {
    let entities =
        serde_json::to_string_pretty(&detail.entities).context("Failed to format entities")?;
    let summary = &detail.summary;

    Ok(format!(
        "ID: {}\nCustomer: {}\nPhone: {}\nStarted: {}\nDuration: {}\nStatus: {}\nOutcome: {} ({:.2})\nAudio: {}\nEntities: {}\nTranscript:\n{}\n",
        summary.id,
        summary.customer,
        summary.phone,
        summary.start_time,
        summary.duration,
        summary.status,
        summary.outcome,
        summary.sentiment,
        if detail.audio_url.is_empty() { "-" } else { detail.audio_url.as_str() },
        entities,
        detail.transcript
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CallRecord;

    #[test]
    fn test_args_to_filter() {
        let args = CallsCliArgs {
            status: Some("ended".to_string()),
            min_duration: Some(30),
            search: Some("raj".to_string()),
            ..Default::default()
        };
        let filter = args.to_filter();
        assert_eq!(filter.status.as_deref(), Some("ended"));
        assert_eq!(filter.min_duration, Some(30));
        assert_eq!(filter.search.as_deref(), Some("raj"));
        assert!(filter.from.is_none());
    }

    #[test]
    fn test_format_detail_without_audio() {
        let mut call = CallRecord::new("abc", "2024-05-01 10:00:00");
        call.transcript = "Hello there".to_string();
        let text = format_detail(&CallDetail::from(call)).unwrap();

        assert!(text.contains("ID: abc"));
        assert!(text.contains("Audio: -"));
        assert!(text.ends_with("Hello there\n"));
    }
}
