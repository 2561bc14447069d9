//! Read-side views over stored calls.
//!
//! Dashboard statistics, list/detail shapes and CSV export. Shared by the
//! REST API and the CLI.

use anyhow::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::db::{CallFilter, CallRecord, CallRepository, CallStatus};

pub const CSV_HEADER: &str = "Customer,Phone,Start Time,Duration,Status,Outcome,Sentiment,Audio File";

/// Counters shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub active_calls: i64,
    /// Calls that reached `ended`
    pub total_calls: i64,
    /// Calls that are `connected` or `ended`
    pub connected_calls: i64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: i64,
}

impl ChartPoint {
    fn new(label: impl Into<String>, value: i64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// A call as it appears in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSummary {
    pub id: String,
    pub customer: String,
    pub phone: String,
    pub start_time: String,
    pub duration: String,
    pub status: String,
    pub outcome: String,
    pub sentiment: f64,
}

impl From<&CallRecord> for CallSummary {
    fn from(call: &CallRecord) -> Self {
        Self {
            id: call.id.clone(),
            customer: call.customer.clone(),
            phone: call.phone.clone(),
            start_time: call.start_time.clone(),
            duration: call.duration.clone(),
            status: call.status.as_str().to_string(),
            outcome: call.outcome.as_str().to_string(),
            sentiment: call.sentiment,
        }
    }
}

/// A single call with its transcript, audio link and entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDetail {
    #[serde(flatten)]
    pub summary: CallSummary,
    pub transcript: String,
    pub audio_url: String,
    pub entities: Map<String, Value>,
}

impl From<CallRecord> for CallDetail {
    fn from(call: CallRecord) -> Self {
        Self {
            summary: CallSummary::from(&call),
            audio_url: call.audio_url(),
            transcript: call.transcript,
            entities: call.entities,
        }
    }
}

pub fn summary(conn: &Connection) -> Result<SummaryStats> {
    let active_calls = CallRepository::count_with_status(conn, &[CallStatus::Active])?;
    let total_calls = CallRepository::count_with_status(conn, &[CallStatus::Ended])?;
    let connected_calls =
        CallRepository::count_with_status(conn, &[CallStatus::Connected, CallStatus::Ended])?;

    Ok(SummaryStats {
        active_calls,
        total_calls,
        connected_calls,
        success_rate: success_rate(connected_calls, total_calls),
    })
}

/// `connected / total * 100` to two places, 0 when nothing has ended.
pub fn success_rate(connected: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = connected as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

/// Two buckets: active calls, and ended calls under the "Connected" label.
pub fn status_breakdown(conn: &Connection) -> Result<Vec<ChartPoint>> {
    let active = CallRepository::count_with_status(conn, &[CallStatus::Active])?;
    let ended = CallRepository::count_with_status(conn, &[CallStatus::Ended])?;

    Ok(vec![
        ChartPoint::new("Active", active),
        ChartPoint::new("Connected", ended),
    ])
}

pub fn outcome_breakdown(conn: &Connection) -> Result<Vec<ChartPoint>> {
    Ok(CallRepository::ended_outcome_counts(conn)?
        .into_iter()
        .map(|(label, value)| ChartPoint::new(label, value))
        .collect())
}

pub fn list(conn: &Connection, filter: &CallFilter) -> Result<Vec<CallSummary>> {
    Ok(CallRepository::list(conn, filter)?
        .iter()
        .map(CallSummary::from)
        .collect())
}

pub fn detail(conn: &Connection, id: &str) -> Result<Option<CallDetail>> {
    Ok(CallRepository::get(conn, id)?.map(CallDetail::from))
}

/// Every stored call as CSV, in insertion order, newline-terminated rows.
pub fn export_csv(conn: &Connection) -> Result<String> {
    let calls = CallRepository::all(conn)?;
    Ok(render_csv(&calls))
}

pub fn render_csv(calls: &[CallRecord]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + calls.len() * 128);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for call in calls {
        let row = [
            quote(&call.customer),
            quote(&call.phone),
            quote(&call.start_time),
            quote(&call.duration),
            quote(call.status.as_str()),
            quote(call.outcome.as_str()),
            format_sentiment(call.sentiment),
            quote(&call.audio_filename),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Whole numbers keep one decimal place (`1.0`, not `1`).
fn format_sentiment(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{migrate, Outcome};
    use crate::lifecycle;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn insert(conn: &Connection, id: &str, status: CallStatus, outcome: Outcome) -> CallRecord {
        let mut call = CallRecord::new(id, "2024-05-01 10:00:00");
        call.status = status;
        call.outcome = outcome;
        CallRepository::insert(conn, &call).unwrap();
        call
    }

    #[test]
    fn test_summary_on_empty_store() {
        let conn = setup_db();
        let stats = summary(&conn).unwrap();
        assert_eq!(
            stats,
            SummaryStats {
                active_calls: 0,
                total_calls: 0,
                connected_calls: 0,
                success_rate: 0.0,
            }
        );
    }

    #[test]
    fn test_summary_counts() {
        let conn = setup_db();
        insert(&conn, "a", CallStatus::Active, Outcome::Pending);
        insert(&conn, "b", CallStatus::Connected, Outcome::Pending);
        insert(&conn, "c", CallStatus::Ended, Outcome::Interested);
        insert(&conn, "d", CallStatus::Ended, Outcome::Neutral);
        insert(&conn, "e", CallStatus::Ended, Outcome::Neutral);

        let stats = summary(&conn).unwrap();
        assert_eq!(stats.active_calls, 1);
        assert_eq!(stats.total_calls, 3);
        assert_eq!(stats.connected_calls, 4);
        assert_eq!(stats.success_rate, 133.33);
    }

    #[test]
    fn test_success_rate_rounding() {
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(success_rate(2, 3), 66.67);
        assert_eq!(success_rate(3, 3), 100.0);
    }

    #[test]
    fn test_status_breakdown_labels_ended_as_connected() {
        let conn = setup_db();
        insert(&conn, "a", CallStatus::Active, Outcome::Pending);
        insert(&conn, "b", CallStatus::Connected, Outcome::Pending);
        insert(&conn, "c", CallStatus::Ended, Outcome::Pending);

        assert_eq!(
            status_breakdown(&conn).unwrap(),
            vec![ChartPoint::new("Active", 1), ChartPoint::new("Connected", 1)]
        );
    }

    #[test]
    fn test_outcome_breakdown_only_ended_calls() {
        let conn = setup_db();
        insert(&conn, "a", CallStatus::Ended, Outcome::NotInterested);
        insert(&conn, "b", CallStatus::Active, Outcome::Interested);
        insert(&conn, "c", CallStatus::Ended, Outcome::Interested);
        insert(&conn, "d", CallStatus::Ended, Outcome::NotInterested);

        assert_eq!(
            outcome_breakdown(&conn).unwrap(),
            vec![
                ChartPoint::new("Not Interested", 2),
                ChartPoint::new("Interested", 1),
            ]
        );
    }

    #[test]
    fn test_detail_shape() {
        let conn = setup_db();
        let mut call = lifecycle::create(&conn).unwrap();
        call.audio_filename = "20240501100000-abcd1234.webm".to_string();
        call.transcript = "hello".to_string();
        CallRepository::update(&conn, &call).unwrap();

        let detail = detail(&conn, &call.id).unwrap().unwrap();
        assert_eq!(detail.audio_url, "/recording/20240501100000-abcd1234.webm");
        assert_eq!(detail.transcript, "hello");
        assert_eq!(detail.summary.status, "active");
        assert_eq!(detail.summary.outcome, "Pending");

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["id"], call.id.as_str());
        assert_eq!(json["sentiment"], 0.5);
        assert_eq!(json["entities"], serde_json::json!({}));

        assert!(super::detail(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_csv_quotes_fields_and_keeps_sentiment_bare() {
        let mut call = CallRecord::new("a", "2024-05-01 10:00:00");
        call.customer = "Mr. \"Raj\" Kumar".to_string();
        call.sentiment = 0.75;

        let csv = render_csv(&[call]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            r#""Mr. ""Raj"" Kumar","N/A","2024-05-01 10:00:00","N/A","active","Pending",0.75,"""#
        );
    }

    #[test]
    fn test_csv_row_count_matches_store() {
        let conn = setup_db();
        for id in ["a", "b", "c"] {
            insert(&conn, id, CallStatus::Active, Outcome::Pending);
        }

        let csv = export_csv(&conn).unwrap();
        assert_eq!(csv.lines().count(), 1 + CallRepository::all(&conn).unwrap().len());
    }

    #[test]
    fn test_format_sentiment() {
        assert_eq!(format_sentiment(1.0), "1.0");
        assert_eq!(format_sentiment(0.5), "0.5");
        assert_eq!(format_sentiment(0.0), "0.0");
    }
}
