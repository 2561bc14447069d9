//! Call record persistence.
//!
//! CRUD operations for the `calls` table. Raw SQL with rusqlite, no ORM.
//! Status and date-range filters run in SQL; duration and free-text
//! matching run over the mapped rows.

use anyhow::{Context, Result};
use rusqlite::{params, types::Type, Connection, Row};
use serde::{Deserialize, Serialize};

use super::schemas::{CallRecord, CallStatus, Outcome};
use crate::lifecycle::parse_duration;

const SELECT_COLUMNS: &str = "SELECT id, status, start_time, end_time, audio_filename, transcript, \
     entities, outcome, sentiment, customer, phone, duration FROM calls";

/// Filters for listing calls. Every provided filter must match.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CallFilter {
    /// Exact status; `None` or `"All"` matches every status
    pub status: Option<String>,
    /// Inclusive lower bound on `start_time`
    pub from: Option<String>,
    /// Inclusive upper bound on `start_time`
    pub to: Option<String>,
    /// Minimum call length in seconds
    pub min_duration: Option<i64>,
    /// Case-insensitive substring over customer, phone, outcome and transcript
    pub search: Option<String>,
}

impl CallFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_date_range(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_min_duration(mut self, seconds: i64) -> Self {
        self.min_duration = Some(seconds);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    fn status_filter(&self) -> Option<&str> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty() && *s != "All")
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::to_lowercase)
            .filter(|s| !s.is_empty())
    }

    /// Filters that cannot be expressed in SQL.
    pub fn matches(&self, call: &CallRecord) -> bool {
        if let Some(min) = self.min_duration {
            match parse_duration(&call.duration) {
                Some(seconds) if seconds >= min => {}
                _ => return false,
            }
        }

        if let Some(term) = self.search_term() {
            let fields = [
                call.customer.as_str(),
                call.phone.as_str(),
                call.outcome.as_str(),
                call.transcript.as_str(),
            ];
            if !fields
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
            {
                return false;
            }
        }

        true
    }
}

/// Repository for call records.
pub struct CallRepository;

impl CallRepository {
    pub fn insert(conn: &Connection, call: &CallRecord) -> Result<()> {
        conn.execute(
            "INSERT INTO calls (id, status, start_time, end_time, audio_filename, transcript, \
             entities, outcome, sentiment, customer, phone, duration) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                call.id,
                call.status.as_str(),
                call.start_time,
                call.end_time,
                call.audio_filename,
                call.transcript,
                call.entities_json()?,
                call.outcome.as_str(),
                call.sentiment,
                call.customer,
                call.phone,
                call.duration,
            ],
        )
        .context("Failed to insert call")?;

        Ok(())
    }

    pub fn get(conn: &Connection, id: &str) -> Result<Option<CallRecord>> {
        let mut stmt = conn
            .prepare(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
            .context("Failed to prepare call query")?;

        let mut rows = stmt
            .query_map(params![id], map_row)
            .context("Failed to query call")?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Every call in insertion order.
    pub fn all(conn: &Connection) -> Result<Vec<CallRecord>> {
        Self::list(conn, &CallFilter::default())
    }

    /// Calls matching `filter`, in insertion order.
    pub fn list(conn: &Connection, filter: &CallFilter) -> Result<Vec<CallRecord>> {
        let mut sql = format!("{} WHERE 1=1", SELECT_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status_filter() {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.to_string()));
        }

        if let Some(from) = filter.from.as_deref().filter(|s| !s.is_empty()) {
            sql.push_str(" AND start_time >= ?");
            params.push(Box::new(from.to_string()));
        }

        if let Some(to) = filter.to.as_deref().filter(|s| !s.is_empty()) {
            sql.push_str(" AND start_time <= ?");
            params.push(Box::new(to.to_string()));
        }

        sql.push_str(" ORDER BY rowid ASC");

        let mut stmt = conn.prepare(&sql).context("Failed to prepare list query")?;

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let calls = stmt
            .query_map(param_refs.as_slice(), map_row)
            .context("Failed to execute list query")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map calls")?;

        Ok(calls.into_iter().filter(|c| filter.matches(c)).collect())
    }

    /// Writes every mutable column of `call`. Returns false when no row has
    /// that id.
    pub fn update(conn: &Connection, call: &CallRecord) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE calls SET status = ?1, end_time = ?2, audio_filename = ?3, transcript = ?4, \
                 entities = ?5, outcome = ?6, sentiment = ?7, customer = ?8, phone = ?9, \
                 duration = ?10 WHERE id = ?11",
                params![
                    call.status.as_str(),
                    call.end_time,
                    call.audio_filename,
                    call.transcript,
                    call.entities_json()?,
                    call.outcome.as_str(),
                    call.sentiment,
                    call.customer,
                    call.phone,
                    call.duration,
                    call.id,
                ],
            )
            .context("Failed to update call")?;

        Ok(changed > 0)
    }

    pub fn update_transcript(conn: &Connection, id: &str, transcript: &str) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE calls SET transcript = ?1 WHERE id = ?2",
                params![transcript, id],
            )
            .context("Failed to update call transcript")?;

        Ok(changed > 0)
    }

    /// Moves `id` to `connected` only while it is still `active`.
    pub fn mark_connected(conn: &Connection, id: &str) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE calls SET status = ?1 WHERE id = ?2 AND status = ?3",
                params![
                    CallStatus::Connected.as_str(),
                    id,
                    CallStatus::Active.as_str()
                ],
            )
            .context("Failed to mark call connected")?;

        Ok(changed > 0)
    }

    /// Ends `id` unless it is already ended. Only status, end time and
    /// duration are written.
    pub fn mark_ended(
        conn: &Connection,
        id: &str,
        end_time: &str,
        duration: &str,
    ) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE calls SET status = ?1, end_time = ?2, duration = ?3 \
                 WHERE id = ?4 AND status != ?1",
                params![CallStatus::Ended.as_str(), end_time, duration, id],
            )
            .context("Failed to end call")?;

        Ok(changed > 0)
    }

    /// Number of calls whose status is any of `statuses`.
    pub fn count_with_status(conn: &Connection, statuses: &[CallStatus]) -> Result<i64> {
        if statuses.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
            "SELECT COUNT(*) FROM calls WHERE status IN ({})",
            placeholders
        );
        let labels: Vec<&str> = statuses.iter().map(CallStatus::as_str).collect();

        let count: i64 = conn
            .query_row(&sql, rusqlite::params_from_iter(labels), |row| row.get(0))
            .context("Failed to count calls by status")?;

        Ok(count)
    }

    /// Outcome label counts over ended calls, in first-seen order.
    pub fn ended_outcome_counts(conn: &Connection) -> Result<Vec<(String, i64)>> {
        let mut stmt = conn
            .prepare(
                "SELECT outcome, COUNT(*) FROM calls WHERE status = ?1 \
                 GROUP BY outcome ORDER BY MIN(rowid) ASC",
            )
            .context("Failed to prepare outcome query")?;

        let counts = stmt
            .query_map(params![CallStatus::Ended.as_str()], |row| {
                let outcome: Option<String> = row.get(0)?;
                let count: i64 = row.get(1)?;
                let label = outcome
                    .filter(|o| !o.is_empty())
                    .unwrap_or_else(|| "Unknown".to_string());
                Ok((label, count))
            })
            .context("Failed to query outcome counts")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map outcome counts")?;

        Ok(counts)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<CallRecord> {
    let status: String = row.get(1)?;
    let entities: Option<String> = row.get(6)?;
    let outcome: String = row.get(7)?;

    Ok(CallRecord {
        id: row.get(0)?,
        status: CallStatus::parse(&status)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, e.into()))?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        audio_filename: row.get(4)?,
        transcript: row.get(5)?,
        entities: CallRecord::parse_entities(entities.as_deref()),
        outcome: Outcome::parse(&outcome)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, e.into()))?,
        sentiment: row.get(8)?,
        customer: row.get(9)?,
        phone: row.get(10)?,
        duration: row.get(11)?,
    })
}
