//! Call lifecycle: `active → connected → ended`.
//!
//! Transitions are single guarded `UPDATE`s that touch only the status
//! columns, so they never overwrite concurrent edits to other fields.
//! Unknown ids and disallowed moves are no-ops, not errors.

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use rusqlite::Connection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{CallRecord, CallRepository, CallStatus, DURATION_UNKNOWN, TIMESTAMP_FORMAT};

/// Current local time in the stored timestamp layout.
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Creates and persists a new `active` call.
pub fn create(conn: &Connection) -> Result<CallRecord> {
    let call = CallRecord::new(Uuid::new_v4().to_string(), now_timestamp());
    CallRepository::insert(conn, &call)?;
    info!("Call {} created", call.id);
    Ok(call)
}

/// Moves an `active` call to `connected`. Returns whether the row changed.
pub fn mark_connected(conn: &Connection, id: &str) -> Result<bool> {
    if !CallRepository::mark_connected(conn, id)? {
        debug!("mark_connected: call {} missing or past active", id);
        return Ok(false);
    }

    info!("Call {} connected", id);
    Ok(true)
}

/// Ends a call that is not already ended, stamping `end_time` (given or now)
/// and computing its duration. Returns whether the row changed.
pub fn end(conn: &Connection, id: &str, end_time: Option<&str>) -> Result<bool> {
    let Some(mut call) = CallRepository::get(conn, id)? else {
        debug!("end: call {} not found", id);
        return Ok(false);
    };

    if !apply_end(&mut call, end_time) {
        debug!("end: call {} already ended", id);
        return Ok(false);
    }

    let stamped = call.end_time.as_deref().unwrap_or_default();
    if !CallRepository::mark_ended(conn, id, stamped, &call.duration)? {
        debug!("end: call {} was ended concurrently", id);
        return Ok(false);
    }

    info!("Call {} ended after {}", id, call.duration);
    Ok(true)
}

/// The in-memory half of [`end`].
pub fn apply_end(call: &mut CallRecord, end_time: Option<&str>) -> bool {
    if call.status.is_terminal() {
        return false;
    }

    call.status = CallStatus::Ended;
    if call.end_time.is_none() {
        call.end_time = Some(end_time.map(str::to_string).unwrap_or_else(now_timestamp));
    }
    call.duration = match call.end_time.as_deref() {
        Some(end) => compute_duration(&call.start_time, end),
        None => DURATION_UNKNOWN.to_string(),
    };
    true
}

/// `"{m}m {s}s"` between two stored timestamps, or `"N/A"` when either fails
/// to parse or the span is negative.
pub fn compute_duration(start: &str, end: &str) -> String {
    let parsed = NaiveDateTime::parse_from_str(start, TIMESTAMP_FORMAT)
        .and_then(|s| NaiveDateTime::parse_from_str(end, TIMESTAMP_FORMAT).map(|e| (s, e)));

    match parsed {
        Ok((start, end)) => {
            let seconds = (end - start).num_seconds();
            if seconds < 0 {
                DURATION_UNKNOWN.to_string()
            } else {
                format_duration(seconds)
            }
        }
        Err(_) => DURATION_UNKNOWN.to_string(),
    }
}

pub fn format_duration(total_seconds: i64) -> String {
    format!("{}m {}s", total_seconds / 60, total_seconds % 60)
}

/// Inverse of [`format_duration`]. `None` for `"N/A"` or anything malformed.
pub fn parse_duration(display: &str) -> Option<i64> {
    let mut parts = display.split_whitespace();
    let minutes = parts.next()?.strip_suffix('m')?.parse::<i64>().ok()?;
    let seconds = parts.next()?.strip_suffix('s')?.parse::<i64>().ok()?;
    if parts.next().is_some() || minutes < 0 || seconds < 0 {
        return None;
    }
    Some(minutes * 60 + seconds)
}
