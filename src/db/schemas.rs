use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Timestamp layout used for every stored call time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder for a duration that has not been, or could not be, computed.
pub const DURATION_UNKNOWN: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Active,
    Connected,
    Ended,
}

impl CallStatus {
    pub fn parse(s: &str) -> Result<CallStatus> {
        match s {
            "active" => Ok(CallStatus::Active),
            "connected" => Ok(CallStatus::Connected),
            "ended" => Ok(CallStatus::Ended),
            _ => anyhow::bail!("Invalid call status: {}", s),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Active => "active",
            CallStatus::Connected => "connected",
            CallStatus::Ended => "ended",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CallStatus::Active => 0,
            CallStatus::Connected => 1,
            CallStatus::Ended => 2,
        }
    }

    /// Transitions only move forward; `connected` may be skipped.
    pub fn can_transition_to(&self, next: CallStatus) -> bool {
        next.rank() > self.rank()
    }

    pub fn is_terminal(&self) -> bool {
        *self == CallStatus::Ended
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Pending,
    Interested,
    Neutral,
    #[serde(rename = "Not Interested")]
    NotInterested,
}

impl Outcome {
    pub fn parse(s: &str) -> Result<Outcome> {
        match s {
            "Pending" => Ok(Outcome::Pending),
            "Interested" => Ok(Outcome::Interested),
            "Neutral" => Ok(Outcome::Neutral),
            "Not Interested" => Ok(Outcome::NotInterested),
            _ => anyhow::bail!("Invalid call outcome: {}", s),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pending => "Pending",
            Outcome::Interested => "Interested",
            Outcome::Neutral => "Neutral",
            Outcome::NotInterested => "Not Interested",
        }
    }
}

/// A row of the `calls` table.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub id: String,
    pub status: CallStatus,
    pub start_time: String,
    pub end_time: Option<String>,
    pub audio_filename: String,
    pub transcript: String,
    pub entities: Map<String, Value>,
    pub outcome: Outcome,
    pub sentiment: f64,
    pub customer: String,
    pub phone: String,
    pub duration: String,
}

impl CallRecord {
    /// A freshly created call: `active`, started at `start_time`, every other
    /// field at its placeholder value.
    pub fn new(id: impl Into<String>, start_time: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: CallStatus::Active,
            start_time: start_time.into(),
            end_time: None,
            audio_filename: String::new(),
            transcript: String::new(),
            entities: Map::new(),
            outcome: Outcome::Pending,
            sentiment: 0.5,
            customer: "Unknown".to_string(),
            phone: "N/A".to_string(),
            duration: DURATION_UNKNOWN.to_string(),
        }
    }

    pub fn entities_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entities)?)
    }

    /// Stored entity text that is empty or not a JSON object reads as `{}`.
    pub fn parse_entities(raw: Option<&str>) -> Map<String, Value> {
        match raw.map(serde_json::from_str::<Value>) {
            Some(Ok(Value::Object(map))) => map,
            _ => Map::new(),
        }
    }

    /// `/recording/<file>` for calls with stored audio, empty otherwise.
    pub fn audio_url(&self) -> String {
        if self.audio_filename.is_empty() {
            String::new()
        } else {
            format!("/recording/{}", self.audio_filename)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_only_move_forward() {
        assert!(CallStatus::Active.can_transition_to(CallStatus::Connected));
        assert!(CallStatus::Active.can_transition_to(CallStatus::Ended));
        assert!(CallStatus::Connected.can_transition_to(CallStatus::Ended));

        assert!(!CallStatus::Connected.can_transition_to(CallStatus::Active));
        assert!(!CallStatus::Ended.can_transition_to(CallStatus::Connected));
        assert!(!CallStatus::Ended.can_transition_to(CallStatus::Ended));
        assert!(!CallStatus::Active.can_transition_to(CallStatus::Active));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(CallStatus::parse("connected").unwrap(), CallStatus::Connected);
        assert!(CallStatus::parse("ringing").is_err());
        assert!(CallStatus::Ended.is_terminal());
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::NotInterested.as_str(), "Not Interested");
        assert_eq!(
            Outcome::parse("Not Interested").unwrap(),
            Outcome::NotInterested
        );
        assert_eq!(
            serde_json::to_string(&Outcome::NotInterested).unwrap(),
            "\"Not Interested\""
        );
        assert!(Outcome::parse("Maybe").is_err());
    }

    #[test]
    fn test_new_record_defaults() {
        let call = CallRecord::new("abc", "2025-01-01 10:00:00");
        assert_eq!(call.status, CallStatus::Active);
        assert_eq!(call.outcome, Outcome::Pending);
        assert_eq!(call.sentiment, 0.5);
        assert_eq!(call.customer, "Unknown");
        assert_eq!(call.phone, "N/A");
        assert_eq!(call.duration, "N/A");
        assert!(call.end_time.is_none());
        assert!(call.entities.is_empty());
        assert_eq!(call.audio_url(), "");
    }

    #[test]
    fn test_parse_entities_tolerates_bad_json() {
        assert!(CallRecord::parse_entities(None).is_empty());
        assert!(CallRecord::parse_entities(Some("")).is_empty());
        assert!(CallRecord::parse_entities(Some("[1,2]")).is_empty());

        let map = CallRecord::parse_entities(Some(r#"{"name":"Mr. Sharma"}"#));
        assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Mr. Sharma"));
    }
}
