use anyhow::Result;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

pub const UNKNOWN_CUSTOMER: &str = "Unknown";

/// Where the phone number on a [`CustomerInfo`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneSource {
    Transcript,
    /// Placeholder digits, not a real number
    Generated,
}

impl PhoneSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhoneSource::Transcript => "transcript",
            PhoneSource::Generated => "generated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub phone_source: PhoneSource,
}

impl CustomerInfo {
    /// The entities mapping stored on the call record.
    pub fn to_entities(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_string(), json!(self.name));
        map.insert("phone".to_string(), json!(self.phone));
        map.insert("phone_source".to_string(), json!(self.phone_source.as_str()));
        map
    }
}

/// Best-effort name and phone extraction from transcript text.
pub struct CustomerInfoExtractor {
    title_regex: Regex,
    intro_regex: Regex,
    phone_regex: Regex,
}

impl CustomerInfoExtractor {
    pub fn new() -> Result<Self> {
        // "Mr. Sharma", "Mrs. Rao"
        let title_regex = Regex::new(r"(Mr\.|Ms\.|Mrs\.)\s+([A-Z][a-z]+)")?;
        // "my name is Priya", "this is Rahul Verma"
        let intro_regex =
            Regex::new(r"\b(?i:my name is|i am|this is)\s+([A-Z][a-z]+(?:\s[A-Z][a-z]+)?)")?;
        let phone_regex = Regex::new(r"\b(\d{10})\b")?;

        Ok(Self {
            title_regex,
            intro_regex,
            phone_regex,
        })
    }

    pub fn extract(&self, transcript: &str) -> CustomerInfo {
        self.extract_with_rng(transcript, &mut rand::thread_rng())
    }

    pub fn extract_with_rng<R: Rng>(&self, transcript: &str, rng: &mut R) -> CustomerInfo {
        let name = self.extract_name(transcript);

        let (phone, phone_source) = match self.extract_phone(transcript) {
            Some(phone) => (phone, PhoneSource::Transcript),
            None => (placeholder_phone(rng), PhoneSource::Generated),
        };

        debug!(
            "Extracted customer info: name={}, phone_source={}",
            name,
            phone_source.as_str()
        );

        CustomerInfo {
            name,
            phone,
            phone_source,
        }
    }

    pub fn extract_name(&self, transcript: &str) -> String {
        if let Some(caps) = self.title_regex.captures(transcript) {
            return format!("{} {}", &caps[1], &caps[2]);
        }

        if let Some(caps) = self.intro_regex.captures(transcript) {
            return caps[1].trim().to_string();
        }

        UNKNOWN_CUSTOMER.to_string()
    }

    pub fn extract_phone(&self, transcript: &str) -> Option<String> {
        self.phone_regex
            .captures(transcript)
            .map(|caps| caps[1].to_string())
    }
}

/// `9` followed by nine random digits.
fn placeholder_phone<R: Rng>(rng: &mut R) -> String {
    let mut phone = String::with_capacity(10);
    phone.push('9');
    for _ in 0..9 {
        let digit: u8 = rng.gen_range(0..10);
        phone.push(char::from(b'0' + digit));
    }
    phone
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn extractor() -> CustomerInfoExtractor {
        CustomerInfoExtractor::new().unwrap()
    }

    #[test]
    fn test_title_and_phone() {
        let info = extractor().extract("Hi, this is Mr. Sharma, my number is 9876543210");
        assert_eq!(info.name, "Mr. Sharma");
        assert_eq!(info.phone, "9876543210");
        assert_eq!(info.phone_source, PhoneSource::Transcript);
    }

    #[test]
    fn test_title_takes_precedence_over_intro_phrase() {
        let name = extractor().extract_name("My name is Anil, calling for Mrs. Kapoor");
        assert_eq!(name, "Mrs. Kapoor");
    }

    #[test]
    fn test_intro_phrase_case_insensitive() {
        let e = extractor();
        assert_eq!(e.extract_name("MY NAME IS Priya and I need a loan"), "Priya");
        assert_eq!(e.extract_name("hello, this is Rahul Verma speaking"), "Rahul Verma");
        assert_eq!(e.extract_name("i am Deepa"), "Deepa");
    }

    #[test]
    fn test_intro_phrase_requires_capitalized_word() {
        assert_eq!(extractor().extract_name("this is great news"), "Unknown");
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(extractor().extract_name("hello, who is calling?"), "Unknown");
    }

    #[test]
    fn test_phone_must_be_exactly_ten_digits() {
        let e = extractor();
        assert_eq!(e.extract_phone("call 98765432101 now"), None);
        assert_eq!(e.extract_phone("call 987654321 now"), None);
        assert_eq!(
            e.extract_phone("numbers 12345 and 9123456789"),
            Some("9123456789".to_string())
        );
    }

    #[test]
    fn test_generated_phone_placeholder() {
        let mut rng = StdRng::seed_from_u64(7);
        let info = extractor().extract_with_rng("no digits here", &mut rng);

        assert_eq!(info.phone_source, PhoneSource::Generated);
        assert_eq!(info.phone.len(), 10);
        assert!(info.phone.starts_with('9'));
        assert!(info.phone.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_to_entities() {
        let info = CustomerInfo {
            name: "Ms. Rao".to_string(),
            phone: "9000000000".to_string(),
            phone_source: PhoneSource::Generated,
        };
        let entities = info.to_entities();
        assert_eq!(entities["name"], "Ms. Rao");
        assert_eq!(entities["phone"], "9000000000");
        assert_eq!(entities["phone_source"], "generated");
    }
}
