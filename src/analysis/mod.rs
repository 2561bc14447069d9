//! Transcript analysis: sentiment scoring, outcome classification and
//! customer-info extraction.

pub mod customer_info;
pub mod outcome;
pub mod sentiment;

pub use customer_info::{CustomerInfo, CustomerInfoExtractor, PhoneSource, UNKNOWN_CUSTOMER};
pub use outcome::{classify, classify_text, normalize, outcome_for, Classification};
pub use sentiment::{VaderScorer, SentimentScorer};
