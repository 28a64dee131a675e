//! Core data types for detection results

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form structured data attached to a match by its detector.
pub type Metadata = serde_json::Map<String, Value>;

/// Upper bound for any confidence the engine reports.
///
/// A regex hit is never proof that the text *means* what it looks like,
/// so no match is reported with full certainty.
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Clamp a heuristic score into `[0, MAX_CONFIDENCE]`.
pub fn clamp_confidence(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, MAX_CONFIDENCE)
}

/// Semantic category a span of text can be classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternType {
    Address,
    Phone,
    Email,
    Url,
    DateTime,
    TrackingNumber,
    Currency,
    Unit,
}

impl PatternType {
    pub const ALL: [PatternType; 8] = [
        PatternType::Address,
        PatternType::Phone,
        PatternType::Email,
        PatternType::Url,
        PatternType::DateTime,
        PatternType::TrackingNumber,
        PatternType::Currency,
        PatternType::Unit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Address => "ADDRESS",
            PatternType::Phone => "PHONE",
            PatternType::Email => "EMAIL",
            PatternType::Url => "URL",
            PatternType::DateTime => "DATE_TIME",
            PatternType::TrackingNumber => "TRACKING_NUMBER",
            PatternType::Currency => "CURRENCY",
            PatternType::Unit => "UNIT",
        }
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified substring of the selected text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatch {
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub text: String,
    pub confidence: f64,
    /// Byte offset of the first character of the match.
    #[serde(rename = "startIndex")]
    pub start: usize,
    /// Byte offset one past the last character of the match.
    #[serde(rename = "endIndex")]
    pub end: usize,
    pub metadata: Metadata,
}

impl PatternMatch {
    pub fn new(
        pattern_type: PatternType,
        text: String,
        confidence: f64,
        start: usize,
        end: usize,
        metadata: Metadata,
    ) -> Self {
        Self {
            pattern_type,
            text,
            confidence: clamp_confidence(confidence),
            start,
            end,
            metadata,
        }
    }

    /// Builds a match from a regex hit.
    pub fn from_regex(
        pattern_type: PatternType,
        m: regex::Match<'_>,
        confidence: f64,
        metadata: Metadata,
    ) -> Self {
        Self::new(
            pattern_type,
            m.as_str().to_string(),
            confidence,
            m.start(),
            m.end(),
            metadata,
        )
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Convenience accessor for string metadata.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}
