//! Phone number detection across regional numbering shapes

use regex::Regex;
use serde_json::Value;

use super::{is_standalone, metadata, Detector};
use crate::types::{PatternMatch, PatternType};

const BASE_CONFIDENCE: f64 = 0.75;
const MIN_DIGITS: usize = 7;
const MAX_DIGITS: usize = 15;

/// Calling code → ISO 3166 alpha-2. Longest prefix wins.
const COUNTRY_CODES: &[(&str, &str)] = &[
    ("1", "US"),
    ("7", "RU"),
    ("27", "ZA"),
    ("31", "NL"),
    ("32", "BE"),
    ("33", "FR"),
    ("34", "ES"),
    ("39", "IT"),
    ("41", "CH"),
    ("43", "AT"),
    ("44", "GB"),
    ("45", "DK"),
    ("46", "SE"),
    ("47", "NO"),
    ("48", "PL"),
    ("49", "DE"),
    ("52", "MX"),
    ("55", "BR"),
    ("61", "AU"),
    ("64", "NZ"),
    ("65", "SG"),
    ("81", "JP"),
    ("82", "KR"),
    ("86", "CN"),
    ("91", "IN"),
    ("351", "PT"),
    ("353", "IE"),
    ("358", "FI"),
    ("972", "IL"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Nanp,
    International,
    Uk,
    Eu,
}

impl Shape {
    fn as_str(&self) -> &'static str {
        match self {
            Shape::Nanp => "nanp",
            Shape::International => "international",
            Shape::Uk => "uk",
            Shape::Eu => "eu",
        }
    }
}

pub struct PhoneDetector {
    patterns: Vec<(Regex, Shape)>,
    threshold: f64,
}

impl PhoneDetector {
    pub fn new(threshold: f64) -> Result<Self, regex::Error> {
        let patterns = vec![
            // (555) 123-4567, 555-123-4567, +1 555 123 4567
            (
                Regex::new(r"(?:\+1[-.\s]?)?(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b")?,
                Shape::Nanp,
            ),
            // +44 20 7946 0958, +49 30 123456
            (
                Regex::new(r"\+[1-9]\d{0,2}(?:[\s.-]?\(?\d{1,4}\)?){1,5}\b")?,
                Shape::International,
            ),
            // 020 7946 0958, 07700 900123
            (
                Regex::new(r"\b0\d{2,4}[\s-]?\d{3,4}[\s-]?\d{3,4}\b")?,
                Shape::Uk,
            ),
            // 01 23 45 67 89, 06.12.34.56.78
            (Regex::new(r"\b0\d(?:[\s.]\d{2}){4}\b")?, Shape::Eu),
        ];

        Ok(Self { patterns, threshold })
    }

    /// Digits of the first phone-shaped run in `text`, with a leading `+`
    /// kept when present.
    pub fn dialable(&self, text: &str) -> Option<String> {
        let found = self
            .patterns
            .iter()
            .filter_map(|(re, _)| re.find(text))
            .min_by_key(|m| m.start());

        let raw = match found {
            Some(m) => m.as_str(),
            None => text,
        };

        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.len() < MIN_DIGITS || digits.len() > MAX_DIGITS {
            return None;
        }

        if raw.trim_start().starts_with('+') {
            Some(format!("+{digits}"))
        } else {
            Some(digits)
        }
    }

    fn score(raw: &str, digit_count: usize) -> f64 {
        let mut score = BASE_CONFIDENCE;
        let has_separators = raw.chars().any(|c| matches!(c, ' ' | '-' | '.' | '(' | ')'));
        if has_separators || raw.starts_with('+') {
            score += 0.1;
        }
        if (10..=11).contains(&digit_count) {
            score += 0.05;
        }
        score
    }
}

impl Detector for PhoneDetector {
    fn name(&self) -> &'static str {
        "phone"
    }

    fn pattern_type(&self) -> PatternType {
        PatternType::Phone
    }

    fn detect(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches = Vec::new();

        for (pattern, shape) in &self.patterns {
            for m in pattern.find_iter(text) {
                if !is_standalone(text, m.start(), m.end()) {
                    continue;
                }

                let raw = m.as_str();
                let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
                if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
                    continue;
                }

                let confidence = Self::score(raw, digits.len());
                if confidence < self.threshold {
                    continue;
                }

                let (country_code, country) = infer_country(raw, &digits, *shape);
                let mut meta = metadata([
                    ("digits", Value::from(digits.as_str())),
                    ("formatted", Value::from(format_number(&digits, *shape, country_code))),
                    ("format", Value::from(shape.as_str())),
                ]);
                if let Some(code) = country_code {
                    meta.insert("countryCode".into(), Value::from(code));
                }
                if let Some(country) = country {
                    meta.insert("country".into(), Value::from(country));
                }

                matches.push(PatternMatch::from_regex(PatternType::Phone, m, confidence, meta));
            }
        }

        matches
    }
}

fn infer_country(
    raw: &str,
    digits: &str,
    shape: Shape,
) -> (Option<&'static str>, Option<&'static str>) {
    if raw.trim_start().starts_with('+') {
        let hit = COUNTRY_CODES
            .iter()
            .filter(|(code, _)| digits.starts_with(code))
            .max_by_key(|(code, _)| code.len());
        return match hit {
            Some((code, country)) => (Some(*code), Some(*country)),
            None => (None, None),
        };
    }

    match shape {
        Shape::Nanp => (Some("1"), Some("US")),
        Shape::Uk => (Some("44"), Some("GB")),
        Shape::Eu => (Some("33"), Some("FR")),
        Shape::International => (None, None),
    }
}

fn format_number(digits: &str, shape: Shape, country_code: Option<&str>) -> String {
    let national = match (shape, country_code) {
        (Shape::Nanp, _) if digits.len() == 11 && digits.starts_with('1') => &digits[1..],
        (Shape::International, Some(code)) => &digits[code.len()..],
        _ => digits,
    };

    match shape {
        Shape::Nanp if national.len() == 10 => {
            format!("({}) {}-{}", &national[..3], &national[3..6], &national[6..])
        }
        Shape::International => match country_code {
            Some(code) => format!("+{code} {national}"),
            None => format!("+{national}"),
        },
        _ => national.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> PhoneDetector {
        PhoneDetector::new(0.7).unwrap()
    }

    #[test]
    fn test_nanp_number() {
        let found = detector().detect("call (555) 123-4567 today");
        let nanp = found.iter().find(|m| m.meta_str("format") == Some("nanp")).unwrap();
        assert_eq!(nanp.text, "(555) 123-4567");
        assert_eq!(nanp.meta_str("formatted"), Some("(555) 123-4567"));
        assert_eq!(nanp.meta_str("country"), Some("US"));
        assert!(nanp.confidence >= 0.85);
    }

    #[test]
    fn test_international_country_inference() {
        let found = detector().detect("+44 20 7946 0958");
        let intl = found
            .iter()
            .find(|m| m.meta_str("format") == Some("international"))
            .unwrap();
        assert_eq!(intl.meta_str("country"), Some("GB"));
        assert_eq!(intl.meta_str("countryCode"), Some("44"));
        assert_eq!(intl.meta_str("formatted"), Some("+44 2079460958"));
    }

    #[test]
    fn test_digit_count_out_of_range_rejected() {
        assert!(detector().detect("+12 34").is_empty());
    }

    #[test]
    fn test_dialable_keeps_plus() {
        assert_eq!(detector().dialable("+1 555-123-4567").as_deref(), Some("+15551234567"));
        assert_eq!(detector().dialable("555.123.4567").as_deref(), Some("5551234567"));
        assert_eq!(detector().dialable("no digits"), None);
    }
}
