//! Postal address and bare postal-code detection
//!
//! Address grammars run in a fixed precedence: US, UK, European, then a
//! generic comma-delimited fallback. A span claimed by an earlier grammar is
//! never re-decomposed by a later one.

use regex::{Captures, Regex};
use serde_json::Value;

use super::{metadata, Detector};
use crate::types::{Metadata, PatternMatch, PatternType};

const POSTAL_CODE_BONUS: f64 = 0.05;

const US_STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM",
    "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA",
    "WV", "WI", "WY",
];

/// Letter pairs after four digits that read as a year or count, not a Dutch postcode.
const NOT_NL_SUFFIXES: &[&str] = &["US", "UK", "EU", "UN", "AD", "BC", "CE", "AM", "PM", "KM", "KG"];

const US_STREET: &str = r"(?x)
    \b(?P<number>\d{1,6})\s+
    (?P<name>(?:[A-Z0-9][A-Za-z0-9.'-]*\s+){1,4}?
        (?i:street|st|avenue|ave|road|rd|boulevard|blvd|drive|dr|lane|ln|court|ct|way
            |place|pl|parkway|pkwy|circle|cir|terrace|ter|highway|hwy)\.?)
    (?:,?\s+(?:(?i:apt|suite|ste|unit)\.?\s*\#?[A-Za-z0-9-]+,?\s+)?
        (?P<city>[A-Z][a-zA-Z]+(?:\s[A-Z][a-zA-Z]+)*),\s+
        (?P<region>[A-Z]{2})\s+
        (?P<postal>\d{5}(?:-\d{4})?))?
    \b";

const UK_STREET: &str = r"(?x)
    \b(?P<number>\d{1,4}[A-Za-z]?)\s+
    (?P<name>(?:[A-Z][A-Za-z'-]*\s+){1,3}?
        (?i:street|road|lane|close|crescent|gardens|grove|mews|row|square|hill|walk|avenue|drive|way))
    ,?\s+(?:(?P<city>[A-Z][a-zA-Z]+(?:\s[A-Z][a-zA-Z]+)?),?\s+)?
    (?P<postal>[A-Z]{1,2}\d[A-Z\d]?\s*\d[A-Z]{2})\b";

const EU_GERMANIC: &str = r"(?x)
    \b(?P<name>\p{Lu}\p{Ll}+(?:straße|strasse|str\.|weg|platz|allee|gasse|gracht|laan))
    \s+(?P<number>\d{1,4}[a-z]?)
    (?:,\s*(?P<postal>\d{4,5})\s+(?P<city>\p{Lu}[\p{L}-]+))?";

const EU_ROMANCE: &str = r"(?x)
    (?:\b(?P<lead>\d{1,4})(?:\s?bis)?,?\s+)?
    \b(?P<kind>(?i:rue|calle|via|viale|avenida|piazza|plaza|carrer|rua))\s+
    (?P<name>(?:(?i:de|del|della|des|du|la|le|los|las|di)\s+)*\p{Lu}[\p{L}'\x20-]{1,40})
    (?:\s*,?\s*(?P<number>\d{1,4})\b)?
    (?:,\s*(?P<postal>\d{4,5})\s+(?P<city>\p{Lu}[\p{L}-]+))?";

const GENERIC: &str = r"(?x)
    \b(?P<number>\d{1,5})\s+
    (?P<name>\p{L}[\p{L}'\x20.-]+?),\s*
    (?P<city>\p{L}[\p{L}'\x20.-]+?),\s*
    (?P<region>\p{L}+(?:\s\p{L}+)?|\d{4,6})";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grammar {
    Us,
    Uk,
    EuGermanic,
    EuRomance,
    Generic,
}

impl Grammar {
    fn format(&self) -> &'static str {
        match self {
            Grammar::Us => "us",
            Grammar::Uk => "uk",
            Grammar::EuGermanic | Grammar::EuRomance => "eu",
            Grammar::Generic => "generic",
        }
    }

    fn base_confidence(&self) -> f64 {
        match self {
            Grammar::Us | Grammar::Uk => 0.85,
            Grammar::EuGermanic | Grammar::EuRomance => 0.8,
            Grammar::Generic => 0.65,
        }
    }
}

pub struct AddressDetector {
    grammars: Vec<(Regex, Grammar)>,
    threshold: f64,
}

impl AddressDetector {
    pub fn new(threshold: f64) -> Result<Self, regex::Error> {
        let grammars = vec![
            (Regex::new(US_STREET)?, Grammar::Us),
            (Regex::new(UK_STREET)?, Grammar::Uk),
            (Regex::new(EU_GERMANIC)?, Grammar::EuGermanic),
            (Regex::new(EU_ROMANCE)?, Grammar::EuRomance),
            (Regex::new(GENERIC)?, Grammar::Generic),
        ];
        Ok(Self { grammars, threshold })
    }
}

impl Detector for AddressDetector {
    fn name(&self) -> &'static str {
        "address"
    }

    fn pattern_type(&self) -> PatternType {
        PatternType::Address
    }

    fn detect(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches: Vec<PatternMatch> = Vec::new();

        for (pattern, grammar) in &self.grammars {
            for caps in pattern.captures_iter(text) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };

                let trimmed = whole.as_str().trim_end_matches([' ', ',']);
                let (start, end) = (whole.start(), whole.start() + trimmed.len());
                if end <= start {
                    continue;
                }
                if matches.iter().any(|m| start < m.end && m.start < end) {
                    continue;
                }

                let Some(meta) = decompose(&caps, *grammar) else {
                    continue;
                };

                let mut confidence = grammar.base_confidence();
                if meta.contains_key("postalCode") {
                    confidence += POSTAL_CODE_BONUS;
                }
                if *grammar == Grammar::EuRomance && !meta.contains_key("houseNumber") {
                    confidence -= 0.1;
                }
                if confidence < self.threshold {
                    continue;
                }

                matches.push(PatternMatch::new(
                    PatternType::Address,
                    trimmed.to_string(),
                    confidence,
                    start,
                    end,
                    meta,
                ));
            }
        }

        matches.sort_by_key(|m| m.start);
        matches
    }
}

fn group<'t>(caps: &Captures<'t>, name: &str) -> Option<&'t str> {
    caps.name(name).map(|m| m.as_str().trim())
}

/// Component decomposition for one grammar hit. `None` rejects the hit.
fn decompose(caps: &Captures<'_>, grammar: Grammar) -> Option<Metadata> {
    let mut meta = metadata([("format", Value::from(grammar.format()))]);

    let street = match grammar {
        Grammar::Us | Grammar::Uk | Grammar::Generic => {
            format!("{} {}", group(caps, "number")?, group(caps, "name")?)
        }
        Grammar::EuGermanic => format!("{} {}", group(caps, "name")?, group(caps, "number")?),
        Grammar::EuRomance => {
            let name = format!("{} {}", group(caps, "kind")?, group(caps, "name")?);
            match group(caps, "lead").or_else(|| group(caps, "number")) {
                Some(n) => {
                    meta.insert("houseNumber".into(), Value::from(n));
                    name
                }
                None => name,
            }
        }
    };
    meta.insert("street".into(), Value::from(street));

    if let Some(city) = group(caps, "city") {
        meta.insert("city".into(), Value::from(city));
    }

    if let Some(region) = group(caps, "region") {
        if grammar == Grammar::Us && !US_STATES.contains(&region) {
            return None;
        }
        meta.insert("region".into(), Value::from(region));
    }

    if let Some(postal) = group(caps, "postal") {
        meta.insert("postalCode".into(), Value::from(postal));
    }

    let country = match grammar {
        Grammar::Us => Some("US"),
        Grammar::Uk => Some("GB"),
        Grammar::EuGermanic => Some("DE"),
        Grammar::EuRomance => romance_country(group(caps, "kind")?),
        Grammar::Generic => None,
    };
    if let Some(country) = country {
        meta.insert("country".into(), Value::from(country));
    }

    Some(meta)
}

fn romance_country(kind: &str) -> Option<&'static str> {
    match kind.to_lowercase().as_str() {
        "rue" => Some("FR"),
        "calle" | "plaza" => Some("ES"),
        "carrer" => Some("ES"),
        "via" | "viale" | "piazza" => Some("IT"),
        "rua" => Some("PT"),
        _ => None,
    }
}

/// Country-specific postal code shapes, detected without surrounding
/// street context.
pub struct PostalCodeDetector {
    shapes: Vec<(Regex, &'static str, f64)>,
    threshold: f64,
}

impl PostalCodeDetector {
    pub fn new(threshold: f64) -> Result<Self, regex::Error> {
        let shapes = vec![
            // ZIP with a state in front, or ZIP+4 on its own
            (Regex::new(r"\b(?:(?P<state>[A-Z]{2})\s+)?(?P<code>\d{5}-\d{4}|\d{5})\b")?, "US", 0.7),
            (Regex::new(r"\b(?P<code>[A-Z]{1,2}\d[A-Z\d]?\s\d[A-Z]{2})\b")?, "GB", 0.75),
            (Regex::new(r"\b(?P<code>[A-Z]\d[A-Z]\s?\d[A-Z]\d)\b")?, "CA", 0.75),
            (Regex::new(r"\b(?P<code>[1-9]\d{3}\s?[A-Z]{2})\b")?, "NL", 0.65),
        ];
        Ok(Self { shapes, threshold })
    }
}

impl Detector for PostalCodeDetector {
    fn name(&self) -> &'static str {
        "postal_code"
    }

    fn pattern_type(&self) -> PatternType {
        PatternType::Address
    }

    fn detect(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches = Vec::new();

        for (pattern, country, confidence) in &self.shapes {
            for caps in pattern.captures_iter(text) {
                let (Some(whole), Some(code)) = (caps.get(0), caps.name("code")) else {
                    continue;
                };

                if *country == "US" {
                    let has_state = caps
                        .name("state")
                        .is_some_and(|s| US_STATES.contains(&s.as_str()));
                    if !has_state && !code.as_str().contains('-') {
                        continue;
                    }
                }

                if *country == "NL" {
                    let suffix = code.as_str().get(code.as_str().len() - 2..).unwrap_or_default();
                    if US_STATES.contains(&suffix) || NOT_NL_SUFFIXES.contains(&suffix) {
                        continue;
                    }
                }

                if *confidence < self.threshold {
                    continue;
                }

                let meta = metadata([
                    ("postalCode", Value::from(code.as_str())),
                    ("country", Value::from(*country)),
                    ("isPostalCodeOnly", Value::from(true)),
                ]);
                matches.push(PatternMatch::from_regex(PatternType::Address, whole, *confidence, meta));
            }
        }

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses(text: &str) -> Vec<PatternMatch> {
        AddressDetector::new(0.65).unwrap().detect(text)
    }

    #[test]
    fn test_us_address_with_state_and_zip() {
        let found = addresses("Ship to 1600 Pennsylvania Avenue, Washington, DC 20500 please");
        assert_eq!(found.len(), 1);
        let m = &found[0];
        assert_eq!(m.text, "1600 Pennsylvania Avenue, Washington, DC 20500");
        assert_eq!(m.meta_str("format"), Some("us"));
        assert_eq!(m.meta_str("street"), Some("1600 Pennsylvania Avenue"));
        assert_eq!(m.meta_str("city"), Some("Washington"));
        assert_eq!(m.meta_str("region"), Some("DC"));
        assert_eq!(m.meta_str("postalCode"), Some("20500"));
        assert!((m.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_us_street_only() {
        let found = addresses("meet at 123 Main St later");
        assert_eq!(found[0].text, "123 Main St");
        assert_eq!(found[0].confidence, 0.85);
    }

    #[test]
    fn test_uk_address_with_postcode() {
        let found = addresses("221B Baker Street, London NW1 6XE");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].meta_str("format"), Some("uk"));
        assert_eq!(found[0].meta_str("city"), Some("London"));
        assert_eq!(found[0].meta_str("postalCode"), Some("NW1 6XE"));
    }

    #[test]
    fn test_us_grammar_takes_precedence() {
        // UK grammar would also fit; precedence keeps the US decomposition.
        let found = addresses("10 Downing Street, London SW1A 2AA");
        assert_eq!(found[0].meta_str("format"), Some("us"));
        assert_eq!(found[0].text, "10 Downing Street");
    }

    #[test]
    fn test_german_address() {
        let found = addresses("Hauptstraße 5, 10115 Berlin");
        assert_eq!(found[0].meta_str("format"), Some("eu"));
        assert_eq!(found[0].meta_str("street"), Some("Hauptstraße 5"));
        assert_eq!(found[0].meta_str("postalCode"), Some("10115"));
        assert_eq!(found[0].meta_str("city"), Some("Berlin"));
    }

    #[test]
    fn test_spanish_address() {
        let found = addresses("Calle Mayor 5, 28013 Madrid");
        assert_eq!(found[0].meta_str("country"), Some("ES"));
        assert_eq!(found[0].meta_str("houseNumber"), Some("5"));
        assert_eq!(found[0].meta_str("city"), Some("Madrid"));
    }

    #[test]
    fn test_french_address_keeps_postal_code() {
        let found = addresses("12 rue de la Paix, 75002 Paris");
        assert_eq!(found[0].meta_str("street"), Some("rue de la Paix"));
        assert_eq!(found[0].meta_str("houseNumber"), Some("12"));
        assert_eq!(found[0].meta_str("postalCode"), Some("75002"));
        assert_eq!(found[0].meta_str("country"), Some("FR"));
    }

    #[test]
    fn test_generic_fallback() {
        let found = addresses("7 Kamala Nagar, Chennai, Tamil Nadu");
        assert_eq!(found[0].meta_str("format"), Some("generic"));
        assert_eq!(found[0].meta_str("city"), Some("Chennai"));
        assert_eq!(found[0].meta_str("region"), Some("Tamil Nadu"));
    }

    #[test]
    fn test_postal_codes() {
        let detector = PostalCodeDetector::new(0.65).unwrap();
        let found = detector.detect("SW1A 2AA and K1A 0B1 and NY 10001");
        let countries: Vec<_> = found.iter().filter_map(|m| m.meta_str("country")).collect();
        assert_eq!(countries, vec!["US", "GB", "CA"]);
        assert!(detector.detect("order 12345 shipped").is_empty());
    }

    #[test]
    fn test_dutch_postcode_needs_plausible_letters() {
        let detector = PostalCodeDetector::new(0.65).unwrap();
        assert!(detector.detect("the year 2024 US release").is_empty());
        assert!(detector.detect("founded 1998 UK office").is_empty());
        assert!(detector.detect("doors open 1930 PM").is_empty());

        let found = detector.detect("Damrak 1, 1012 LG Amsterdam");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].meta_str("country"), Some("NL"));
        assert_eq!(found[0].meta_str("postalCode"), Some("1012 LG"));
    }
}
