//! Package tracking number detection
//!
//! Each carrier is a row in [`CARRIERS`]. A string that fits several carriers
//! yields one candidate per carrier; the conflict resolver keeps the best.

use regex::Regex;
use serde_json::Value;

use super::{metadata, Detector};
use crate::types::{PatternMatch, PatternType};

/// How the carrier id is determined for a table row.
#[derive(Debug, Clone, Copy)]
enum CarrierId {
    Fixed(&'static str),
    /// UPU S10 numbers name the issuing country in their two-letter suffix.
    S10Suffix,
    /// Alphanumeric fallback with no known carrier.
    Generic,
}

struct CarrierSpec {
    id: CarrierId,
    pattern: &'static str,
    confidence: f64,
}

const CARRIERS: &[CarrierSpec] = &[
    CarrierSpec {
        id: CarrierId::Fixed("ups"),
        pattern: r"\b1Z[0-9A-Z]{16}\b",
        confidence: 0.9,
    },
    CarrierSpec {
        id: CarrierId::Fixed("fedex"),
        pattern: r"\b(?:\d{12}|\d{15}|\d{20})\b",
        confidence: 0.9,
    },
    CarrierSpec {
        id: CarrierId::Fixed("usps"),
        pattern: r"\b(?:9[1-5]\d{18,20}|[A-Z]{2}\d{9}US)\b",
        confidence: 0.9,
    },
    CarrierSpec {
        id: CarrierId::Fixed("dhl"),
        pattern: r"\b(?:\d{10}|\d{12})\b",
        confidence: 0.9,
    },
    CarrierSpec {
        id: CarrierId::S10Suffix,
        pattern: r"\b[A-Z]{2}\d{9}[A-Z]{2}\b",
        confidence: 0.85,
    },
    CarrierSpec {
        id: CarrierId::Fixed("ebay"),
        pattern: r"\b\d{12}\b",
        confidence: 0.75,
    },
    CarrierSpec {
        id: CarrierId::Generic,
        pattern: r"\b[A-Z0-9]{12,30}\b",
        confidence: 0.7,
    },
];

/// `(carrier id, display name, tracking URL prefix)`
const CARRIER_INFO: &[(&str, &str, &str)] = &[
    ("ups", "UPS", "https://www.ups.com/track?tracknum="),
    ("fedex", "FedEx", "https://www.fedex.com/fedextrack/?trknbr="),
    ("usps", "USPS", "https://tools.usps.com/go/TrackConfirmAction?tLabels="),
    ("dhl", "DHL", "https://www.dhl.com/en/express/tracking.html?AWB="),
    ("royal-mail", "Royal Mail", "https://www.royalmail.com/track-your-item#/tracking-results/"),
    ("canada-post", "Canada Post", "https://www.canadapost-postescanada.ca/track-reperage/en#/search?searchFor="),
    ("deutsche-post", "Deutsche Post", "https://www.deutschepost.de/sendung/simpleQuery.html?form.sendungsnummer="),
    ("australia-post", "Australia Post", "https://auspost.com.au/mypost/track/#/details/"),
    ("china-post", "China Post", "https://track.chinapost.com.cn/?trackNumber="),
    ("ebay", "eBay", "https://www.google.com/search?q=track+"),
    ("postal", "Postal service", "https://parcelsapp.com/en/tracking/"),
    ("generic", "Unknown carrier", "https://www.google.com/search?q=track+"),
];

fn s10_carrier(suffix: &str) -> &'static str {
    match suffix {
        "US" => "usps",
        "GB" => "royal-mail",
        "CA" => "canada-post",
        "DE" => "deutsche-post",
        "AU" => "australia-post",
        "CN" => "china-post",
        _ => "postal",
    }
}

/// Display name for a carrier id.
pub fn carrier_name(carrier: &str) -> &'static str {
    CARRIER_INFO
        .iter()
        .find(|(id, _, _)| *id == carrier)
        .map(|(_, name, _)| *name)
        .unwrap_or("Unknown carrier")
}

/// Tracking page for `number` at `carrier`.
pub fn tracking_url(carrier: &str, number: &str) -> String {
    let prefix = CARRIER_INFO
        .iter()
        .find(|(id, _, _)| *id == carrier)
        .map(|(_, _, url)| *url)
        .unwrap_or("https://www.google.com/search?q=track+");
    format!("{prefix}{}", urlencoding::encode(number))
}

pub struct TrackingDetector {
    carriers: Vec<(&'static CarrierSpec, Regex)>,
    threshold: f64,
}

impl TrackingDetector {
    pub fn new(threshold: f64) -> Result<Self, regex::Error> {
        let carriers = CARRIERS
            .iter()
            .map(|spec| Regex::new(spec.pattern).map(|re| (spec, re)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { carriers, threshold })
    }

    /// Best carrier guess for the first tracking number in `text`.
    pub fn identify<'t>(&self, text: &'t str) -> Option<(&'static str, &'t str)> {
        let mut found = self.detect(text);
        found.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let best = found.into_iter().next()?;
        let carrier = carrier_id(&best)?;
        Some((carrier, &text[best.start..best.end]))
    }
}

fn carrier_id(m: &PatternMatch) -> Option<&'static str> {
    let carrier = m.meta_str("carrier")?;
    CARRIER_INFO
        .iter()
        .find(|(id, _, _)| *id == carrier)
        .map(|(id, _, _)| *id)
}

impl Detector for TrackingDetector {
    fn name(&self) -> &'static str {
        "tracking_number"
    }

    fn pattern_type(&self) -> PatternType {
        PatternType::TrackingNumber
    }

    fn detect(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches = Vec::new();

        for (spec, pattern) in &self.carriers {
            for m in pattern.find_iter(text) {
                let number = m.as_str();
                let carrier = match spec.id {
                    CarrierId::Fixed(id) => id,
                    CarrierId::S10Suffix => s10_carrier(&number[number.len() - 2..]),
                    CarrierId::Generic => {
                        let has_alpha = number.chars().any(|c| c.is_ascii_alphabetic());
                        let has_digit = number.chars().any(|c| c.is_ascii_digit());
                        if !(has_alpha && has_digit) {
                            continue;
                        }
                        "generic"
                    }
                };

                if spec.confidence < self.threshold {
                    continue;
                }

                let meta = metadata([
                    ("carrier", Value::from(carrier)),
                    ("carrierName", Value::from(carrier_name(carrier))),
                    ("trackingUrl", Value::from(tracking_url(carrier, number))),
                ]);
                matches.push(PatternMatch::from_regex(
                    PatternType::TrackingNumber,
                    m,
                    spec.confidence,
                    meta,
                ));
            }
        }

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> TrackingDetector {
        TrackingDetector::new(0.7).unwrap()
    }

    fn carriers(found: &[PatternMatch]) -> Vec<&str> {
        found.iter().filter_map(|m| m.meta_str("carrier")).collect()
    }

    #[test]
    fn test_ups_number() {
        let found = detector().detect("1Z999AA10123456784");
        assert!(carriers(&found).contains(&"ups"));
        let ups = found.iter().find(|m| m.meta_str("carrier") == Some("ups")).unwrap();
        assert_eq!(ups.confidence, 0.9);
        assert_eq!(
            ups.meta_str("trackingUrl"),
            Some("https://www.ups.com/track?tracknum=1Z999AA10123456784")
        );
    }

    #[test]
    fn test_twelve_digits_is_ambiguous() {
        let found = detector().detect("123456789012");
        assert_eq!(carriers(&found), vec!["fedex", "dhl", "ebay"]);
    }

    #[test]
    fn test_s10_suffix_names_operator() {
        let found = detector().detect("RR123456789GB");
        assert_eq!(carriers(&found), vec!["royal-mail", "generic"]);
    }

    #[test]
    fn test_generic_requires_letters_and_digits() {
        assert!(detector().detect("ABCDEFGHIJKLMN").is_empty());
    }

    #[test]
    fn test_identify_prefers_named_carrier() {
        let (carrier, number) = detector().identify("ship id 123456789012 ok").unwrap();
        assert_eq!(carrier, "fedex");
        assert_eq!(number, "123456789012");
    }
}
