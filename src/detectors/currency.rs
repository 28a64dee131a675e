//! Currency amount detection
//!
//! Conversions use a fixed, illustrative USD-based rate snapshot. The engine
//! never fetches live rates.

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use super::{metadata, round_to, Detector};
use crate::types::{PatternMatch, PatternType};

/// Units of each currency per 1 USD.
pub const RATE_SNAPSHOT: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("JPY", 149.5),
    ("INR", 83.2),
    ("RUB", 92.0),
    ("KRW", 1330.0),
    ("ILS", 3.7),
    ("CAD", 1.36),
    ("AUD", 1.52),
    ("CHF", 0.88),
    ("CNY", 7.24),
];

const SYMBOLS: &[(&str, &str)] = &[
    ("$", "USD"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("¥", "JPY"),
    ("₹", "INR"),
    ("₽", "RUB"),
    ("₩", "KRW"),
    ("₪", "ILS"),
];

const WORDS: &[(&str, &str)] = &[
    ("dollar", "USD"),
    ("euro", "EUR"),
    ("pound", "GBP"),
    ("yen", "JPY"),
    ("rupee", "INR"),
    ("ruble", "RUB"),
    ("rouble", "RUB"),
    ("won", "KRW"),
    ("shekel", "ILS"),
    ("franc", "CHF"),
    ("yuan", "CNY"),
];

const AMOUNT: &str = r"(?P<amount>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)";
const MAGNITUDE: &str = r"(?:\s?(?P<mag>k|m|bn|thousand|million|billion)\b)?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AmountForm {
    SymbolPrefix,
    SymbolSuffix,
    IsoCode,
    Written,
}

impl AmountForm {
    fn base_confidence(&self) -> f64 {
        match self {
            AmountForm::SymbolPrefix => 0.85,
            AmountForm::SymbolSuffix => 0.8,
            AmountForm::IsoCode => 0.9,
            AmountForm::Written => 0.8,
        }
    }
}

/// Rate of `code` per USD, if the snapshot knows it.
pub fn rate(code: &str) -> Option<f64> {
    RATE_SNAPSHOT
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, r)| *r)
}

/// Convert `amount` of `from` into `to` using the rate snapshot.
pub fn convert(amount: f64, from: &str, to: &str) -> Option<f64> {
    Some(amount / rate(from)? * rate(to)?)
}

/// A parsed amount of money.
#[derive(Debug, Clone, PartialEq)]
pub struct Money {
    pub amount: f64,
    pub code: &'static str,
}

pub struct CurrencyDetector {
    forms: Vec<(Regex, AmountForm)>,
    threshold: f64,
}

impl CurrencyDetector {
    pub fn new(threshold: f64) -> Result<Self, regex::Error> {
        let symbols = r"(?P<sym>[$€£¥₹₽₩₪])";
        let codes = RATE_SNAPSHOT.iter().map(|(c, _)| *c).collect::<Vec<_>>().join("|");
        let words = r"(?P<word>dollars?|euros?|pounds?|yen|rupees?|rubles?|roubles?|won|shekels?|francs?|yuan)";

        let forms = vec![
            (
                Regex::new(&format!(r"(?i){symbols}\s?{AMOUNT}{MAGNITUDE}"))?,
                AmountForm::SymbolPrefix,
            ),
            (
                Regex::new(&format!(r"\b(?P<code>{codes})\s?{AMOUNT}{MAGNITUDE}"))?,
                AmountForm::IsoCode,
            ),
            (
                Regex::new(&format!(r"\b{AMOUNT}{MAGNITUDE}\s?(?P<code>{codes})\b"))?,
                AmountForm::IsoCode,
            ),
            (
                Regex::new(&format!(r"(?i)\b{AMOUNT}{MAGNITUDE}\s?{symbols}"))?,
                AmountForm::SymbolSuffix,
            ),
            (
                Regex::new(&format!(r"(?i)\b{AMOUNT}{MAGNITUDE}\s+{words}\b"))?,
                AmountForm::Written,
            ),
        ];

        Ok(Self { forms, threshold })
    }

    /// First amount of money in `text`, ignoring thresholds.
    pub fn first_amount(&self, text: &str) -> Option<Money> {
        self.forms
            .iter()
            .filter_map(|(re, _)| re.captures(text))
            .filter_map(|caps| Some((caps.get(0)?.start(), parse_money(&caps)?)))
            .min_by_key(|(start, _)| *start)
            .map(|(_, money)| money)
    }
}

impl Detector for CurrencyDetector {
    fn name(&self) -> &'static str {
        "currency"
    }

    fn pattern_type(&self) -> PatternType {
        PatternType::Currency
    }

    fn detect(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches = Vec::new();

        for (pattern, form) in &self.forms {
            for caps in pattern.captures_iter(text) {
                let (Some(whole), Some(money)) = (caps.get(0), parse_money(&caps)) else {
                    continue;
                };

                let mut confidence = form.base_confidence();
                let decimals = caps
                    .name("amount")
                    .and_then(|a| a.as_str().split_once('.'))
                    .map(|(_, frac)| frac.len());
                if decimals.is_some_and(|d| d > 2) {
                    confidence -= 0.1;
                }
                if confidence < self.threshold {
                    continue;
                }

                let symbol = caps.name("sym").map(|s| s.as_str());
                matches.push(PatternMatch::from_regex(
                    PatternType::Currency,
                    whole,
                    confidence,
                    describe(&money, symbol),
                ));
            }
        }

        matches
    }
}

fn parse_money(caps: &Captures<'_>) -> Option<Money> {
    let raw = caps.name("amount")?.as_str().replace(',', "");
    let mut amount: f64 = raw.parse().ok()?;

    if let Some(mag) = caps.name("mag") {
        amount *= match mag.as_str().to_lowercase().as_str() {
            "k" | "thousand" => 1e3,
            "m" | "million" => 1e6,
            "bn" | "billion" => 1e9,
            _ => 1.0,
        };
    }

    let code = if let Some(code) = caps.name("code") {
        RATE_SNAPSHOT
            .iter()
            .find(|(c, _)| *c == code.as_str())
            .map(|(c, _)| *c)?
    } else if let Some(sym) = caps.name("sym") {
        SYMBOLS
            .iter()
            .find(|(s, _)| *s == sym.as_str())
            .map(|(_, c)| *c)?
    } else {
        let word = caps.name("word")?.as_str().to_lowercase();
        WORDS
            .iter()
            .find(|(w, _)| word.starts_with(w))
            .map(|(_, c)| *c)?
    };

    Some(Money { amount, code })
}

fn describe(money: &Money, symbol: Option<&str>) -> crate::types::Metadata {
    let rates: Map<String, Value> = RATE_SNAPSHOT
        .iter()
        .map(|(code, rate)| (code.to_string(), Value::from(*rate)))
        .collect();
    let conversions: Map<String, Value> = RATE_SNAPSHOT
        .iter()
        .filter(|(code, _)| *code != money.code)
        .filter_map(|(code, _)| {
            convert(money.amount, money.code, code).map(|v| (code.to_string(), Value::from(round_to(v, 2))))
        })
        .collect();

    let mut meta = metadata([
        ("amount", Value::from(money.amount)),
        ("code", Value::from(money.code)),
        ("rates", Value::Object(rates)),
        ("conversions", Value::Object(conversions)),
    ]);
    if let Some(symbol) = symbol {
        meta.insert("symbol".into(), Value::from(symbol));
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> CurrencyDetector {
        CurrencyDetector::new(0.75).unwrap()
    }

    #[test]
    fn test_symbols_resolve_distinct_codes() {
        let dollars = detector().detect("costs $100 total");
        let euros = detector().detect("costs €100 total");
        assert_eq!(dollars[0].meta_str("code"), Some("USD"));
        assert_eq!(euros[0].meta_str("code"), Some("EUR"));
        assert_eq!(dollars[0].text, "$100");
        assert_eq!(euros[0].text, "€100");
    }

    #[test]
    fn test_iso_code_and_thousands() {
        let found = detector().detect("invoice: EUR 1,250.50");
        let m = &found[0];
        assert_eq!(m.metadata["amount"], 1250.5);
        assert_eq!(m.meta_str("code"), Some("EUR"));
        assert_eq!(m.confidence, 0.9);
    }

    #[test]
    fn test_written_amount() {
        let found = detector().detect("about 100 dollars");
        assert_eq!(found[0].text, "100 dollars");
        assert_eq!(found[0].meta_str("code"), Some("USD"));
    }

    #[test]
    fn test_magnitude_suffix() {
        let found = detector().detect("raised $1.5m");
        assert_eq!(found[0].metadata["amount"], 1_500_000.0);
    }

    #[test]
    fn test_conversions_use_snapshot() {
        let found = detector().detect("$100");
        assert_eq!(found[0].metadata["conversions"]["EUR"], 92.0);
        assert!(found[0].metadata["conversions"].get("USD").is_none());
    }

    #[test]
    fn test_convert_between_codes() {
        let eur = convert(100.0, "USD", "EUR").unwrap();
        assert!((eur - 92.0).abs() < 1e-9);
        assert!(convert(1.0, "USD", "XYZ").is_none());
    }
}
