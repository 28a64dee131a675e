//! Email address detection

use regex::Regex;
use serde_json::Value;

use super::{metadata, Detector};
use crate::types::{PatternMatch, PatternType};

const BASE_CONFIDENCE: f64 = 0.9;

/// Consumer mailbox providers; anything else is treated as a corporate domain.
const FREE_PROVIDERS: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "yahoo.com",
    "yahoo.co.uk",
    "hotmail.com",
    "outlook.com",
    "live.com",
    "msn.com",
    "aol.com",
    "icloud.com",
    "me.com",
    "mail.com",
    "gmx.com",
    "gmx.de",
    "web.de",
    "yandex.ru",
    "mail.ru",
    "protonmail.com",
    "proton.me",
    "zoho.com",
    "qq.com",
    "163.com",
];

const DISPOSABLE_DOMAINS: &[&str] = &[
    "mailinator.com",
    "guerrillamail.com",
    "10minutemail.com",
    "tempmail.com",
    "temp-mail.org",
    "throwawaymail.com",
    "yopmail.com",
    "trashmail.com",
    "getnada.com",
    "sharklasers.com",
    "dispostable.com",
    "maildrop.cc",
];

const DISPOSABLE_KEYWORDS: &[&str] = &["temp", "trash", "disposable", "throwaway", "burner"];

/// Country-code TLD → ISO 3166 alpha-2.
const TLD_COUNTRIES: &[(&str, &str)] = &[
    ("us", "US"),
    ("uk", "GB"),
    ("de", "DE"),
    ("fr", "FR"),
    ("es", "ES"),
    ("it", "IT"),
    ("nl", "NL"),
    ("be", "BE"),
    ("ch", "CH"),
    ("at", "AT"),
    ("se", "SE"),
    ("no", "NO"),
    ("dk", "DK"),
    ("fi", "FI"),
    ("pl", "PL"),
    ("pt", "PT"),
    ("ie", "IE"),
    ("ru", "RU"),
    ("ca", "CA"),
    ("mx", "MX"),
    ("br", "BR"),
    ("ar", "AR"),
    ("au", "AU"),
    ("nz", "NZ"),
    ("jp", "JP"),
    ("cn", "CN"),
    ("kr", "KR"),
    ("in", "IN"),
    ("il", "IL"),
    ("za", "ZA"),
    ("sg", "SG"),
];

pub struct EmailDetector {
    pattern: Regex,
    threshold: f64,
}

impl EmailDetector {
    pub fn new(threshold: f64) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")?,
            threshold,
        })
    }

    /// First plausible address in `text`, ignoring thresholds.
    pub fn first_address<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern.find(text).map(|m| m.as_str())
    }

    fn score(local: &str, domain: &str) -> f64 {
        let mut score = BASE_CONFIDENCE;
        if local.contains("..") || domain.contains("..") {
            score -= 0.3;
        }
        if local.starts_with('.') || local.ends_with('.') || domain.starts_with('.') {
            score -= 0.2;
        }
        let total = local.len() + 1 + domain.len();
        if local.len() > 64 || total > 254 || total < 6 {
            score -= 0.2;
        }
        score
    }
}

impl Detector for EmailDetector {
    fn name(&self) -> &'static str {
        "email"
    }

    fn pattern_type(&self) -> PatternType {
        PatternType::Email
    }

    fn detect(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches = Vec::new();

        for m in self.pattern.find_iter(text) {
            let Some((local, domain)) = m.as_str().split_once('@') else {
                continue;
            };

            let confidence = Self::score(local, domain);
            if confidence < self.threshold {
                continue;
            }

            matches.push(PatternMatch::from_regex(
                PatternType::Email,
                m,
                confidence,
                describe_domain(local, domain),
            ));
        }

        matches
    }
}

fn describe_domain(local: &str, domain: &str) -> crate::types::Metadata {
    let domain_lower = domain.to_lowercase();
    let tld = domain_lower.rsplit('.').next().unwrap_or_default().to_string();

    let disposable = DISPOSABLE_DOMAINS.contains(&domain_lower.as_str())
        || DISPOSABLE_KEYWORDS.iter().any(|k| domain_lower.contains(k));
    let corporate = !disposable && !FREE_PROVIDERS.contains(&domain_lower.as_str());

    let mut meta = metadata([
        ("local", Value::from(local)),
        ("domain", Value::from(domain_lower.as_str())),
        ("tld", Value::from(tld.as_str())),
        ("isCorporate", Value::from(corporate)),
        ("isDisposable", Value::from(disposable)),
    ]);

    if let Some((_, country)) = TLD_COUNTRIES.iter().find(|(t, _)| *t == tld) {
        meta.insert("country".into(), Value::from(*country));
    }

    meta
}
