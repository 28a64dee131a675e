//! Detector set: one rule-based classifier per pattern category
//!
//! Every detector is a pure function of its input. Regexes are compiled once
//! when the set is built; a compile failure is an initialization failure.
//! Detectors filter by their own acceptance threshold, so everything a
//! detector returns is already a valid candidate for conflict resolution.

use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::DetectionFailure;
use crate::types::{Metadata, PatternMatch, PatternType};

pub mod address;
pub mod currency;
pub mod datetime;
pub mod email;
pub mod phone;
pub mod tracking;
pub mod unit;
pub mod url;

pub use address::{AddressDetector, PostalCodeDetector};
pub use currency::CurrencyDetector;
pub use datetime::{classify_date_time_type, DateTimeDetector};
pub use email::EmailDetector;
pub use phone::PhoneDetector;
pub use tracking::TrackingDetector;
pub use unit::UnitDetector;
pub use url::UrlDetector;

/// A classifier for one pattern category.
pub trait Detector {
    /// Stable name used in configuration and logs.
    fn name(&self) -> &'static str;

    fn pattern_type(&self) -> PatternType;

    /// Candidates at or above this detector's threshold, in discovery order.
    fn detect(&self, text: &str) -> Vec<PatternMatch>;
}

/// All detectors in declaration order.
///
/// Declaration order matters: the conflict resolver keeps it for
/// equal-confidence candidates.
pub struct DetectorSet {
    email: EmailDetector,
    phone: PhoneDetector,
    url: UrlDetector,
    tracking: TrackingDetector,
    address: AddressDetector,
    postal_code: PostalCodeDetector,
    date_time: DateTimeDetector,
    currency: CurrencyDetector,
    unit: UnitDetector,
    disabled: Vec<String>,
}

impl DetectorSet {
    pub fn new(config: &EngineConfig) -> Result<Self, regex::Error> {
        let t = &config.thresholds;
        Ok(Self {
            email: EmailDetector::new(t.email)?,
            phone: PhoneDetector::new(t.phone)?,
            url: UrlDetector::new(t.url)?,
            tracking: TrackingDetector::new(t.tracking_number)?,
            address: AddressDetector::new(t.address)?,
            postal_code: PostalCodeDetector::new(t.address)?,
            date_time: DateTimeDetector::new(t.date_time)?,
            currency: CurrencyDetector::new(t.currency)?,
            unit: UnitDetector::new(t.unit)?,
            disabled: config.disabled_detectors.clone(),
        })
    }

    /// Every detector, enabled or not, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Detector> {
        let all: [&dyn Detector; 9] = [
            &self.email,
            &self.phone,
            &self.url,
            &self.tracking,
            &self.address,
            &self.postal_code,
            &self.date_time,
            &self.currency,
            &self.unit,
        ];
        all.into_iter()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.iter().any(|d| d == name)
    }

    /// Run every enabled detector and concatenate the candidates.
    ///
    /// A detector that panics contributes nothing; the others still run.
    pub fn detect_all(&self, text: &str) -> Vec<PatternMatch> {
        let mut candidates = Vec::new();

        for detector in self.iter().filter(|d| self.is_enabled(d.name())) {
            match run_guarded(detector, text) {
                Ok(found) => {
                    debug!(detector = detector.name(), count = found.len(), "detector finished");
                    candidates.extend(found);
                }
                Err(failure) => warn!(%failure, "detector skipped"),
            }
        }

        candidates
    }

    pub fn email(&self) -> &EmailDetector {
        &self.email
    }

    pub fn phone(&self) -> &PhoneDetector {
        &self.phone
    }

    pub fn tracking(&self) -> &TrackingDetector {
        &self.tracking
    }

    pub fn date_time(&self) -> &DateTimeDetector {
        &self.date_time
    }

    pub fn currency(&self) -> &CurrencyDetector {
        &self.currency
    }

    pub fn unit(&self) -> &UnitDetector {
        &self.unit
    }
}

fn run_guarded(detector: &dyn Detector, text: &str) -> Result<Vec<PatternMatch>, DetectionFailure> {
    panic::catch_unwind(AssertUnwindSafe(|| detector.detect(text))).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string());
        DetectionFailure {
            detector: detector.name(),
            message,
        }
    })
}

/// Builds a metadata map from `(key, value)` pairs.
pub(crate) fn metadata<I, K>(pairs: I) -> Metadata
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// True when `text[start..end]` is not glued to surrounding letters or digits.
pub(crate) fn is_standalone(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// Round to `places` decimals for presentation in metadata.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
