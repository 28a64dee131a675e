//! Engine configuration and user preferences
//!
//! `EngineConfig` tunes detection (thresholds, disabled detectors, input cap)
//! and is usually loaded from TOML. `UserPreferences` arrives from the host as
//! JSON and drives action availability and action bodies.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::actions::ActionType;
use crate::error::Result;
use crate::types::PatternType;

/// Per-category acceptance thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub email: f64,
    pub url: f64,
    pub currency: f64,
    pub unit: f64,
    pub tracking_number: f64,
    pub phone: f64,
    pub address: f64,
    pub date_time: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            email: 0.8,
            url: 0.8,
            currency: 0.75,
            unit: 0.75,
            tracking_number: 0.7,
            phone: 0.7,
            address: 0.65,
            date_time: 0.65,
        }
    }
}

impl Thresholds {
    pub fn for_type(&self, pattern_type: PatternType) -> f64 {
        match pattern_type {
            PatternType::Email => self.email,
            PatternType::Url => self.url,
            PatternType::Currency => self.currency,
            PatternType::Unit => self.unit,
            PatternType::TrackingNumber => self.tracking_number,
            PatternType::Phone => self.phone,
            PatternType::Address => self.address,
            PatternType::DateTime => self.date_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: Thresholds,
    /// Detector names (`"email"`, `"postal_code"`, ...) that are skipped.
    pub disabled_detectors: Vec<String>,
    /// Selections longer than this many bytes are truncated before detection.
    pub max_input_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            disabled_detectors: Vec::new(),
            max_input_len: 10_000,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn is_detector_enabled(&self, name: &str) -> bool {
        !self.disabled_detectors.iter().any(|d| d == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub actions: ActionPreferences,
}

impl UserPreferences {
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionPreferences {
    pub enabled_actions: AHashSet<String>,
    pub default_calendar: String,
    pub preferred_currency: String,
    /// `"metric"` or `"imperial"`.
    pub preferred_units: String,
    pub translation_target: String,
    pub note_platform: String,
    pub share_platform: String,
}

impl Default for ActionPreferences {
    fn default() -> Self {
        Self {
            enabled_actions: ActionType::ALL.iter().map(|t| t.id().to_string()).collect(),
            default_calendar: "google".to_string(),
            preferred_currency: "USD".to_string(),
            preferred_units: "metric".to_string(),
            translation_target: "en".to_string(),
            note_platform: "clipboard".to_string(),
            share_platform: "clipboard".to_string(),
        }
    }
}

impl ActionPreferences {
    pub fn is_enabled(&self, action_id: &str) -> bool {
        self.enabled_actions.contains(action_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_overrides_single_threshold() {
        let config = EngineConfig::from_toml_str(
            r#"
            disabled_detectors = ["postal_code"]

            [thresholds]
            phone = 0.8
            "#,
        )
        .unwrap();
        assert_eq!(config.thresholds.phone, 0.8);
        assert_eq!(config.thresholds.email, 0.8);
        assert!(!config.is_detector_enabled("postal_code"));
        assert!(config.is_detector_enabled("email"));
        assert_eq!(config.max_input_len, 10_000);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = EngineConfig::from_toml_str("thresholds = 3").unwrap_err();
        assert!(matches!(err, crate::error::EngineError::Config(_)));
    }

    #[test]
    fn test_preferences_from_host_json() {
        let prefs = UserPreferences::from_json(
            r#"{"actions": {"enabledActions": ["copy", "call"], "preferredCurrency": "EUR"}}"#,
        )
        .unwrap();
        assert!(prefs.actions.is_enabled("call"));
        assert!(!prefs.actions.is_enabled("message"));
        assert_eq!(prefs.actions.preferred_currency, "EUR");
        assert_eq!(prefs.actions.translation_target, "en");
    }

    #[test]
    fn test_default_preferences_enable_everything() {
        let prefs = ActionPreferences::default();
        for t in ActionType::ALL {
            assert!(prefs.is_enabled(t.id()));
        }
    }
}
