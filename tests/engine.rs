use proptest::prelude::*;
use selection_core::{
    overlaps, ActionEffect, ActionPreferences, EngineConfig, PatternType, RecordingHost, SelectionEngine,
    UserPreferences,
};

fn engine() -> SelectionEngine {
    let mut engine = SelectionEngine::default();
    engine.initialize().unwrap();
    engine
}

fn action_ids(engine: &SelectionEngine, text: &str) -> Vec<String> {
    engine
        .analyze(text)
        .unwrap()
        .actions
        .into_iter()
        .map(|a| a.id)
        .collect()
}

#[test]
fn email_selection_is_one_full_match() {
    let patterns = engine().detect_patterns("test@example.com").unwrap();
    assert_eq!(patterns.len(), 1);
    let m = &patterns[0];
    assert_eq!(m.pattern_type, PatternType::Email);
    assert_eq!((m.start, m.end), (0, "test@example.com".len()));
    assert_eq!(m.meta_str("domain"), Some("example.com"));
}

#[test]
fn ups_tracking_number() {
    let patterns = engine().detect_patterns("1Z999AA10123456784").unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].pattern_type, PatternType::TrackingNumber);
    assert_eq!(patterns[0].meta_str("carrier"), Some("ups"));
}

#[test]
fn currency_symbols() {
    let engine = engine();
    let dollars = engine.detect_patterns("$100").unwrap();
    let euros = engine.detect_patterns("€100").unwrap();
    assert_eq!(dollars[0].pattern_type, PatternType::Currency);
    assert_eq!(dollars[0].meta_str("code"), Some("USD"));
    assert_eq!(euros[0].pattern_type, PatternType::Currency);
    assert_eq!(euros[0].meta_str("code"), Some("EUR"));
}

#[test]
fn ambiguous_twelve_digit_number_keeps_one_carrier() {
    let engine = engine();
    let candidates = engine.detect_candidates("123456789012").unwrap();
    assert!(candidates.len() >= 2);

    let patterns = engine.detect_patterns("123456789012").unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].meta_str("carrier"), Some("fedex"));
    assert_eq!(patterns[0].confidence, 0.9);
}

#[test]
fn phone_actions_follow_preferences() {
    let mut engine = engine();
    let text = "Call me at (555) 123-4567";
    let ids = action_ids(&engine, text);
    assert!(ids.contains(&"call".to_string()));
    assert!(ids.contains(&"message".to_string()));

    let prefs = UserPreferences::from_json(r#"{"actions": {"enabledActions": ["copy", "search", "call"]}}"#).unwrap();
    engine.update_action_availability_from_preferences(prefs.actions);
    let ids = action_ids(&engine, text);
    assert!(ids.contains(&"call".to_string()));
    assert!(!ids.contains(&"message".to_string()));

    engine.update_action_availability("call", false).unwrap();
    assert!(!action_ids(&engine, text).contains(&"call".to_string()));
}

#[test]
fn universal_actions_only_when_nothing_detected() {
    let mut engine = engine();
    assert_eq!(action_ids(&engine, "just some words"), vec!["copy", "search"]);

    let mut prefs = ActionPreferences::default();
    prefs.enabled_actions.remove("copy");
    prefs.enabled_actions.remove("search");
    engine.update_action_availability_from_preferences(prefs);
    assert!(engine.resolve_actions(&[]).unwrap().is_empty());
}

#[test]
fn mixed_selection_end_to_end() {
    let engine = engine();
    let text = "Email jane@acme.io or visit https://acme.io/contact before March 20, 2024";
    let analysis = engine.analyze(text).unwrap();

    let types: Vec<_> = analysis.patterns.iter().map(|p| p.pattern_type).collect();
    assert!(types.contains(&PatternType::Email));
    assert!(types.contains(&PatternType::Url));
    assert!(types.contains(&PatternType::DateTime));

    let email = engine.action("email").unwrap().clone();
    let mut host = RecordingHost::new();
    let result = engine.execute_action(&email, text, &mut host);
    assert!(result.success);
    assert_eq!(host.last(), Some(&ActionEffect::OpenUrl("mailto:jane@acme.io".into())));
}

#[test]
fn config_from_toml_disables_detector() {
    let config = EngineConfig::from_toml_str(r#"disabled_detectors = ["email"]"#).unwrap();
    let mut engine = SelectionEngine::new(config);
    engine.initialize().unwrap();
    let patterns = engine.detect_patterns("test@example.com").unwrap();
    assert!(patterns.iter().all(|p| p.pattern_type != PatternType::Email));
}

const SNIPPETS: &[&str] = &[
    "test@example.com",
    "(555) 123-4567",
    "+44 20 7946 0958",
    "https://example.org/a?b=c",
    "www.rust-lang.org",
    "1Z999AA10123456784",
    "123456789012",
    "RR123456789GB",
    "1600 Pennsylvania Avenue NW, Washington, DC 20500",
    "Hauptstraße 5, 10115 Berlin",
    "March 15, 2024",
    "03/15/2024",
    "3:30 PM",
    "tomorrow",
    "meeting at 3pm",
    "$1,250.50",
    "100 EUR",
    "5 kg",
    "72°F",
    "10 miles",
    "hello",
    "and",
    ",",
    "42",
];

fn selection() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::collection::vec(prop::sample::select(SNIPPETS), 0..6).prop_map(|parts| parts.join(" ")),
        "\\PC{0,80}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn resolved_patterns_never_overlap(text in selection()) {
        let patterns = engine().detect_patterns(&text).unwrap();
        for (i, a) in patterns.iter().enumerate() {
            for b in &patterns[i + 1..] {
                prop_assert!(!overlaps(a, b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn patterns_respect_thresholds(text in selection()) {
        let engine = engine();
        let thresholds = &engine.config().thresholds;
        for p in engine.detect_patterns(&text).unwrap() {
            prop_assert!(p.confidence >= thresholds.for_type(p.pattern_type));
            prop_assert!(p.confidence <= selection_core::MAX_CONFIDENCE);
            prop_assert!(p.start < p.end);
            prop_assert_eq!(&text[p.start..p.end], p.text.as_str());
        }
    }

    #[test]
    fn detection_is_deterministic(text in selection()) {
        let engine = engine();
        let first = engine.detect_patterns(&text).unwrap();
        let second = engine.detect_patterns(&text).unwrap();
        prop_assert_eq!(first, second);
    }
}
