//! Selection engine - owns detectors, the action catalog and preferences
//!
//! ```no_run
//! use selection_core::{RecordingHost, SelectionEngine};
//!
//! let mut engine = SelectionEngine::default();
//! engine.initialize()?;
//!
//! let analysis = engine.analyze("Call me at (555) 123-4567")?;
//! let call = &analysis.actions[2];
//! let result = engine.execute_action(call, "(555) 123-4567", &mut RecordingHost::new());
//! assert!(result.success);
//! # Ok::<(), selection_core::EngineError>(())
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::actions::{gateway, ActionCatalog, ActionContext, ActionExecutionResult, ActionHost, QuickAction};
use crate::config::{ActionPreferences, EngineConfig};
use crate::detectors::DetectorSet;
use crate::error::{EngineError, Result};
use crate::resolver::resolve;
use crate::types::PatternMatch;

/// Patterns found in a selection and the actions they unlock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub patterns: Vec<PatternMatch>,
    pub actions: Vec<QuickAction>,
}

/// State that exists only between `initialize` and `cleanup`.
struct Loaded {
    detectors: DetectorSet,
    catalog: ActionCatalog,
}

pub struct SelectionEngine {
    config: EngineConfig,
    preferences: ActionPreferences,
    loaded: Option<Loaded>,
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SelectionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            preferences: ActionPreferences::default(),
            loaded: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn preferences(&self) -> &ActionPreferences {
        &self.preferences
    }

    /// Compile detectors and build the action catalog. Calling it again is a no-op.
    pub fn initialize(&mut self) -> Result<()> {
        if self.loaded.is_some() {
            debug!("selection engine already initialized");
            return Ok(());
        }

        let detectors = DetectorSet::new(&self.config)?;
        let mut catalog = ActionCatalog::new();
        catalog.update_action_availability_from_preferences(&self.preferences);

        info!(
            detectors = detectors.iter().filter(|d| detectors.is_enabled(d.name())).count(),
            actions = catalog.actions().len(),
            "selection engine initialized"
        );
        self.loaded = Some(Loaded { detectors, catalog });
        Ok(())
    }

    /// Drop detectors and catalog. `initialize` must be called again before use.
    pub fn cleanup(&mut self) {
        if self.loaded.take().is_some() {
            info!("selection engine cleaned up");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.loaded.is_some()
    }

    fn loaded(&self) -> Result<&Loaded> {
        self.loaded.as_ref().ok_or(EngineError::NotInitialized)
    }

    /// Every candidate from every enabled detector, before conflict resolution.
    pub fn detect_candidates(&self, text: &str) -> Result<Vec<PatternMatch>> {
        let loaded = self.loaded()?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let text = clip(text, self.config.max_input_len);
        Ok(loaded.detectors.detect_all(text))
    }

    /// Non-overlapping classifications of `text`, most confident first.
    pub fn detect_patterns(&self, text: &str) -> Result<Vec<PatternMatch>> {
        let candidates = self.detect_candidates(text)?;
        let count = candidates.len();
        let patterns = resolve(candidates);
        debug!(candidates = count, patterns = patterns.len(), "detected patterns");
        Ok(patterns)
    }

    pub fn resolve_actions(&self, patterns: &[PatternMatch]) -> Result<Vec<QuickAction>> {
        Ok(self.loaded()?.catalog.resolve_actions(patterns))
    }

    /// Detection and action resolution in one call.
    pub fn analyze(&self, text: &str) -> Result<Analysis> {
        let patterns = self.detect_patterns(text)?;
        let actions = self.resolve_actions(&patterns)?;
        Ok(Analysis { patterns, actions })
    }

    /// Catalog entry for an action id.
    pub fn action(&self, id: &str) -> Result<&QuickAction> {
        self.loaded()?
            .catalog
            .get_by_id(id)
            .ok_or_else(|| EngineError::UnknownAction(id.to_string()))
    }

    pub fn actions(&self) -> Result<&[QuickAction]> {
        Ok(self.loaded()?.catalog.actions())
    }

    pub fn update_action_availability(&mut self, id: &str, enabled: bool) -> Result<()> {
        let loaded = self.loaded.as_mut().ok_or(EngineError::NotInitialized)?;
        loaded.catalog.update_action_availability(id, enabled)?;
        if enabled {
            self.preferences.enabled_actions.insert(id.to_string());
        } else {
            self.preferences.enabled_actions.remove(id);
        }
        debug!(action = id, enabled, "action availability updated");
        Ok(())
    }

    /// Replace the stored preferences and re-derive action availability.
    ///
    /// Before `initialize` the preferences are kept and applied when the
    /// catalog is built.
    pub fn update_action_availability_from_preferences(&mut self, preferences: ActionPreferences) {
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.catalog.update_action_availability_from_preferences(&preferences);
        }
        debug!(enabled = preferences.enabled_actions.len(), "preferences updated");
        self.preferences = preferences;
    }

    /// Run `action` on `text`. Never fails; problems come back in the result.
    pub fn execute_action(&self, action: &QuickAction, text: &str, host: &mut dyn ActionHost) -> ActionExecutionResult {
        let loaded = match self.loaded() {
            Ok(loaded) => loaded,
            Err(err) => return ActionExecutionResult::failed(format!("{} failed", action.name), err.to_string()),
        };
        let ctx = ActionContext::new(&self.preferences, &loaded.detectors);
        gateway::execute(action, text, &ctx, host)
    }
}

/// Longest prefix of `text` that fits in `max` bytes and ends on a char boundary.
fn clip(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionEffect, ActionType, RecordingHost};
    use crate::types::PatternType;

    fn engine() -> SelectionEngine {
        let mut engine = SelectionEngine::default();
        engine.initialize().unwrap();
        engine
    }

    #[test]
    fn test_not_initialized() {
        let engine = SelectionEngine::default();
        assert!(matches!(engine.detect_patterns("x"), Err(EngineError::NotInitialized)));
        assert!(matches!(engine.resolve_actions(&[]), Err(EngineError::NotInitialized)));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut engine = engine();
        engine.initialize().unwrap();
        assert!(engine.is_initialized());
        engine.cleanup();
        assert!(!engine.is_initialized());
        assert!(engine.detect_patterns("test@example.com").is_err());
    }

    #[test]
    fn test_blank_text_has_no_patterns() {
        let engine = engine();
        assert!(engine.detect_patterns("").unwrap().is_empty());
        assert!(engine.detect_patterns("  \n\t ").unwrap().is_empty());
    }

    #[test]
    fn test_email_selection() {
        let engine = engine();
        let patterns = engine.detect_patterns("test@example.com").unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].pattern_type, PatternType::Email);
        assert_eq!(patterns[0].meta_str("domain"), Some("example.com"));
    }

    #[test]
    fn test_analyze_phone() {
        let engine = engine();
        let analysis = engine.analyze("Call me at (555) 123-4567").unwrap();
        let ids: Vec<_> = analysis.actions.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["copy", "search", "call", "message"]);
    }

    #[test]
    fn test_preferences_before_initialize_are_applied() {
        let mut engine = SelectionEngine::default();
        let mut prefs = ActionPreferences::default();
        prefs.enabled_actions.remove("copy");
        engine.update_action_availability_from_preferences(prefs);
        engine.initialize().unwrap();

        let ids: Vec<_> = engine.resolve_actions(&[]).unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["search"]);
    }

    #[test]
    fn test_update_action_availability() {
        let mut engine = engine();
        engine.update_action_availability("search", false).unwrap();
        assert!(!engine.preferences().is_enabled("search"));
        assert!(!engine.action("search").unwrap().enabled);
        assert!(matches!(
            engine.update_action_availability("fly", true),
            Err(EngineError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_execute_action_through_host() {
        let engine = engine();
        let action = engine.action("copy").unwrap().clone();
        let mut host = RecordingHost::new();
        let result = engine.execute_action(&action, "hello", &mut host);
        assert!(result.success);
        assert_eq!(host.last(), Some(&ActionEffect::CopyToClipboard("hello".into())));
    }

    #[test]
    fn test_execute_before_initialize_fails_softly() {
        let engine = SelectionEngine::default();
        let result = engine.execute_action(&QuickAction::new(ActionType::Copy), "hi", &mut RecordingHost::new());
        assert!(!result.success);
    }

    #[test]
    fn test_input_is_clipped_on_char_boundary() {
        assert_eq!(clip("héllo", 2), "h");
        assert_eq!(clip("hello", 10), "hello");

        let mut engine = SelectionEngine::new(EngineConfig {
            max_input_len: 8,
            ..EngineConfig::default()
        });
        engine.initialize().unwrap();
        assert!(engine.detect_patterns("padding test@example.com").unwrap().is_empty());
    }
}
