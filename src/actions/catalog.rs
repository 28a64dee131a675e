//! Action catalog and pattern-to-action resolution

use tracing::debug;

use super::{ActionType, QuickAction};
use crate::config::ActionPreferences;
use crate::error::{EngineError, Result};
use crate::types::{PatternMatch, PatternType};

/// Offered for every selection, ahead of pattern-specific actions.
const UNIVERSAL: [ActionType; 2] = [ActionType::Copy, ActionType::Search];

/// Pattern-specific actions, in the order they are offered.
fn actions_for(pattern_type: PatternType) -> &'static [ActionType] {
    match pattern_type {
        PatternType::Address => &[ActionType::MapIt],
        PatternType::Email => &[ActionType::Email],
        PatternType::Phone => &[ActionType::Call, ActionType::Message],
        PatternType::DateTime => &[ActionType::Calendar],
        PatternType::TrackingNumber => &[ActionType::TrackPackage],
        PatternType::Currency | PatternType::Unit => &[ActionType::Convert],
        PatternType::Url => &[ActionType::QuickNote, ActionType::Share],
    }
}

/// One [`QuickAction`] per [`ActionType`], with its enabled flag.
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    actions: Vec<QuickAction>,
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self {
            actions: ActionType::ALL.into_iter().map(QuickAction::new).collect(),
        }
    }

    pub fn get(&self, action_type: ActionType) -> Option<&QuickAction> {
        self.actions.iter().find(|a| a.action_type == action_type)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&QuickAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// All actions in declaration order.
    pub fn actions(&self) -> &[QuickAction] {
        &self.actions
    }

    pub fn enabled_actions(&self) -> impl Iterator<Item = &QuickAction> {
        self.actions.iter().filter(|a| a.enabled)
    }

    fn is_enabled(&self, action_type: ActionType) -> bool {
        self.get(action_type).is_some_and(|a| a.enabled)
    }

    /// Ordered, de-duplicated actions for `patterns`.
    ///
    /// Universal actions come first, then each pattern's actions in pattern
    /// order. Disabled actions are never returned.
    pub fn resolve_actions(&self, patterns: &[PatternMatch]) -> Vec<QuickAction> {
        let wanted = UNIVERSAL
            .iter()
            .chain(patterns.iter().flat_map(|p| actions_for(p.pattern_type)));

        let mut resolved: Vec<QuickAction> = Vec::new();
        for &action_type in wanted {
            if !self.is_enabled(action_type) || resolved.iter().any(|a| a.action_type == action_type) {
                continue;
            }
            if let Some(action) = self.get(action_type) {
                resolved.push(action.clone());
            }
        }

        debug!(patterns = patterns.len(), actions = resolved.len(), "resolved actions");
        resolved
    }

    pub fn update_action_availability(&mut self, id: &str, enabled: bool) -> Result<()> {
        let action = self
            .actions
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| EngineError::UnknownAction(id.to_string()))?;
        action.enabled = enabled;
        Ok(())
    }

    pub fn update_action_availability_from_preferences(&mut self, preferences: &ActionPreferences) {
        for action in &mut self.actions {
            action.enabled = preferences.is_enabled(&action.id);
        }
    }
}
