//! Action execution gateway
//!
//! The single place actions are run. Whatever goes wrong (a failing body,
//! a host error, a panic) comes back as a failed [`ActionExecutionResult`].

use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::{debug, error};

use super::{behaviors, ActionContext, ActionEffect, ActionExecutionResult, ActionHost, QuickAction};
use crate::error::ActionError;

/// Run `action` on `text` and hand its effect to `host`.
pub fn execute(
    action: &QuickAction,
    text: &str,
    ctx: &ActionContext<'_>,
    host: &mut dyn ActionHost,
) -> ActionExecutionResult {
    if !action.enabled {
        let err = ActionError::Disabled(action.id.clone());
        error!(action = %action.id, error = %err, "action execution failed");
        return ActionExecutionResult::failed(format!("{} failed", action.name), err.to_string());
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| behaviors::run(action.action_type, text, ctx)))
        .unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "action panicked".to_string());
            Err(ActionError::Failed(message))
        });

    let result = outcome.and_then(|outcome| {
        host.apply(&outcome.effect)?;
        Ok(outcome)
    });

    match result {
        Ok(outcome) => {
            debug!(action = %action.id, "action executed");
            let data = describe(&outcome.effect, outcome.data);
            ActionExecutionResult::succeeded(outcome.message, Some(data))
        }
        Err(err) => {
            error!(action = %action.id, error = %err, "action execution failed");
            ActionExecutionResult::failed(format!("{} failed", action.name), err.to_string())
        }
    }
}

/// Result data: the body's own data plus the effect that was applied.
fn describe(effect: &ActionEffect, data: Option<Value>) -> Value {
    let mut out = match data {
        Some(Value::Object(map)) => map,
        Some(other) => {
            let mut map = serde_json::Map::new();
            map.insert("value".into(), other);
            map
        }
        None => serde_json::Map::new(),
    };
    let (kind, target) = match effect {
        ActionEffect::OpenUrl(url) => ("open_url", url),
        ActionEffect::CopyToClipboard(text) => ("copy_to_clipboard", text),
    };
    out.insert("effect".into(), Value::from(kind));
    out.insert("target".into(), Value::from(target.as_str()));
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionType, RecordingHost};
    use crate::config::{ActionPreferences, EngineConfig};
    use crate::detectors::DetectorSet;
    use crate::error::HostError;

    fn run(action: &QuickAction, text: &str, host: &mut dyn ActionHost) -> ActionExecutionResult {
        let set = DetectorSet::new(&EngineConfig::default()).unwrap();
        let prefs = ActionPreferences::default();
        let ctx = ActionContext::new(&prefs, &set);
        execute(action, text, &ctx, host)
    }

    #[test]
    fn test_success_reports_target() {
        let mut host = RecordingHost::new();
        let result = run(&QuickAction::new(ActionType::Search), "rust", &mut host);
        assert!(result.success);
        assert_eq!(result.error, None);
        let data = result.data.unwrap();
        assert_eq!(data["effect"], "open_url");
        assert_eq!(data["target"], "https://www.google.com/search?q=rust");
        assert_eq!(
            host.last(),
            Some(&ActionEffect::OpenUrl("https://www.google.com/search?q=rust".into()))
        );
    }

    #[test]
    fn test_body_error_becomes_failed_result() {
        let mut host = RecordingHost::new();
        let result = run(&QuickAction::new(ActionType::Call), "no digits here", &mut host);
        assert!(!result.success);
        assert!(result.error.unwrap().contains("no phone number"));
        assert!(host.effects.is_empty());
    }

    #[test]
    fn test_host_error_becomes_failed_result() {
        let mut host = RecordingHost::failing("clipboard unavailable");
        let result = run(&QuickAction::new(ActionType::Copy), "hello", &mut host);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("clipboard unavailable"));
        assert_eq!(result.message, "Copy failed");
    }

    #[test]
    fn test_disabled_action_is_refused() {
        let mut action = QuickAction::new(ActionType::Share);
        action.enabled = false;
        let mut host = RecordingHost::new();
        let result = run(&action, "hello", &mut host);
        assert!(!result.success);
        assert!(host.effects.is_empty());
    }

    struct OfflineHost;

    impl ActionHost for OfflineHost {
        fn open_url(&mut self, _url: &str) -> Result<(), HostError> {
            Err(HostError::new("no browser"))
        }

        fn copy_to_clipboard(&mut self, _text: &str) -> Result<(), HostError> {
            Err(HostError::new("no clipboard"))
        }
    }

    #[test]
    fn test_custom_host_errors_surface() {
        let result = run(&QuickAction::new(ActionType::MapIt), "Main St", &mut OfflineHost);
        assert_eq!(result.error.as_deref(), Some("no browser"));
    }

    struct NoopHost;

    impl ActionHost for NoopHost {
        fn open_url(&mut self, _url: &str) -> Result<(), HostError> {
            Ok(())
        }

        fn copy_to_clipboard(&mut self, _text: &str) -> Result<(), HostError> {
            Ok(())
        }
    }

    #[test]
    fn test_stateless_host_gets_effect_from_data() {
        let result = run(&QuickAction::new(ActionType::Copy), "hello", &mut NoopHost);
        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data["effect"], "copy_to_clipboard");
        assert_eq!(data["target"], "hello");
    }
}
