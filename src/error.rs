//! Error types for the selection engine

use thiserror::Error;

/// Errors returned by [`crate::SelectionEngine`] calls.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("selection engine used before initialize()")]
    NotInitialized,

    #[error("failed to compile detector pattern: {0}")]
    PatternCompile(#[from] regex::Error),

    #[error("unknown action id: \"{0}\"")]
    UnknownAction(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// A detector that failed mid-scan. Logged and swallowed; the detector
/// contributes no candidates.
#[derive(Debug, Error)]
#[error("detector \"{detector}\" failed: {message}")]
pub struct DetectionFailure {
    pub detector: &'static str,
    pub message: String,
}

/// Failure reported by an [`crate::ActionHost`] while applying an effect.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failures of an action body that its own fallback could not recover.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("nothing selected")]
    EmptySelection,

    #[error("no phone number found in \"{0}\"")]
    NoPhoneNumber(String),

    #[error("action \"{0}\" is disabled")]
    Disabled(String),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("{0}")]
    Failed(String),
}
