//! Quick actions offered for a selection
//!
//! [`ActionType`] is the closed set of actions. The catalog maps each to a
//! [`QuickAction`] record, `behaviors` builds an action's effect, and the
//! gateway applies that effect through an [`ActionHost`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ActionPreferences;
use crate::detectors::DetectorSet;
use crate::error::HostError;

pub mod behaviors;
pub mod catalog;
pub mod gateway;

pub use catalog::ActionCatalog;
pub use gateway::execute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    MapIt,
    Email,
    Calendar,
    TrackPackage,
    Call,
    Message,
    Copy,
    Search,
    Convert,
    Translate,
    Define,
    QuickNote,
    Share,
}

impl ActionType {
    pub const ALL: [ActionType; 13] = [
        ActionType::MapIt,
        ActionType::Email,
        ActionType::Calendar,
        ActionType::TrackPackage,
        ActionType::Call,
        ActionType::Message,
        ActionType::Copy,
        ActionType::Search,
        ActionType::Convert,
        ActionType::Translate,
        ActionType::Define,
        ActionType::QuickNote,
        ActionType::Share,
    ];

    /// Stable id used by preferences and hosts.
    pub fn id(&self) -> &'static str {
        match self {
            ActionType::MapIt => "map-it",
            ActionType::Email => "email",
            ActionType::Calendar => "calendar",
            ActionType::TrackPackage => "track-package",
            ActionType::Call => "call",
            ActionType::Message => "message",
            ActionType::Copy => "copy",
            ActionType::Search => "search",
            ActionType::Convert => "convert",
            ActionType::Translate => "translate",
            ActionType::Define => "define",
            ActionType::QuickNote => "quick-note",
            ActionType::Share => "share",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionType::MapIt => "Map It",
            ActionType::Email => "Email",
            ActionType::Calendar => "Add to Calendar",
            ActionType::TrackPackage => "Track Package",
            ActionType::Call => "Call",
            ActionType::Message => "Message",
            ActionType::Copy => "Copy",
            ActionType::Search => "Search",
            ActionType::Convert => "Convert",
            ActionType::Translate => "Translate",
            ActionType::Define => "Define",
            ActionType::QuickNote => "Quick Note",
            ActionType::Share => "Share",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ActionType::MapIt => "Open the address in a map",
            ActionType::Email => "Compose an email",
            ActionType::Calendar => "Create a calendar event",
            ActionType::TrackPackage => "Open the carrier's tracking page",
            ActionType::Call => "Call this number",
            ActionType::Message => "Send a text message",
            ActionType::Copy => "Copy the selection",
            ActionType::Search => "Search the web",
            ActionType::Convert => "Convert the amount or measurement",
            ActionType::Translate => "Translate the selection",
            ActionType::Define => "Look up a definition",
            ActionType::QuickNote => "Save the selection as a note",
            ActionType::Share => "Share the selection",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ActionType::MapIt => "map-pin",
            ActionType::Email => "mail",
            ActionType::Calendar => "calendar",
            ActionType::TrackPackage => "package",
            ActionType::Call => "phone",
            ActionType::Message => "message-circle",
            ActionType::Copy => "copy",
            ActionType::Search => "search",
            ActionType::Convert => "repeat",
            ActionType::Translate => "globe",
            ActionType::Define => "book-open",
            ActionType::QuickNote => "edit",
            ActionType::Share => "share",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// An action as presented to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAction {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub enabled: bool,
}

impl QuickAction {
    pub fn new(action_type: ActionType) -> Self {
        Self {
            id: action_type.id().to_string(),
            name: action_type.name().to_string(),
            description: action_type.description().to_string(),
            icon: action_type.icon().to_string(),
            action_type,
            enabled: true,
        }
    }
}

/// Outcome reported back to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExecutionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionExecutionResult {
    pub fn succeeded(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Side effect an action asks the host to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum ActionEffect {
    OpenUrl(String),
    CopyToClipboard(String),
}

/// What an action body produced, before the host applies it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub message: String,
    pub effect: ActionEffect,
    pub data: Option<Value>,
}

impl ActionOutcome {
    pub fn open(message: impl Into<String>, url: String) -> Self {
        Self {
            message: message.into(),
            effect: ActionEffect::OpenUrl(url),
            data: None,
        }
    }

    pub fn copy(message: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            effect: ActionEffect::CopyToClipboard(text.into()),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Everything an action body may read.
pub struct ActionContext<'a> {
    pub preferences: &'a ActionPreferences,
    /// Anchor for relative dates such as "tomorrow".
    pub now: NaiveDateTime,
    pub detectors: &'a DetectorSet,
}

impl<'a> ActionContext<'a> {
    pub fn new(preferences: &'a ActionPreferences, detectors: &'a DetectorSet) -> Self {
        Self {
            preferences,
            now: chrono::Local::now().naive_local(),
            detectors,
        }
    }

    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }
}

/// The platform side of an action: browser, clipboard.
pub trait ActionHost {
    fn open_url(&mut self, url: &str) -> Result<(), HostError>;

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), HostError>;

    fn apply(&mut self, effect: &ActionEffect) -> Result<(), HostError> {
        match effect {
            ActionEffect::OpenUrl(url) => self.open_url(url),
            ActionEffect::CopyToClipboard(text) => self.copy_to_clipboard(text),
        }
    }
}

/// Host that records effects instead of performing them.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub effects: Vec<ActionEffect>,
    fail_with: Option<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose every effect fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            effects: Vec::new(),
            fail_with: Some(message.into()),
        }
    }

    pub fn last(&self) -> Option<&ActionEffect> {
        self.effects.last()
    }

    fn record(&mut self, effect: ActionEffect) -> Result<(), HostError> {
        if let Some(message) = &self.fail_with {
            return Err(HostError::new(message.clone()));
        }
        self.effects.push(effect);
        Ok(())
    }
}

impl ActionHost for RecordingHost {
    fn open_url(&mut self, url: &str) -> Result<(), HostError> {
        self.record(ActionEffect::OpenUrl(url.to_string()))
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), HostError> {
        self.record(ActionEffect::CopyToClipboard(text.to_string()))
    }
}
