//! Selection core - pattern recognition and action resolution for selected text
//!
//! Classifies a selection (email, phone, URL, tracking number, address,
//! date/time, currency, unit), resolves overlapping classifications, maps
//! the survivors to quick actions and runs an action through a host.

pub mod actions;
pub mod config;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod types;

pub use actions::{
    ActionCatalog, ActionContext, ActionEffect, ActionExecutionResult, ActionHost, ActionOutcome, ActionType,
    QuickAction, RecordingHost,
};
pub use config::{ActionPreferences, EngineConfig, Thresholds, UserPreferences};
pub use detectors::{Detector, DetectorSet};
pub use engine::{Analysis, SelectionEngine};
pub use error::{ActionError, DetectionFailure, EngineError, HostError};
pub use resolver::{overlaps, resolve};
pub use types::*;

// Python bindings
#[cfg(feature = "extension-module")]
pub mod py;

#[cfg(feature = "extension-module")]
use pyo3::prelude::*;

#[cfg(feature = "extension-module")]
#[pymodule]
fn selection_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use py::*;
    m.add_class::<PySelectionEngine>()?;
    m.add_function(wrap_pyfunction!(py_classify_date_time_type, m)?)?;
    Ok(())
}
