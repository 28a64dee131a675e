//! Python bindings for the selection engine using PyO3

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use serde_json::Value;

use crate::actions::{ActionExecutionResult, ActionHost, QuickAction};
use crate::config::{EngineConfig, UserPreferences};
use crate::detectors::classify_date_time_type;
use crate::engine::SelectionEngine;
use crate::error::{EngineError, HostError};
use crate::types::PatternMatch;

fn to_py_err(err: EngineError) -> PyErr {
    match err {
        EngineError::NotInitialized => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(err.to_string()),
        EngineError::UnknownAction(_) => PyErr::new::<pyo3::exceptions::PyKeyError, _>(err.to_string()),
        _ => PyErr::new::<pyo3::exceptions::PyValueError, _>(err.to_string()),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value)
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Failed to serialize: {}", e)))
}

/// Sub-type of a date/time string (Python function)
#[pyfunction]
pub fn py_classify_date_time_type(matched: &str) -> &'static str {
    classify_date_time_type(matched)
}

/// Performs nothing; Python reads the effect from the result's `data`.
struct DeferredHost;

impl ActionHost for DeferredHost {
    fn open_url(&mut self, _url: &str) -> Result<(), HostError> {
        Ok(())
    }

    fn copy_to_clipboard(&mut self, _text: &str) -> Result<(), HostError> {
        Ok(())
    }
}

/// Python wrapper for the selection engine
#[pyclass]
pub struct PySelectionEngine {
    inner: SelectionEngine,
}

#[pymethods]
impl PySelectionEngine {
    /// Create and initialize an engine, optionally from a TOML config string
    #[new]
    #[pyo3(signature = (config_toml=None))]
    fn new(config_toml: Option<&str>) -> PyResult<Self> {
        let config = match config_toml {
            Some(s) => EngineConfig::from_toml_str(s).map_err(to_py_err)?,
            None => EngineConfig::default(),
        };
        let mut inner = SelectionEngine::new(config);
        inner.initialize().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }

    fn cleanup(&mut self) {
        self.inner.cleanup();
    }

    fn initialize(&mut self) -> PyResult<()> {
        self.inner.initialize().map_err(to_py_err)
    }

    /// Detect patterns in the selected text
    fn detect_patterns<'py>(&self, text: &str, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        let patterns = self.inner.detect_patterns(text).map_err(to_py_err)?;
        let list = PyList::empty_bound(py);
        for p in &patterns {
            list.append(pattern_dict(py, p)?)?;
        }
        Ok(list)
    }

    /// Actions available for the selected text
    fn resolve_actions<'py>(&self, text: &str, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        let analysis = self.inner.analyze(text).map_err(to_py_err)?;
        let list = PyList::empty_bound(py);
        for action in &analysis.actions {
            list.append(action_dict(py, action)?)?;
        }
        Ok(list)
    }

    /// Patterns and actions as one JSON document
    fn analyze_json(&self, text: &str) -> PyResult<String> {
        let analysis = self.inner.analyze(text).map_err(to_py_err)?;
        to_json(&analysis)
    }

    /// Replace user preferences from the host's JSON storage format
    fn update_preferences(&mut self, preferences_json: &str) -> PyResult<()> {
        let prefs = UserPreferences::from_json(preferences_json).map_err(to_py_err)?;
        self.inner.update_action_availability_from_preferences(prefs.actions);
        Ok(())
    }

    fn update_action_availability(&mut self, action_id: &str, enabled: bool) -> PyResult<()> {
        self.inner
            .update_action_availability(action_id, enabled)
            .map_err(to_py_err)
    }

    /// Run an action; the effect is returned in `data` for the caller to perform
    fn execute_action<'py>(&self, action_id: &str, text: &str, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let action = self.inner.action(action_id).map_err(to_py_err)?;
        let result = self.inner.execute_action(action, text, &mut DeferredHost);
        result_dict(py, &result)
    }
}

fn pattern_dict<'py>(py: Python<'py>, p: &PatternMatch) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("type", p.pattern_type.as_str())?;
    dict.set_item("text", &p.text)?;
    dict.set_item("confidence", p.confidence)?;
    dict.set_item("start_index", p.start)?;
    dict.set_item("end_index", p.end)?;
    dict.set_item("metadata", to_json(&p.metadata)?)?;
    Ok(dict)
}

fn action_dict<'py>(py: Python<'py>, a: &QuickAction) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("id", &a.id)?;
    dict.set_item("name", &a.name)?;
    dict.set_item("description", &a.description)?;
    dict.set_item("icon", &a.icon)?;
    dict.set_item("type", a.action_type.id())?;
    dict.set_item("enabled", a.enabled)?;
    Ok(dict)
}

fn result_dict<'py>(py: Python<'py>, r: &ActionExecutionResult) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("success", r.success)?;
    dict.set_item("message", &r.message)?;
    match &r.data {
        Some(Value::Null) | None => dict.set_item("data", py.None())?,
        Some(data) => dict.set_item("data", to_json(data)?)?,
    }
    dict.set_item("error", r.error.as_deref())?;
    Ok(dict)
}
