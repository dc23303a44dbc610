use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use companion_pipeline::RunResult;
use serde::{Deserialize, Serialize};

/// Stored input is clipped to this many characters.
pub const MAX_EVENT_INPUT_CHARS: usize = 2_000;

/// One completed run, as written to the event log.
///
/// Only redacted text is ever stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub recipe_id: String,
    pub model: String,
    /// Redacted input, clipped to [`MAX_EVENT_INPUT_CHARS`].
    pub input: String,
    pub output: String,
    pub latency_ms: u64,
    pub redacted: bool,
    pub truncated: bool,
    /// Replacements per rule, input and output combined.
    #[serde(default)]
    pub redactions: BTreeMap<String, usize>,
    /// Where the input came from, e.g. a file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl RunEvent {
    pub fn from_result(result: &RunResult, source: Option<&str>) -> Self {
        let mut redactions = result.input_redactions.clone();
        for (rule, n) in &result.output_redactions {
            *redactions.entry(rule.clone()).or_default() += n;
        }
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            recipe_id: result.recipe_id.clone(),
            model: result.model.name.clone(),
            input: result.redacted_input.chars().take(MAX_EVENT_INPUT_CHARS).collect(),
            output: result.text.clone(),
            latency_ms: result.latency_ms,
            redacted: result.redacted,
            truncated: result.truncated,
            redactions,
            source: source.map(str::to_string),
        }
    }
}

/// Trait for event storage backends.
pub trait EventLog {
    fn append(&self, event: &RunEvent) -> Result<(), EventError>;
    fn load(&self) -> Result<Vec<RunEvent>, EventError>;
}

/// Event log kept as a single pretty-printed JSON array.
///
/// Appending rewrites the whole file; it is meant for local audit trails,
/// not high volume.
#[derive(Debug, Clone)]
pub struct JsonFileEventLog {
    path: PathBuf,
}

impl JsonFileEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventLog for JsonFileEventLog {
    fn append(&self, event: &RunEvent) -> Result<(), EventError> {
        let mut events = self.load()?;
        events.push(event.clone());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| EventError::Io(format!("{}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(&events)
            .map_err(|e| EventError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, json)
            .map_err(|e| EventError::Io(format!("{}: {e}", self.path.display())))?;
        tracing::debug!(path = %self.path.display(), events = events.len(), "appended run event");
        Ok(())
    }

    fn load(&self) -> Result<Vec<RunEvent>, EventError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)
            .map_err(|e| EventError::Io(format!("{}: {e}", self.path.display())))?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|e| {
            EventError::Serialization(format!("{}: {e}", self.path.display()))
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}
