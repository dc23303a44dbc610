use std::collections::BTreeMap;

use companion_provider::GenerationParams;
use companion_recipes::ModelProfile;
use serde::{Deserialize, Serialize};

/// Per-call adjustments to a recipe's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOverrides {
    #[serde(default)]
    pub max_new_length: Option<u32>,
    #[serde(default)]
    pub deterministic: Option<bool>,
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Use this model instead of the recipe's profile.
    #[serde(default)]
    pub model: Option<String>,
    /// Lower the output limit for this call. Values above the policy
    /// maximum have no effect.
    #[serde(default)]
    pub max_output_chars: Option<usize>,
    /// Extra template variables. Redacted like the context.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

/// A single pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub recipe_id: String,
    pub context: String,
    #[serde(default)]
    pub overrides: RunOverrides,
}

impl RunRequest {
    pub fn new(recipe_id: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            context: context.into(),
            overrides: RunOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: RunOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    /// Redacted, formatted and capped model output.
    pub text: String,
    pub recipe_id: String,
    /// Whether any redaction was applied to input or output.
    pub redacted: bool,
    /// Whether `text` was cut to fit the output limit.
    pub truncated: bool,
    pub model: ModelProfile,
    /// Parameters actually sent to the generation capability.
    pub params: GenerationParams,
    pub input_redactions: BTreeMap<String, usize>,
    pub output_redactions: BTreeMap<String, usize>,
    /// Sensitive keywords noticed in the input.
    pub sensitive_keywords: Vec<String>,
    /// The cleaned context after redaction, as sent to the model.
    pub redacted_input: String,
    pub latency_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_deserializes_without_overrides() {
        let request: RunRequest =
            serde_json::from_str(r#"{"recipe_id": "summary", "context": "notes"}"#).unwrap();
        assert_eq!(request, RunRequest::new("summary", "notes"));
    }

    #[test]
    fn overrides_deserialize_partially() {
        let overrides: RunOverrides = serde_json::from_str(
            r#"{"model": "llama3.1:8b", "variables": {"audience": "execs"}}"#,
        )
        .unwrap();
        assert_eq!(overrides.model.as_deref(), Some("llama3.1:8b"));
        assert_eq!(overrides.max_new_length, None);
        assert_eq!(overrides.variables.get("audience").map(String::as_str), Some("execs"));
    }
}
