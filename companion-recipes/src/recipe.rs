use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RecipeError, Result};
use crate::template::{PromptTemplate, TemplateError};

/// Placeholder every recipe template must contain; receives the
/// (redacted) caller context.
pub const CONTEXT_PLACEHOLDER: &str = "context";

/// Coarse capability tier of a model profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Small model, quick answers.
    Fast,
    /// Larger model, better output at higher latency.
    Quality,
    /// Model with a long context window for long inputs.
    Long,
}

/// The model a recipe recommends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Model name as understood by the generation capability.
    pub name: String,
    pub tier: ModelTier,
}

impl ModelProfile {
    pub fn new(name: impl Into<String>, tier: ModelTier) -> Self {
        Self {
            name: name.into(),
            tier,
        }
    }
}

/// Profile switch for inputs longer than `threshold_chars`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongInputProfile {
    pub threshold_chars: usize,
    pub profile: ModelProfile,
}

fn default_deterministic() -> bool {
    true
}

/// Default generation parameters for a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationDefaults {
    /// Maximum number of new tokens the model may produce.
    pub max_new_length: u32,
    /// Greedy/beam decoding when true, sampling otherwise.
    #[serde(default = "default_deterministic")]
    pub deterministic: bool,
    /// Sampling temperature; ignored when `deterministic` is set.
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// How raw model output is shaped before the output guardrails run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputFormat {
    /// Output is passed through unchanged.
    #[default]
    Plain,
    /// Output is normalized into `- ` bullet lines, deduplicated, and limited
    /// to `max_bullets` lines.
    Bullets { max_bullets: usize },
}

/// A named prompt template plus its generation defaults.
///
/// Recipes are built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub template: PromptTemplate,
    pub defaults: GenerationDefaults,
    pub profile: ModelProfile,
    #[serde(default)]
    pub long_input: Option<LongInputProfile>,
    #[serde(default)]
    pub output_format: OutputFormat,
}

impl Recipe {
    /// Check the template parses and contains the `{context}` placeholder.
    pub fn validate(&self) -> Result<()> {
        let placeholders = self
            .template
            .placeholders()
            .map_err(|e| self.invalid_template(e.to_string()))?;
        if !placeholders.contains(&CONTEXT_PLACEHOLDER) {
            return Err(self.invalid_template(format!(
                "template has no {{{CONTEXT_PLACEHOLDER}}} placeholder"
            )));
        }
        if self.defaults.max_new_length == 0 {
            return Err(self.invalid_template("max_new_length must be positive".to_string()));
        }
        Ok(())
    }

    /// Fill the template. `vars` must provide every placeholder.
    pub fn render(&self, vars: &BTreeMap<String, String>) -> Result<String> {
        self.template.fill(vars).map_err(|e| match e {
            TemplateError::MissingVariable(name) => RecipeError::MissingVariable(name),
            other => self.invalid_template(other.to_string()),
        })
    }

    /// Model profile for an input of `input_chars` characters.
    pub fn select_profile(&self, input_chars: usize) -> &ModelProfile {
        match &self.long_input {
            Some(long) if input_chars > long.threshold_chars => &long.profile,
            _ => &self.profile,
        }
    }

    fn invalid_template(&self, reason: String) -> RecipeError {
        RecipeError::InvalidTemplate {
            recipe: self.id.clone(),
            reason,
        }
    }
}

/// Built-in recipes for meeting notes and similar free text.
pub fn built_in_recipes() -> Vec<Recipe> {
    let fast = ModelProfile::new("llama3.2:1b", ModelTier::Fast);
    vec![
        Recipe {
            id: "summary".into(),
            description: "Summarize notes into concise bullet points".into(),
            template: PromptTemplate::new(
                "Summarize the following notes as clear bullet points. \
                 Focus on decisions, key events, and owners. Keep important numbers. \
                 Return 5-8 concise bullet points:\n{context}",
            ),
            defaults: GenerationDefaults {
                max_new_length: 160,
                deterministic: true,
                temperature: None,
            },
            profile: fast.clone(),
            long_input: Some(LongInputProfile {
                threshold_chars: 4_000,
                profile: ModelProfile::new("llama3.1:8b", ModelTier::Long),
            }),
            output_format: OutputFormat::Bullets { max_bullets: 8 },
        },
        Recipe {
            id: "action_items".into(),
            description: "Extract action items with owners and due hints".into(),
            template: PromptTemplate::new(
                "From the following text, extract ACTION ITEMS as bullet points. \
                 Each bullet must start with an imperative verb and include owner if present \
                 and an optional due hint. Do NOT invent owners or dates. \
                 Return 5-10 bullets if available:\n{context}",
            ),
            defaults: GenerationDefaults {
                max_new_length: 180,
                deterministic: true,
                temperature: None,
            },
            profile: fast.clone(),
            long_input: None,
            output_format: OutputFormat::Bullets { max_bullets: 12 },
        },
        Recipe {
            id: "brainstorm".into(),
            description: "Brainstorm practical ideas from the text".into(),
            template: PromptTemplate::new(
                "Brainstorm creative IDEAS based on the following text. \
                 Return 6-10 short, non-redundant bullet points. \
                 Make them concrete, varied, and useful; avoid fluff:\n{context}",
            ),
            defaults: GenerationDefaults {
                max_new_length: 200,
                deterministic: false,
                temperature: Some(0.95),
            },
            profile: fast,
            long_input: None,
            output_format: OutputFormat::Bullets { max_bullets: 12 },
        },
    ]
}
