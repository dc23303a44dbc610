/// Guardrail configuration errors. These are raised while building a
/// [`crate::GuardrailFilter`] at startup, never while filtering text.
#[derive(Debug, thiserror::Error)]
pub enum GuardrailError {
    #[error("invalid pattern for redaction rule '{rule}': {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("redaction rule '{0}' has an empty replacement")]
    EmptyReplacement(String),

    #[error("replacement of rule '{rule}' is itself matched by rule '{matched_by}'")]
    UnstableReplacement { rule: String, matched_by: String },

    #[error("invalid guardrail policy: {0}")]
    InvalidPolicy(String),
}

pub type Result<T> = std::result::Result<T, GuardrailError>;
