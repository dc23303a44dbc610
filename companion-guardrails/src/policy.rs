use serde::{Deserialize, Serialize};

/// Appended to output that was cut to fit the length limit.
pub const DEFAULT_TRUNCATION_MARKER: &str = "…";
/// Output limit in characters, marker included.
pub const DEFAULT_MAX_OUTPUT_CHARS: usize = 600;
/// Input limit in characters, measured after cleaning.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 20_000;

// ---------------------------------------------------------------------------
// RedactionRule
// ---------------------------------------------------------------------------

/// A single redaction rule: every match of `pattern` becomes `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionRule {
    /// Short rule name used in redaction counts, e.g. `"email"`.
    pub name: String,
    /// Regular expression (Rust `regex` syntax).
    pub pattern: String,
    /// Placeholder tag, e.g. `"[EMAIL]"`.
    pub replacement: String,
}

impl RedactionRule {
    pub fn new(name: &str, pattern: &str, replacement: &str) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// Default PII rules, applied in order.
///
/// Credential assignments go first so a key value is replaced whole; card
/// and ID numbers go before the generic long-digit rule so they keep their
/// more specific tag.
pub fn default_rules() -> Vec<RedactionRule> {
    vec![
        RedactionRule::new(
            "secret",
            r"(?i)\b(?:api[_-]?key|secret(?:[_-]?key)?|access[_-]?token|token|password|passwd)\s*[:=]\s*\S+",
            "[SECRET]",
        ),
        RedactionRule::new(
            "email",
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            "[EMAIL]",
        ),
        RedactionRule::new("card", r"\b(?:\d[ -]?){12,18}\d\b", "[CARD]"),
        RedactionRule::new(
            "national_id",
            r"\b\d{4}[ -]?\d{4}[ -]?\d{4}\b",
            "[NATIONAL_ID]",
        ),
        RedactionRule::new("long_digits", r"\b\d{9,}\b", "[NUMBER]"),
        RedactionRule::new(
            "phone",
            r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{2,4}\)|\d{2,4})[\s.-]?\d{3,4}[\s.-]?\d{3,5}\b",
            "[PHONE]",
        ),
    ]
}

// ---------------------------------------------------------------------------
// GuardrailPolicy
// ---------------------------------------------------------------------------

fn default_max_output_chars() -> usize {
    DEFAULT_MAX_OUTPUT_CHARS
}

fn default_max_input_chars() -> usize {
    DEFAULT_MAX_INPUT_CHARS
}

fn default_truncation_marker() -> String {
    DEFAULT_TRUNCATION_MARKER.to_string()
}

/// Redaction rules and length limits. Loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailPolicy {
    #[serde(default = "default_rules")]
    pub rules: Vec<RedactionRule>,
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_truncation_marker")]
    pub truncation_marker: String,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            truncation_marker: DEFAULT_TRUNCATION_MARKER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_policy_values() {
        let policy = GuardrailPolicy::default();
        assert_eq!(policy.max_output_chars, 600);
        assert_eq!(policy.max_input_chars, 20_000);
        assert_eq!(policy.truncation_marker, "…");
        let names: Vec<&str> = policy.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["secret", "email", "card", "national_id", "long_digits", "phone"]
        );
    }

    #[test]
    fn empty_table_deserializes_to_defaults() {
        let policy: GuardrailPolicy = toml::from_str("").unwrap();
        assert_eq!(policy, GuardrailPolicy::default());
    }

    #[test]
    fn custom_rules_replace_defaults() {
        let policy: GuardrailPolicy = toml::from_str(
            r#"
            max_output_chars = 280

            [[rules]]
            name = "ticket"
            pattern = 'TICKET-\d+'
            replacement = "[TICKET]"
            "#,
        )
        .unwrap();
        assert_eq!(policy.max_output_chars, 280);
        assert_eq!(policy.rules.len(), 1);
        assert_eq!(policy.rules[0].replacement, "[TICKET]");
        assert_eq!(policy.truncation_marker, DEFAULT_TRUNCATION_MARKER);
    }

    #[test]
    fn policy_serialization_roundtrip() {
        let policy = GuardrailPolicy::default();
        let json = serde_json::to_string(&policy).unwrap();
        let back: GuardrailPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
