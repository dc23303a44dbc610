use crate::cap::{Capped, cap};
use crate::error::{GuardrailError, Result};
use crate::policy::GuardrailPolicy;
use crate::redact::{Redaction, Redactor};
use crate::scan::{ScanReport, find_sensitive_keywords};
use crate::validate::{InputViolation, validate_input};

/// A guardrail policy with its redaction rules compiled.
///
/// Built once at startup and shared read-only between concurrent runs.
#[derive(Debug, Clone)]
pub struct GuardrailFilter {
    policy: GuardrailPolicy,
    redactor: Redactor,
}

impl GuardrailFilter {
    pub fn new(policy: GuardrailPolicy) -> Result<Self> {
        if policy.max_output_chars == 0 {
            return Err(GuardrailError::InvalidPolicy(
                "max_output_chars must be positive".to_string(),
            ));
        }
        if policy.truncation_marker.chars().count() >= policy.max_output_chars {
            return Err(GuardrailError::InvalidPolicy(format!(
                "truncation marker {:?} does not fit in {} characters",
                policy.truncation_marker, policy.max_output_chars
            )));
        }
        let redactor = Redactor::new(&policy.rules)?;
        tracing::debug!(
            rules = redactor.len(),
            max_output_chars = policy.max_output_chars,
            max_input_chars = policy.max_input_chars,
            "guardrails ready"
        );
        Ok(Self { policy, redactor })
    }

    pub fn policy(&self) -> &GuardrailPolicy {
        &self.policy
    }

    /// Replace PII in `text` with placeholder tags.
    pub fn redact(&self, text: &str) -> Redaction {
        self.redactor.redact(text)
    }

    /// Cap `text` at `max_chars`, never splitting a placeholder tag.
    pub fn cap(&self, text: &str, max_chars: usize) -> Capped {
        let tags: Vec<&str> = self.redactor.tags().collect();
        cap(text, max_chars, &self.policy.truncation_marker, &tags)
    }

    /// The output limit in force for a run. A requested limit can only lower
    /// the policy maximum.
    pub fn effective_max_output(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(limit) => limit.min(self.policy.max_output_chars),
            None => self.policy.max_output_chars,
        }
    }

    /// Cap model output at the effective limit.
    pub fn cap_output(&self, text: &str, requested: Option<usize>) -> Capped {
        self.cap(text, self.effective_max_output(requested))
    }

    pub fn validate_input(&self, text: &str) -> std::result::Result<(), InputViolation> {
        validate_input(text, self.policy.max_input_chars)
    }

    /// Report PII matches and sensitive keywords without changing `text`.
    pub fn scan(&self, text: &str) -> ScanReport {
        ScanReport {
            matches: self.redactor.count_matches(text),
            keywords: find_sensitive_keywords(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RedactionRule;
    use pretty_assertions::assert_eq;

    fn filter() -> GuardrailFilter {
        GuardrailFilter::new(GuardrailPolicy::default()).unwrap()
    }

    #[test]
    fn requested_limit_only_lowers_the_maximum() {
        let filter = filter();
        assert_eq!(filter.effective_max_output(None), 600);
        assert_eq!(filter.effective_max_output(Some(100)), 100);
        assert_eq!(filter.effective_max_output(Some(4_000)), 600);
    }

    #[test]
    fn cap_output_respects_policy() {
        let filter = filter();
        let long = "word ".repeat(500);
        let capped = filter.cap_output(&long, None);
        assert!(capped.truncated);
        assert!(capped.text.chars().count() <= 600);
        assert!(capped.text.ends_with('…'));
    }

    #[test]
    fn cap_protects_redaction_tags() {
        let filter = filter();
        let redacted = filter.redact("reach me at someone@example.org please");
        assert_eq!(redacted.text, "reach me at [EMAIL] please");
        let capped = filter.cap(&redacted.text, 16);
        assert_eq!(capped.text, "reach me at…");
    }

    #[test]
    fn scan_reports_without_redacting() {
        let filter = filter();
        let report = filter.scan("password reset for jo@example.com, call 555-123-4567");
        assert_eq!(report.matches.get("email"), Some(&1));
        assert_eq!(report.matches.get("phone"), Some(&1));
        assert_eq!(report.keywords, vec!["password"]);
    }

    #[test]
    fn validate_input_uses_policy_limit() {
        let policy = GuardrailPolicy {
            max_input_chars: 10,
            ..GuardrailPolicy::default()
        };
        let filter = GuardrailFilter::new(policy).unwrap();
        assert!(filter.validate_input("short").is_ok());
        assert_eq!(
            filter.validate_input("much too long"),
            Err(InputViolation::TooLong {
                chars: 13,
                limit: 10
            })
        );
    }

    #[test]
    fn zero_output_limit_is_a_startup_error() {
        let policy = GuardrailPolicy {
            max_output_chars: 0,
            ..GuardrailPolicy::default()
        };
        assert!(matches!(
            GuardrailFilter::new(policy),
            Err(GuardrailError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn oversized_marker_is_a_startup_error() {
        let policy = GuardrailPolicy {
            max_output_chars: 3,
            truncation_marker: "[truncated]".to_string(),
            ..GuardrailPolicy::default()
        };
        assert!(matches!(
            GuardrailFilter::new(policy),
            Err(GuardrailError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn bad_rule_is_a_startup_error() {
        let policy = GuardrailPolicy {
            rules: vec![RedactionRule::new("bad", "[", "[X]")],
            ..GuardrailPolicy::default()
        };
        assert!(matches!(
            GuardrailFilter::new(policy),
            Err(GuardrailError::InvalidPattern { .. })
        ));
    }
}
