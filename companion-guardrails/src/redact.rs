use std::collections::BTreeMap;

use regex::{NoExpand, Regex};
use serde::Serialize;

use crate::error::{GuardrailError, Result};
use crate::policy::RedactionRule;

/// Upper bound on rule-set passes. A pass that changes nothing ends the loop;
/// with stable replacements that happens on the second pass in practice.
const MAX_PASSES: usize = 8;

#[derive(Debug, Clone)]
struct CompiledRule {
    name: String,
    regex: Regex,
    replacement: String,
}

/// Outcome of a redaction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Redaction {
    pub text: String,
    /// Replacements made, per rule name. Rules with no match are omitted.
    pub counts: BTreeMap<String, usize>,
}

impl Redaction {
    /// Whether anything was replaced.
    pub fn applied(&self) -> bool {
        !self.counts.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Compiled, ordered redaction rules.
#[derive(Debug, Clone)]
pub struct Redactor {
    rules: Vec<CompiledRule>,
}

impl Redactor {
    /// Compile `rules`.
    ///
    /// Fails if a pattern does not compile, a replacement is empty, or a
    /// replacement tag would itself be matched by some rule (which would make
    /// redaction unstable).
    pub fn new(rules: &[RedactionRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            if rule.replacement.trim().is_empty() {
                return Err(GuardrailError::EmptyReplacement(rule.name.clone()));
            }
            let regex = Regex::new(&rule.pattern).map_err(|source| {
                GuardrailError::InvalidPattern {
                    rule: rule.name.clone(),
                    source,
                }
            })?;
            compiled.push(CompiledRule {
                name: rule.name.clone(),
                regex,
                replacement: rule.replacement.clone(),
            });
        }

        for rule in &compiled {
            if let Some(other) = compiled
                .iter()
                .find(|other| other.regex.is_match(&rule.replacement))
            {
                return Err(GuardrailError::UnstableReplacement {
                    rule: rule.name.clone(),
                    matched_by: other.name.clone(),
                });
            }
        }

        Ok(Self { rules: compiled })
    }

    /// Replace every match of every rule with the rule's tag.
    ///
    /// The rule set is re-applied until a pass changes nothing, so the
    /// result contains no match of any rule and `redact` is idempotent.
    pub fn redact(&self, text: &str) -> Redaction {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut current = text.to_string();

        for pass in 0..MAX_PASSES {
            let mut changed = false;
            for rule in &self.rules {
                let matches = rule.regex.find_iter(&current).count();
                if matches == 0 {
                    continue;
                }
                current = rule
                    .regex
                    .replace_all(&current, NoExpand(&rule.replacement))
                    .into_owned();
                *counts.entry(rule.name.clone()).or_default() += matches;
                changed = true;
            }
            if !changed {
                break;
            }
            if pass + 1 == MAX_PASSES {
                tracing::warn!(passes = MAX_PASSES, "redaction did not settle");
            }
        }

        Redaction {
            text: current,
            counts,
        }
    }

    /// Count matches per rule without modifying the text.
    pub fn count_matches(&self, text: &str) -> BTreeMap<String, usize> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let n = rule.regex.find_iter(text).count();
                (n > 0).then(|| (rule.name.clone(), n))
            })
            .collect()
    }

    /// The placeholder tags this redactor inserts.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.replacement.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
