//! Prompt templates with named `{placeholder}` slots.
//!
//! `{{` and `}}` stand for literal braces. Placeholder names are ASCII
//! alphanumerics and `_`. Templates are validated once when a recipe is
//! registered; filling re-walks the source, which is short.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Problems found while parsing or filling a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed placeholder starting at byte {0}")]
    Unclosed(usize),

    #[error("unmatched '}}' at byte {0}")]
    UnmatchedClose(usize),

    #[error("invalid placeholder name '{0}'")]
    InvalidName(String),

    #[error("missing value for placeholder '{0}'")]
    MissingVariable(String),
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Literal(String),
    Placeholder(&'a str),
}

/// A prompt template string such as `"Summarize:\n{context}"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptTemplate(String);

impl PromptTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that every brace in the template is balanced and every
    /// placeholder name is well formed.
    pub fn validate(&self) -> Result<(), TemplateError> {
        parse(&self.0).map(|_| ())
    }

    /// Unique placeholder names, in order of first appearance.
    pub fn placeholders(&self) -> Result<Vec<&str>, TemplateError> {
        let mut names: Vec<&str> = Vec::new();
        for segment in parse(&self.0)? {
            match segment {
                Segment::Placeholder(name) if !names.contains(&name) => names.push(name),
                _ => {}
            }
        }
        Ok(names)
    }

    /// Substitute every placeholder with its value from `vars`.
    ///
    /// Values are inserted verbatim; braces inside a value are not
    /// interpreted.
    pub fn fill(&self, vars: &BTreeMap<String, String>) -> Result<String, TemplateError> {
        let segments = parse(&self.0)?;
        let mut out = String::with_capacity(self.0.len());
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(&text),
                Segment::Placeholder(name) => match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => return Err(TemplateError::MissingVariable(name.to_string())),
                },
            }
        }
        Ok(out)
    }
}

impl From<&str> for PromptTemplate {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse(source: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    literal.push('{');
                    continue;
                }
                let mut end = None;
                for (j, inner) in chars.by_ref() {
                    if inner == '}' {
                        end = Some(j);
                        break;
                    }
                }
                let Some(end) = end else {
                    return Err(TemplateError::Unclosed(idx));
                };
                let name = &source[idx + 1..end];
                if !is_valid_name(name) {
                    return Err(TemplateError::InvalidName(name.to_string()));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(name));
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    literal.push('}');
                    continue;
                }
                return Err(TemplateError::UnmatchedClose(idx));
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}
