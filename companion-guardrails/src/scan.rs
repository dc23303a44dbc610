use std::collections::BTreeMap;

use serde::Serialize;

/// Words and phrases that suggest the text carries credentials or other
/// sensitive data. Matched case-insensitively on whole words.
pub const SENSITIVE_KEYWORDS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "credential",
    "otp",
    "api key",
    "secret key",
    "access token",
    "bearer",
    "ssn",
    "aadhaar",
    "pan number",
    "credit card",
    "cvv",
];

/// Read-only findings for a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Matches per redaction rule. Rules with no match are omitted.
    pub matches: BTreeMap<String, usize>,
    /// Sensitive keywords present in the text.
    pub keywords: Vec<&'static str>,
}

impl ScanReport {
    /// Whether the scan found anything at all.
    pub fn is_clean(&self) -> bool {
        self.matches.is_empty() && self.keywords.is_empty()
    }
}

/// Sensitive keywords present in `text`, in [`SENSITIVE_KEYWORDS`] order.
pub fn find_sensitive_keywords(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    SENSITIVE_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| {
            let parts: Vec<&str> = keyword.split(' ').collect();
            words.windows(parts.len()).any(|window| window == parts.as_slice())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_single_and_multi_word_keywords() {
        let found = find_sensitive_keywords("Send the API key and the Password via Credit-Card form");
        assert_eq!(found, vec!["password", "api key", "credit card"]);
    }

    #[test]
    fn keywords_match_whole_words_only() {
        assert!(find_sensitive_keywords("a footprint of bottpanels").is_empty());
        assert_eq!(find_sensitive_keywords("your OTP is below"), vec!["otp"]);
    }

    #[test]
    fn empty_report_is_clean() {
        assert!(ScanReport::default().is_clean());
        let report = ScanReport {
            matches: BTreeMap::new(),
            keywords: vec!["secret"],
        };
        assert!(!report.is_clean());
    }
}
