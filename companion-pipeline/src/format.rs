use std::collections::HashSet;

/// Column at which bullet bodies are wrapped.
pub const WRAP_WIDTH: usize = 120;

const BULLET_CHARS: [char; 4] = ['-', '•', '–', '*'];

/// Shape model output into at most `max_bullets` `- ` bullet lines.
///
/// Multi-line output is taken line by line with existing bullet markers
/// stripped; a single paragraph is split into sentences. Points that differ
/// only in case or punctuation are dropped, and long points wrap with a
/// two-space continuation indent.
pub fn to_bullets(text: &str, max_bullets: usize) -> String {
    let mut points = dedupe(split_points(text));
    points.truncate(max_bullets);

    // A word is never broken, so placeholder tags stay whole.
    let options = textwrap::Options::new(WRAP_WIDTH)
        .subsequent_indent("  ")
        .break_words(false);
    points
        .iter()
        .map(|point| format!("- {}", textwrap::fill(point, &options)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn split_points(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let points: Vec<&str> = if lines.len() >= 2 {
        lines.into_iter().map(strip_bullet).collect()
    } else {
        split_sentences(text.trim())
            .into_iter()
            .map(|s| s.trim_matches(|c: char| c.is_whitespace() || BULLET_CHARS.contains(&c)))
            .collect()
    };

    points
        .into_iter()
        .filter(|point| !point.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_bullet(line: &str) -> &str {
    let line = line.trim_start();
    line.strip_prefix(BULLET_CHARS).unwrap_or(line).trim()
}

/// Split after `.`, `!` or `?` when followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            out.push(&text[start..idx]);
            start = idx;
        }
        prev = Some(ch);
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

fn dedupe_key(point: &str) -> String {
    point
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn dedupe(points: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    points
        .into_iter()
        .filter(|point| {
            let key = dedupe_key(point);
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_existing_bullets() {
        let raw = "- Ship v2\n• Fix login\n\n* Call the vendor\n- ship v2!";
        assert_eq!(
            to_bullets(raw, 8),
            "- Ship v2\n- Fix login\n- Call the vendor"
        );
    }

    #[test]
    fn splits_single_paragraph_into_sentences() {
        let raw = "Ship it on Friday. Fix the bug!  Who owns QA? v2.1 is next";
        assert_eq!(
            to_bullets(raw, 8),
            "- Ship it on Friday.\n- Fix the bug!\n- Who owns QA?\n- v2.1 is next"
        );
    }

    #[test]
    fn limits_bullet_count() {
        let raw: String = (1..=12).map(|n| format!("- item {n}\n")).collect();
        let out = to_bullets(&raw, 5);
        assert_eq!(out.lines().count(), 5);
        assert!(out.ends_with("- item 5"));
    }

    #[test]
    fn wraps_long_points_with_indent() {
        let raw = "alpha ".repeat(40);
        let out = to_bullets(&raw, 8);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines.len() > 1);
        assert!(lines[0].starts_with("- alpha"));
        assert!(lines[1..].iter().all(|line| line.starts_with("  alpha")));
        assert!(lines.iter().all(|line| line.chars().count() <= WRAP_WIDTH + 2));
    }

    #[test]
    fn empty_and_punctuation_only_output() {
        assert_eq!(to_bullets("", 8), "");
        assert_eq!(to_bullets("-\n•\n...", 8), "");
    }

    #[test]
    fn long_words_are_not_broken() {
        let word = format!("{}[EMAIL]{}", "x".repeat(80), "y".repeat(80));
        let out = to_bullets(&format!("mail {word} now"), 8);
        assert!(out.contains(&word), "{out}");
        assert_eq!(out.matches("[EMAIL]").count(), 1);
    }

    #[test]
    fn redaction_tags_survive_formatting() {
        let raw = "Email [EMAIL] about the launch.\nCall [PHONE] tomorrow.";
        assert_eq!(
            to_bullets(raw, 8),
            "- Email [EMAIL] about the launch.\n- Call [PHONE] tomorrow."
        );
    }
}
