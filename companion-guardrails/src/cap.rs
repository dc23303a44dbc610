use serde::Serialize;

/// Text after length capping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capped {
    pub text: String,
    pub truncated: bool,
}

/// Limit `text` to `max_chars` characters, marker included.
///
/// Text that already fits is returned unchanged. Otherwise it is cut,
/// trailing whitespace is trimmed and `marker` appended. The cut never lands
/// inside one of the `protected` tags; it moves back to the tag's start. When
/// the marker alone does not fit in `max_chars` it is left off.
pub fn cap(text: &str, max_chars: usize, marker: &str, protected: &[&str]) -> Capped {
    if text.chars().count() <= max_chars {
        return Capped {
            text: text.to_string(),
            truncated: false,
        };
    }

    let marker_chars = marker.chars().count();
    let (marker, budget) = if marker_chars <= max_chars {
        (marker, max_chars - marker_chars)
    } else {
        ("", max_chars)
    };

    let mut cut = text
        .char_indices()
        .nth(budget)
        .map_or(text.len(), |(idx, _)| idx);

    for tag in protected.iter().copied().filter(|t| !t.is_empty()) {
        for (start, _) in text.match_indices(tag) {
            if start >= cut {
                break;
            }
            if cut < start + tag.len() {
                cut = start;
            }
        }
    }

    let mut out = text[..cut].trim_end().to_string();
    out.push_str(marker);
    Capped {
        text: out,
        truncated: true,
    }
}
