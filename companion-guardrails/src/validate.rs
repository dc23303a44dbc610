/// Why an input was rejected before reaching the model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputViolation {
    #[error("input is empty")]
    Empty,

    #[error("input is too long: {chars} characters (limit {limit})")]
    TooLong { chars: usize, limit: usize },
}

/// Reject whitespace-only input and input longer than `max_chars`
/// characters.
pub fn validate_input(text: &str, max_chars: usize) -> Result<(), InputViolation> {
    if text.trim().is_empty() {
        return Err(InputViolation::Empty);
    }
    let chars = text.chars().count();
    if chars > max_chars {
        return Err(InputViolation::TooLong {
            chars,
            limit: max_chars,
        });
    }
    Ok(())
}
