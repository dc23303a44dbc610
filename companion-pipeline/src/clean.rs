/// Normalize pasted text before it is validated and redacted.
///
/// Line endings become `\n`, runs of three or more newlines shrink to a
/// blank line, runs of spaces and tabs shrink to one space, and the ends are
/// trimmed.
pub fn clean_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(normalized.len());
    let mut newline_run = 0;
    let mut in_spaces = false;

    for ch in normalized.chars() {
        match ch {
            '\n' => {
                newline_run += 1;
                in_spaces = false;
                if newline_run <= 2 {
                    out.push('\n');
                }
            }
            ' ' | '\t' => {
                newline_run = 0;
                if !in_spaces {
                    out.push(' ');
                    in_spaces = true;
                }
            }
            _ => {
                newline_run = 0;
                in_spaces = false;
                out.push(ch);
            }
        }
    }

    out.trim().to_string()
}
