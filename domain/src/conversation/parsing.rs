//! Question extraction from free-form model output

/// Extract questions from a list-shaped response, one per non-blank line
///
/// Accepts numbered (`1.`, `2)`, `Q3:`), bulleted (`-`, `*`, `•`) and plain
/// lines, and drops a leading `Question:` label.
pub fn parse_questions(raw: &str) -> Vec<String> {
    raw.lines().filter_map(parse_question).collect()
}

/// Clean a single line; `None` when nothing is left
pub fn parse_question(line: &str) -> Option<String> {
    let mut line = line.trim();
    if line.is_empty() {
        return None;
    }

    line = strip_numbering(line);

    for bullet in ['-', '*', '•'] {
        if let Some(rest) = line.strip_prefix(bullet) {
            line = rest.trim_start();
            break;
        }
    }

    if line
        .get(..9)
        .is_some_and(|label| label.eq_ignore_ascii_case("question:"))
    {
        line = line[9..].trim_start();
    }

    let line = line.trim();
    (!line.is_empty()).then(|| line.to_string())
}

fn strip_numbering(line: &str) -> &str {
    let body = match line.strip_prefix(['Q', 'q']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ if line.starts_with(|c: char| c.is_ascii_digit()) => line,
        _ => return line,
    };

    let after_digits = body.trim_start_matches(|c: char| c.is_ascii_digit());
    after_digits
        .trim_start_matches(['.', ')', ':', '-'])
        .trim_start()
}
