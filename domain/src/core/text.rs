//! Text utilities for the domain layer.

/// Remove an enclosing markdown code fence from model output.
///
/// Strips surrounding whitespace, one leading fence (```` ``` ```` optionally
/// followed by `json`) and one trailing fence, then trims again. Anything
/// else, including fences in the middle of the text, is left untouched.
pub fn strip_code_fences(raw: &str) -> String {
    let mut cleaned = raw.trim();

    if let Some(rest) = cleaned.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        cleaned = rest.trim_start();
    }

    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest.trim_end();
    }

    cleaned.trim().to_string()
}
