/// Strips markdown code fences the vision models like to wrap JSON in, so
/// structured parsing sees only the payload.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) up to the first newline
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_passes_through() {
        assert_eq!(strip_code_fences(r#"{"inputs":[]}"#), r#"{"inputs":[]}"#);
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn json_fences_are_removed() {
        let fenced = "```json\n{\"inputs\":[]}\n```";
        assert_eq!(strip_code_fences(fenced), r#"{"inputs":[]}"#);
    }

    #[test]
    fn anonymous_fences_are_removed() {
        let fenced = "```\n{\"click_type\":\"button\"}\n```";
        assert_eq!(strip_code_fences(fenced), r#"{"click_type":"button"}"#);
    }
}
