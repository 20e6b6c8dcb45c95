//! Completion-service boundary.
//!
//! The pipeline only ever needs one thing from the service: a text payload
//! expected to deserialize to a JSON array of instruction/input/output
//! objects. `CompletionBackend` captures that surface so stages can run
//! against a stub in tests; `CompletionClient` is the real
//! OpenAI-compatible implementation.

mod client;

pub use client::{
    CompletionBackend, CompletionClient, CompletionRequest, Message, SamplingParams,
};

/// Extract a JSON array from a completion payload, tolerating markdown
/// code fences and surrounding prose.
///
/// Returns `None` when no array can be located; the caller treats that as
/// a malformed reply.
pub fn extract_json_array(content: &str) -> Option<String> {
    let trimmed = content.trim();

    // Already bare JSON.
    if trimmed.starts_with('[') {
        if let Some(end) = find_matching_bracket(trimmed) {
            return Some(trimmed[..=end].to_string());
        }
        return Some(trimmed.to_string());
    }

    // Markdown code block, with or without a language tag.
    if let Some(start) = trimmed.find("```json") {
        let body_start = start + 7;
        if let Some(end) = trimmed[body_start..].find("```") {
            return Some(trimmed[body_start..body_start + end].trim().to_string());
        }
    }
    if let Some(start) = trimmed.find("```") {
        let body_start = start + 3;
        let line_end = trimmed[body_start..]
            .find('\n')
            .map(|i| body_start + i + 1)
            .unwrap_or(body_start);
        if let Some(end) = trimmed[line_end..].find("```") {
            return Some(trimmed[line_end..line_end + end].trim().to_string());
        }
    }

    // Array buried in prose.
    if let Some(start) = trimmed.find('[') {
        if let Some(end) = find_matching_bracket(&trimmed[start..]) {
            return Some(trimmed[start..=start + end].to_string());
        }
    }

    None
}

/// Index of the bracket matching the leading `[`, string-literal aware.
fn find_matching_bracket(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '[' if !in_string => depth += 1,
            ']' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bare_array() {
        let payload = r#"[{"instruction": "q", "input": "i", "output": "o"}]"#;
        assert_eq!(extract_json_array(payload), Some(payload.to_string()));
    }

    #[test]
    fn test_extract_from_json_fence() {
        let payload = "```json\n[{\"instruction\": \"q\"}]\n```";
        assert_eq!(
            extract_json_array(payload),
            Some("[{\"instruction\": \"q\"}]".to_string())
        );
    }

    #[test]
    fn test_extract_from_generic_fence() {
        let payload = "```\n[1, 2, 3]\n```";
        assert_eq!(extract_json_array(payload), Some("[1, 2, 3]".to_string()));
    }

    #[test]
    fn test_extract_from_surrounding_prose() {
        let payload = "Here are your records:\n[{\"a\": 1}]\nEnjoy!";
        assert_eq!(extract_json_array(payload), Some("[{\"a\": 1}]".to_string()));
    }

    #[test]
    fn test_brackets_inside_strings_ignored() {
        let payload = r#"[{"output": "use arr[0] and arr[1]"}]"#;
        assert_eq!(extract_json_array(payload), Some(payload.to_string()));
    }

    #[test]
    fn test_no_array_found() {
        assert_eq!(extract_json_array("I cannot help with that."), None);
        assert_eq!(extract_json_array(""), None);
    }
}
