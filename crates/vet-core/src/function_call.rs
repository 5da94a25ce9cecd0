//! Function-call sentinel returned by the backend.
//!
//! Instead of prose, the backend may answer with a JSON marker asking the
//! caller to run one of the specialized analyses:
//!
//! ```json
//! {"function_call": {"name": "analyze_skin", "arguments": {"reason": "lesion"}}}
//! ```
//!
//! The marker may be wrapped in a markdown code block or followed by stray
//! text; [`FunctionCall::parse`] tolerates both.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::analysis::AnalysisKind;

/// A parsed function-call sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the requested function.
    pub name: String,
    /// Arguments as a JSON object.
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct Envelope {
    function_call: FunctionCall,
}

impl FunctionCall {
    /// Parse a backend reply. Returns `None` for ordinary prose.
    pub fn parse(reply: &str) -> Option<Self> {
        if !reply.contains("function_call") {
            return None;
        }
        let json = extract_json(reply);
        serde_json::from_str::<Envelope>(json)
            .ok()
            .map(|envelope| envelope.function_call)
    }

    /// The analysis this call names, if it names one.
    pub fn analysis_kind(&self) -> Option<AnalysisKind> {
        match self.name.trim().to_lowercase().as_str() {
            "analyze_skin" | "analyze_skin_lesion" | "skin_analysis" => Some(AnalysisKind::Skin),
            "analyze_eye" | "analyze_ocular" | "ocular_analysis" | "eye_analysis" => {
                Some(AnalysisKind::Ocular)
            }
            "analyze_body" | "analyze_body_condition" | "analyze_obesity" | "body_analysis" => {
                Some(AnalysisKind::Body)
            }
            "analyze_posture" | "analyze_dysplasia" | "posture_analysis" | "dysplasia_analysis" => {
                Some(AnalysisKind::Dysplasia)
            }
            _ => None,
        }
    }

    /// Get a string argument by name.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// Extract JSON from a response that may contain markdown or other text.
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    // If it starts with {, extract balanced JSON object
    if trimmed.starts_with('{') {
        return extract_balanced_json(trimmed);
    }

    // Try to find JSON in a code block, skipping the language identifier
    if let Some(start) = trimmed.find("```") {
        let after_backticks = &trimmed[start + 3..];
        let json_start = after_backticks.find('\n').map(|i| i + 1).unwrap_or(0);
        if let Some(end) = after_backticks[json_start..].find("```") {
            let extracted = after_backticks[json_start..json_start + end].trim();
            return extract_balanced_json(extracted);
        }
    }

    // Try to find a JSON object in the text
    if let Some(start) = trimmed.find('{') {
        return extract_balanced_json(&trimmed[start..]);
    }

    trimmed
}

/// Extract a balanced JSON object from a string that starts with '{'.
///
/// Handles trailing characters after the object, e.g. `{"a": 1}}` -> `{"a": 1}`.
fn extract_balanced_json(s: &str) -> &str {
    if !s.starts_with('{') {
        return s;
    }

    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return &s[..=i];
                }
            }
            _ => {}
        }
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_sentinel() {
        let reply = r#"{"function_call": {"name": "analyze_skin", "arguments": {"reason": "lesion"}}}"#;
        let call = FunctionCall::parse(reply).unwrap();
        assert_eq!(call.name, "analyze_skin");
        assert_eq!(call.get_string("reason"), Some("lesion"));
        assert_eq!(call.analysis_kind(), Some(AnalysisKind::Skin));
    }

    #[test]
    fn test_parse_fenced_sentinel() {
        let reply = "```json\n{\"function_call\": {\"name\": \"analyze_eye\"}}\n```";
        let call = FunctionCall::parse(reply).unwrap();
        assert_eq!(call.analysis_kind(), Some(AnalysisKind::Ocular));
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_parse_sentinel_with_trailing_text() {
        let reply = r#"{"function_call": {"name": "analyze_posture"}}} done"#;
        let call = FunctionCall::parse(reply).unwrap();
        assert_eq!(call.analysis_kind(), Some(AnalysisKind::Dysplasia));
    }

    #[test]
    fn test_prose_is_not_a_sentinel() {
        assert!(FunctionCall::parse("Your dog looks healthy.").is_none());
        assert!(FunctionCall::parse("Use {braces} freely").is_none());
        assert!(FunctionCall::parse("the function_call keyword in prose").is_none());
    }

    #[test]
    fn test_unknown_function_has_no_kind() {
        let reply = r#"{"function_call": {"name": "book_appointment"}}"#;
        let call = FunctionCall::parse(reply).unwrap();
        assert_eq!(call.analysis_kind(), None);
    }

    #[test]
    fn test_extract_balanced_json_with_strings() {
        let input = r#"{"message": "Hello { world }", "nested": {"key": "value"}}"#;
        assert_eq!(extract_balanced_json(input), input);
    }

    #[test]
    fn test_extract_balanced_json_with_escaped_quotes() {
        let input = r#"{"message": "He said \"hi\"", "done": true} tail"#;
        assert_eq!(
            extract_balanced_json(input),
            r#"{"message": "He said \"hi\"", "done": true}"#
        );
    }
}
