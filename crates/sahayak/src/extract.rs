//! Domain payload extraction
//!
//! Locates a flow's structured payload inside the last parsed SSE event.
//! Checked in order, first match wins:
//! 1. `content.parts[0].text` containing the envelope key, parsed as JSON
//!    and unwrapped from that key
//! 2. `content.parts[0].functionResponse.response` carrying one of the
//!    recognised keys
//! 3. the whole event, as [`Extracted::Raw`]

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extraction result, serialized as `{"type": ..., "data": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Extracted {
    Structured(Value),
    Raw(Value),
}

impl Extracted {
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    pub fn data(&self) -> &Value {
        match self {
            Self::Structured(data) | Self::Raw(data) => data,
        }
    }

    pub fn into_data(self) -> Value {
        match self {
            Self::Structured(data) | Self::Raw(data) => data,
        }
    }
}

/// Where a flow's payload may appear in an agent event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionProfile {
    /// Key wrapping the payload in JSON-in-text answers. Also the marker
    /// substring that makes the text worth parsing.
    pub envelope_key: &'static str,
    /// Any of these keys makes a function response count as the payload
    pub function_response_keys: &'static [&'static str],
}

/// Extract the payload described by `profile`. Never fails.
pub fn extract(result: Option<&Value>, profile: &ExtractionProfile) -> Extracted {
    let Some(result) = result else {
        return Extracted::Raw(Value::Null);
    };

    let first_part = result.pointer("/content/parts/0");

    let text = first_part
        .and_then(|part| part.get("text"))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty());
    if let Some(text) = text {
        if text.contains(profile.envelope_key) {
            match serde_json::from_str::<Value>(text) {
                Ok(mut parsed) => {
                    if let Some(inner) = parsed.get_mut(profile.envelope_key) {
                        if is_truthy(inner) {
                            return Extracted::Structured(inner.take());
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "response text mentions {} but is not JSON", profile.envelope_key);
                    return Extracted::Raw(result.clone());
                }
            }
        }
    }

    if let Some(response) = first_part.and_then(|part| part.pointer("/functionResponse/response")) {
        let recognised = profile
            .function_response_keys
            .iter()
            .any(|key| response.get(key).is_some_and(is_truthy));
        if recognised {
            return Extracted::Structured(response.clone());
        }
    }

    Extracted::Raw(result.clone())
}

/// Truthiness as the backend's JSON producers use it: empty strings, zero,
/// `false` and `null` do not count as present.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PROFILE: ExtractionProfile = ExtractionProfile {
        envelope_key: "quiz_generator_agent_response",
        function_response_keys: &["questions"],
    };

    fn text_event(text: &str) -> Value {
        json!({"content": {"role": "model", "parts": [{"text": text}]}})
    }

    #[test]
    fn test_extract_envelope_from_text() {
        let text = json!({
            "quiz_generator_agent_response": {"title": "Fractions", "questions": []}
        })
        .to_string();

        let extracted = extract(Some(&text_event(&text)), &PROFILE);

        assert_eq!(
            extracted,
            Extracted::Structured(json!({"title": "Fractions", "questions": []}))
        );
    }

    #[test]
    fn test_extract_marker_text_not_json_is_raw() {
        let event = text_event("Here is your quiz_generator_agent_response: {");

        let extracted = extract(Some(&event), &PROFILE);

        assert_eq!(extracted, Extracted::Raw(event));
    }

    #[test]
    fn test_extract_marker_without_envelope_falls_through() {
        let event = json!({
            "content": {"parts": [{
                "text": "{\"note\": \"quiz_generator_agent_response pending\"}",
                "functionResponse": {"response": {"questions": [{"id": 1}]}}
            }]}
        });

        let extracted = extract(Some(&event), &PROFILE);

        assert_eq!(extracted, Extracted::Structured(json!({"questions": [{"id": 1}]})));
    }

    #[test]
    fn test_extract_function_response() {
        let event = json!({
            "content": {"parts": [{
                "functionResponse": {"name": "quiz_generator_agent", "response": {"questions": [1, 2]}}
            }]}
        });

        let extracted = extract(Some(&event), &PROFILE);

        assert!(extracted.is_structured());
        assert_eq!(extracted.data(), &json!({"questions": [1, 2]}));
    }

    #[test]
    fn test_extract_function_response_without_keys_is_raw() {
        let event = json!({
            "content": {"parts": [{"functionResponse": {"response": {"status": "thinking"}}}]}
        });

        assert_eq!(extract(Some(&event), &PROFILE), Extracted::Raw(event));
    }

    #[test]
    fn test_extract_plain_text_is_raw() {
        let event = text_event("Sure, which grade is this for?");
        assert_eq!(extract(Some(&event), &PROFILE), Extracted::Raw(event));
    }

    #[test]
    fn test_extract_nothing_parsed() {
        assert_eq!(extract(None, &PROFILE), Extracted::Raw(Value::Null));
    }

    #[test]
    fn test_extracted_serialization() {
        let value = serde_json::to_value(Extracted::Raw(json!({"a": 1}))).unwrap();
        assert_eq!(value, json!({"type": "raw", "data": {"a": 1}}));
    }

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!("x")));
    }
}
