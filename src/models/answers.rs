// src/models/answers.rs

use std::collections::BTreeMap;

use serde_json::Value;

/// Chosen option text per question id.
///
/// Ordered so the serialized form stored in the responses sheet is stable.
pub type Answers = BTreeMap<String, String>;

/// Converts an arbitrary JSON value into answers.
///
/// Anything other than an object yields no answers. Non-string values are
/// kept in their JSON text form and `null` becomes an empty choice.
pub fn answers_from_value(value: Value) -> Answers {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(qid, choice)| {
                let text = match choice {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (qid, text)
            })
            .collect(),
        _ => Answers::new(),
    }
}

/// Parses the `answers_json` form field. Malformed input yields no answers.
pub fn parse_answers_json(raw: &str) -> Answers {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => answers_from_value(value),
        Err(e) => {
            tracing::warn!("Discarding malformed answers payload: {}", e);
            Answers::new()
        }
    }
}

/// JSON text written to the responses sheet.
pub fn serialize_answers(answers: &Answers) -> String {
    serde_json::to_string(answers).unwrap_or_else(|_| "{}".to_string())
}
