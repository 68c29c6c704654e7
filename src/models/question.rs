use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One question as produced by the model. The reply is passed through to the
/// caller, so unknown keys are kept in `extra` instead of being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionItem {
    #[serde(default)]
    pub q_no: i64,
    #[serde(default)]
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_key_is_omitted_when_absent() {
        let item = QuestionItem {
            q_no: 1,
            question: "What is a list?".into(),
            options: None,
            extra: Map::new(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("options").is_none());
    }

    #[test]
    fn unknown_keys_round_trip_through_extra() {
        let raw = r#"{"q_no":2,"question":"x","marks":5}"#;
        let item: QuestionItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.extra.get("marks"), Some(&Value::from(5)));

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json.get("marks"), Some(&Value::from(5)));
    }
}
