use crate::models::question::QuestionItem;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

fn default_level() -> String {
    "Medium".to_string()
}

fn default_num_questions() -> i64 {
    10
}

/// Accepts the question count as a JSON number or a numeric string, so a
/// frontend sending `"5"` is treated the same as one sending `5`.
fn coerce_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an integer or a numeric string")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
            i64::try_from(value).map_err(E::custom)
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<i64, E> {
            Ok(value as i64)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<i64, E> {
            value.trim().parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(CountVisitor)
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Body of the structured-JSON endpoint.
#[derive(Debug, Deserialize, Validate)]
pub struct GeneratePaperPayload {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub organization: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub subject: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub subtopic: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_num_questions", deserialize_with = "coerce_count")]
    #[validate(range(min = 1))]
    pub num_questions: i64,
}

#[derive(Debug, Serialize)]
pub struct PaperResponse {
    pub organization: String,
    pub subject: String,
    pub subtopic: String,
    pub level: String,
    pub total_questions: usize,
    pub questions: Vec<QuestionItem>,
}

/// Body of the PDF endpoint. Presence of every field is checked in the
/// handler so a missing one turns into a 400 rather than a serde rejection.
#[derive(Debug, Deserialize)]
pub struct GeneratePdfPayload {
    pub subject: Option<String>,
    pub level: Option<String>,
    pub num_questions: Option<i64>,
    pub organization: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_fail_validation() {
        let payload: GeneratePaperPayload =
            serde_json::from_str(r#"{"organization":"  ","subject":"Python","subtopic":"Lists"}"#)
                .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn level_and_count_have_defaults() {
        let payload: GeneratePaperPayload = serde_json::from_str(
            r#"{"organization":"Acme","subject":"Python","subtopic":"Lists"}"#,
        )
        .unwrap();
        assert_eq!(payload.level, "Medium");
        assert_eq!(payload.num_questions, 10);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn numeric_string_count_is_coerced() {
        let payload: GeneratePaperPayload = serde_json::from_str(
            r#"{"organization":"Acme","subject":"Python","subtopic":"Lists","num_questions":"5"}"#,
        )
        .unwrap();
        assert_eq!(payload.num_questions, 5);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn non_numeric_string_count_is_rejected() {
        let result = serde_json::from_str::<GeneratePaperPayload>(
            r#"{"organization":"Acme","subject":"Python","subtopic":"Lists","num_questions":"lots"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn non_positive_count_fails_validation() {
        let payload: GeneratePaperPayload = serde_json::from_str(
            r#"{"organization":"Acme","subject":"Python","subtopic":"Lists","num_questions":0}"#,
        )
        .unwrap();
        assert!(payload.validate().is_err());
    }
}
