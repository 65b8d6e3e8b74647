use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_ANALYZE_PATH: &str = "/api/analyze";
pub const DEFAULT_FILE_FIELD: &str = "file";
pub const DEFAULT_TITLE_FIELD: &str = "agentName";
pub const REPORT_TITLE_FIELD: &str = "reportTitle";

/// Multipart field names the backend expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFields {
    pub file: String,
    pub title: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            file: DEFAULT_FILE_FIELD.into(),
            title: DEFAULT_TITLE_FIELD.into(),
        }
    }
}

impl FormFields {
    /// The variant that sends the title under `reportTitle`.
    pub fn report_title() -> Self {
        Self {
            file: DEFAULT_FILE_FIELD.into(),
            title: REPORT_TITLE_FIELD.into(),
        }
    }
}

/// Keys probed, in order, for a message in a JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorBodySchema {
    pub message_keys: Vec<String>,
}

impl Default for ErrorBodySchema {
    fn default() -> Self {
        Self {
            message_keys: vec!["error".into(), "message".into()],
        }
    }
}

impl ErrorBodySchema {
    /// Returns the first non-blank string found under a configured key, or `None`
    /// when the body is not a JSON object or carries no usable message.
    pub fn extract_message(&self, body: &[u8]) -> Option<String> {
        let Value::Object(map) = serde_json::from_slice::<Value>(body).ok()? else {
            return None;
        };
        self.message_keys.iter().find_map(|key| match map.get(key) {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_error_key() {
        let schema = ErrorBodySchema::default();
        assert_eq!(
            schema.extract_message(br#"{"error":"bad data"}"#).as_deref(),
            Some("bad data")
        );
    }

    #[test]
    fn falls_back_to_message_key() {
        let schema = ErrorBodySchema::default();
        assert_eq!(
            schema
                .extract_message(br#"{"message":"No CSV file uploaded"}"#)
                .as_deref(),
            Some("No CSV file uploaded")
        );
    }

    #[test]
    fn prefers_keys_in_configured_order() {
        let schema = ErrorBodySchema {
            message_keys: vec!["message".into(), "error".into()],
        };
        assert_eq!(
            schema
                .extract_message(br#"{"error":"first","message":"second"}"#)
                .as_deref(),
            Some("second")
        );
    }

    #[test]
    fn ignores_non_json_and_non_string_messages() {
        let schema = ErrorBodySchema::default();
        assert_eq!(schema.extract_message(b"<html>Internal Server Error</html>"), None);
        assert_eq!(schema.extract_message(br#"{"error":{"code":3}}"#), None);
        assert_eq!(schema.extract_message(br#"{"error":"   "}"#), None);
        assert_eq!(schema.extract_message(br#"["bad data"]"#), None);
        assert_eq!(schema.extract_message(b""), None);
    }

    #[test]
    fn default_fields_match_analyze_backend() {
        let fields = FormFields::default();
        assert_eq!(fields.file, "file");
        assert_eq!(fields.title, "agentName");
        assert_eq!(FormFields::report_title().title, "reportTitle");
    }
}
