use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::NetworkError;

/// Parsed `/predict` response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct Prediction {
    /// Attribute tags detected on the uploaded item
    pub(crate) tags: Map<String, Value>,
    /// Paths of similar items, relative to `/static/`
    pub(crate) matches: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) debug: Option<Value>,
}

impl Prediction {
    /// Lenient extraction: a missing or mistyped `tags` is empty, non-string matches are dropped.
    fn from_value(value: Value) -> Self {
        let Value::Object(mut obj) = value else {
            return Self::default();
        };

        let tags = match obj.remove("tags") {
            Some(Value::Object(tags)) => tags,
            _ => Map::new(),
        };
        let matches = match obj.remove("matches") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        let debug = obj.remove("debug").filter(|v| !v.is_null());

        Self {
            tags,
            matches,
            debug,
        }
    }

    /// Tag names whose value is `true`, in response order
    pub(crate) fn positive_tags(&self) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|(_, v)| v.as_bool() == Some(true))
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Interpret a `/predict` reply from its status code and raw body.
pub(crate) fn parse_predict_response(status: u16, body: &str) -> Result<Prediction, NetworkError> {
    let value: Value = serde_json::from_str(body).map_err(|_| NetworkError::NonJson {
        body: body.to_string(),
    })?;

    if !(200..300).contains(&status) {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("Predict failed");
        return Err(NetworkError::Service(message.to_string()));
    }

    Ok(Prediction::from_value(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_response() {
        let body = json!({
            "tags": {"denim": true, "shirt": true, "red": false},
            "matches": ["denim_shirt.png", "jacket.webp"],
            "debug": {"saved_path": "/tmp/x.png"}
        })
        .to_string();

        let p = parse_predict_response(200, &body).unwrap();
        assert_eq!(p.matches, vec!["denim_shirt.png", "jacket.webp"]);
        assert_eq!(p.tags.len(), 3);
        assert_eq!(p.debug, Some(json!({"saved_path": "/tmp/x.png"})));
    }

    #[test]
    fn positive_tags_keep_only_true() {
        let p = parse_predict_response(200, r#"{"tags":{"a":true,"b":false,"c":"yes"}}"#).unwrap();
        assert_eq!(p.positive_tags(), vec!["a"]);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let p = parse_predict_response(200, "{}").unwrap();
        assert!(p.tags.is_empty());
        assert!(p.matches.is_empty());
        assert!(p.debug.is_none());
    }

    #[test]
    fn non_array_matches_are_ignored() {
        let p = parse_predict_response(200, r#"{"matches":"a.png","tags":[]}"#).unwrap();
        assert!(p.matches.is_empty());
        assert!(p.tags.is_empty());

        let p = parse_predict_response(200, r#"{"matches":["a.png", 3, null]}"#).unwrap();
        assert_eq!(p.matches, vec!["a.png"]);
    }

    #[test]
    fn error_status_uses_server_message() {
        let err = parse_predict_response(500, r#"{"error":"model not loaded"}"#).unwrap_err();
        assert_eq!(err.to_string(), "model not loaded");
    }

    #[test]
    fn error_status_without_message() {
        let err = parse_predict_response(422, r#"{"detail":[]}"#).unwrap_err();
        assert_eq!(err.to_string(), "Predict failed");
    }

    #[test]
    fn non_json_body_is_reported_verbatim() {
        let err = parse_predict_response(502, "Bad Gateway").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Server returned non-JSON response: Bad Gateway"
        );
        assert!(parse_predict_response(200, "").is_err());
    }
}
