use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::Deserialize;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every failure the client can surface, normalized for display.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("backend error ({status}): {message}")]
    Backend {
        status: u16,
        message: String,
        fields: BTreeMap<String, String>,
    },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("payment redirect failed: {0}")]
    Payment(String),
}

impl ApiError {
    /// Text shown to the user in a toast or an error placeholder.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Could not reach the server. Check your connection and try again.".to_string(),
            ApiError::Backend { message, fields, .. } => {
                if fields.is_empty() {
                    message.clone()
                } else {
                    let details: Vec<&str> = fields.values().map(String::as_str).collect();
                    format!("{}: {}", message, details.join(", "))
                }
            }
            ApiError::Unauthorized(_) => "Please log in to continue.".to_string(),
            ApiError::Decode(_) => "Received an unexpected response from the server.".to_string(),
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Storage(_) => "Could not save your data locally.".to_string(),
            ApiError::Payment(_) => "Could not start the payment. Please try again.".to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<crate::services::RedirectError> for ApiError {
    fn from(err: crate::services::RedirectError) -> Self {
        ApiError::Payment(err.to_string())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

/// Turns a backend reply into an error when the HTTP status or the
/// `status:"error"` envelope says so. Returns `None` for a successful reply.
pub fn normalize_response(status: StatusCode, body: &str) -> Option<ApiError> {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let reported_error = envelope
        .as_ref()
        .and_then(|e| e.status.as_deref())
        .map(|s| s.eq_ignore_ascii_case("error") || s.eq_ignore_ascii_case("fail"))
        .unwrap_or(false);

    if status.is_success() && !reported_error {
        return None;
    }

    let message = envelope
        .as_ref()
        .and_then(|e| e.message.clone().or_else(|| e.error.clone()))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| default_message(status));

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Some(ApiError::Unauthorized(message));
    }

    let fields = envelope
        .and_then(|e| e.errors)
        .map(field_errors)
        .unwrap_or_default();

    Some(ApiError::Backend {
        status: status.as_u16(),
        message,
        fields,
    })
}

fn default_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) if !status.is_success() => format!("Request failed: {}", reason),
        _ => "Request failed".to_string(),
    }
}

// `errors` comes either as `{field: message}` or as `[{path|field, msg|message}]`.
fn field_errors(value: serde_json::Value) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                if let Some(text) = text_of(&v) {
                    out.insert(k, text);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for (idx, item) in items.into_iter().enumerate() {
                let field = item
                    .get("path")
                    .or_else(|| item.get("field"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| idx.to_string());
                let text = item
                    .get("msg")
                    .or_else(|| item.get("message"))
                    .and_then(text_of)
                    .or_else(|| text_of(&item));
                if let Some(text) = text {
                    out.insert(field, text);
                }
            }
        }
        _ => {}
    }
    out
}

fn text_of(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(parts) => parts.first().and_then(text_of),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_without_error_envelope_is_not_an_error() {
        let body = r#"{"status":"success","message":"Added to cart"}"#;
        assert!(normalize_response(StatusCode::OK, body).is_none());
        assert!(normalize_response(StatusCode::OK, "not json").is_none());
    }

    #[test]
    fn error_envelope_with_ok_status_is_backend_error() {
        let body = r#"{"status":"error","message":"Meal is out of stock"}"#;
        let err = normalize_response(StatusCode::OK, body).unwrap();
        assert_eq!(err.user_message(), "Meal is out of stock");
        assert!(matches!(err, ApiError::Backend { status: 200, .. }));
    }

    #[test]
    fn field_errors_are_collected_from_array() {
        let body = r#"{"status":"error","message":"Invalid address","errors":[{"path":"pincode","msg":"Pincode is required"}]}"#;
        let err = normalize_response(StatusCode::BAD_REQUEST, body).unwrap();
        match &err {
            ApiError::Backend { fields, .. } => {
                assert_eq!(fields.get("pincode").map(String::as_str), Some("Pincode is required"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.user_message(), "Invalid address: Pincode is required");
    }

    #[test]
    fn field_errors_are_collected_from_object() {
        let body = r#"{"status":"error","message":"Invalid","errors":{"email":"Email taken"}}"#;
        let err = normalize_response(StatusCode::CONFLICT, body).unwrap();
        assert_eq!(err.user_message(), "Invalid: Email taken");
    }

    #[test]
    fn unauthorized_status_maps_to_unauthorized() {
        let err = normalize_response(StatusCode::UNAUTHORIZED, r#"{"message":"Token expired"}"#).unwrap();
        assert_eq!(err, ApiError::Unauthorized("Token expired".to_string()));
        assert!(err.is_unauthorized());
    }

    #[test]
    fn missing_message_falls_back_to_reason() {
        let err = normalize_response(StatusCode::INTERNAL_SERVER_ERROR, "").unwrap();
        assert_eq!(err.user_message(), "Request failed: Internal Server Error");
    }
}
