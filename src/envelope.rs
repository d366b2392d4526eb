use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "OK";

/// The `{success, message, data?, error?}` shape every route answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T = Value> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: None,
        }
    }
}

/// How an endpoint's successful upstream body becomes the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Upstream already answers `{success, ...}`; relay it untouched.
    Normalized,
    /// Upstream answers a bare payload; wrap it under `data`.
    Raw,
}

impl ResponseShape {
    /// Shape a 2xx upstream payload. `None` means the upstream sent no body.
    pub fn shape(self, payload: Option<Value>) -> Value {
        match (self, payload) {
            (ResponseShape::Normalized, Some(body)) if is_envelope(&body) => body,
            (_, payload) => {
                let envelope = ApiEnvelope::ok(DEFAULT_SUCCESS_MESSAGE, payload);
                serde_json::to_value(envelope).unwrap_or(Value::Null)
            }
        }
    }
}

/// True when `body` is an object carrying a boolean `success` field.
pub fn is_envelope(body: &Value) -> bool {
    body.get("success").is_some_and(Value::is_boolean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_serialization_omits_data() {
        let env: ApiEnvelope = ApiEnvelope::failure("not found");
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"success": false, "message": "not found"})
        );
    }

    #[test]
    fn test_normalized_passthrough_is_untouched() {
        let body = json!({"success": true, "data": {"products": [], "count": 0}, "page": 2});
        assert_eq!(ResponseShape::Normalized.shape(Some(body.clone())), body);
    }

    #[test]
    fn test_raw_payload_is_wrapped_once() {
        let shaped = ResponseShape::Raw.shape(Some(json!({"foo": "bar"})));
        assert_eq!(shaped["success"], json!(true));
        assert_eq!(shaped["data"]["foo"], json!("bar"));
        assert!(shaped.get("foo").is_none());
    }

    #[test]
    fn test_normalized_without_success_falls_back_to_wrapping() {
        let shaped = ResponseShape::Normalized.shape(Some(json!([1, 2, 3])));
        assert_eq!(shaped["success"], json!(true));
        assert_eq!(shaped["data"], json!([1, 2, 3]));
    }

    #[test]
    fn test_empty_body() {
        let shaped = ResponseShape::Raw.shape(None);
        assert_eq!(shaped, json!({"success": true, "message": "OK"}));
    }

    #[test]
    fn test_raw_payload_message_stays_in_data() {
        let shaped = ResponseShape::Raw.shape(Some(json!({"message": "Coupon applied", "discount": 10})));
        assert_eq!(shaped["message"], json!(DEFAULT_SUCCESS_MESSAGE));
        assert_eq!(shaped["data"]["message"], json!("Coupon applied"));
    }
}
