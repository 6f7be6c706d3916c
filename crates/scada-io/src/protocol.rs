//! Response envelope handling.
//!
//! The backend wraps most replies as `{success, message, data}` but a few
//! endpoints answer with the bare payload, and collections come either as a
//! bare array or as a named array (`tags`, `table`, `backups`, ...) at the
//! top level or inside `data`. Everything here normalizes that variance.

use crate::error::ClientError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_FAILURE_MESSAGE: &str = "Unknown error";

/// Successful reply: the optional message plus the unwrapped payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    pub message: Option<String>,
    pub payload: Value,
}

impl Ack {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// Apply the envelope rules to a parsed body.
pub fn unwrap_envelope(endpoint: &str, body: Value) -> Result<Ack, ClientError> {
    let Value::Object(mut map) = body else {
        return Ok(Ack {
            message: None,
            payload: body,
        });
    };

    let Some(success) = map.get("success").and_then(Value::as_bool) else {
        return Ok(Ack {
            message: None,
            payload: Value::Object(map),
        });
    };

    let message = map
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    if !success {
        tracing::debug!(endpoint, "backend reported failure");
        return Err(ClientError::Application {
            message: message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
        });
    }

    let payload = match map.remove("data") {
        Some(data) if !data.is_null() => data,
        _ => Value::Object(map),
    };
    Ok(Ack { message, payload })
}

pub fn parse_body(endpoint: &str, bytes: &[u8]) -> Result<Value, ClientError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| ClientError::Decode {
        endpoint: endpoint.to_string(),
        detail: e.to_string(),
    })
}

pub fn decode<T: DeserializeOwned>(endpoint: &str, payload: Value) -> Result<T, ClientError> {
    serde_json::from_value(payload).map_err(|e| ClientError::Decode {
        endpoint: endpoint.to_string(),
        detail: e.to_string(),
    })
}

/// Pull a list out of a payload: bare array, `{key: [...]}`, or
/// `{data: ...}` holding either. A payload with none of these is an empty list.
pub fn collection<T: DeserializeOwned>(
    endpoint: &str,
    payload: Value,
    key: &str,
) -> Result<Vec<T>, ClientError> {
    match payload {
        Value::Array(_) => decode(endpoint, payload),
        Value::Object(mut map) => {
            if let Some(items) = map.remove(key).filter(|v| !v.is_null()) {
                return collection(endpoint, items, key);
            }
            if let Some(inner) = map.remove("data").filter(|v| !v.is_null()) {
                return collection(endpoint, inner, key);
            }
            Ok(Vec::new())
        }
        Value::Null => Ok(Vec::new()),
        other => Err(ClientError::Decode {
            endpoint: endpoint.to_string(),
            detail: format!("expected a list, got {other}"),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetValueRequest {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignRequest {
    pub tag_name: String,
    pub index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_envelope_carries_message() {
        let err = unwrap_envelope("/tags", json!({"success": false, "message": "Tag exists"}))
            .unwrap_err();
        assert!(matches!(err, ClientError::Application { message } if message == "Tag exists"));
    }

    #[test]
    fn failure_without_message_gets_default() {
        let err = unwrap_envelope("/tags", json!({"success": false})).unwrap_err();
        assert!(matches!(err, ClientError::Application { message } if message == "Unknown error"));
    }

    #[test]
    fn success_without_data_keeps_body() {
        let ack = unwrap_envelope(
            "/backup",
            json!({"success": true, "message": "ok", "filename": "b1.json"}),
        )
        .unwrap();
        assert_eq!(ack.message.as_deref(), Some("ok"));
        assert_eq!(ack.field("filename"), Some("b1.json"));
    }

    #[test]
    fn empty_body_is_null_payload() {
        assert_eq!(parse_body("/x", b"  ").unwrap(), Value::Null);
        assert!(parse_body("/x", b"<html>").is_err());
    }

    #[test]
    fn scalar_collection_is_rejected() {
        let err = collection::<Value>("/tags", json!(42), "tags").unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }
}
