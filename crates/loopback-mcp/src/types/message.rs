//! JSON-RPC 2.0 envelope — the single wire shape shared by requests,
//! notifications, and responses.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 protocol version.
pub const JSONRPC_VERSION: &str = "2.0";

/// Unique request identifier — string or integer on the way in; `Null` is
/// only ever written, for errors that cannot name their request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
    Null,
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Null => write!(f, "null"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

/// Error object within a JSON-RPC error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// One protocol message unit.
///
/// `params` and `result` keep an explicit JSON `null` as `Some(Value::Null)`;
/// only an absent field is `None`. An `"id": null` reads as no identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub params: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// The interpretation of an envelope's populated fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Request,
    Notification,
    Response,
    Malformed,
}

impl Envelope {
    fn empty() -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: None,
            params: None,
            result: None,
            error: None,
        }
    }

    pub fn request(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id: Some(id),
            method: Some(method.into()),
            params,
            ..Self::empty()
        }
    }

    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: Some(method.into()),
            params,
            ..Self::empty()
        }
    }

    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id: Some(id),
            result: Some(result),
            ..Self::empty()
        }
    }

    pub fn failure(id: RequestId, error: JsonRpcErrorObject) -> Self {
        Self {
            id: Some(id),
            error: Some(error),
            ..Self::empty()
        }
    }

    pub fn kind(&self) -> EnvelopeKind {
        match (&self.id, &self.method, &self.result, &self.error) {
            (Some(_), Some(_), None, None) => EnvelopeKind::Request,
            (None, Some(_), None, None) => EnvelopeKind::Notification,
            (Some(_), None, Some(_), None) | (Some(_), None, None, Some(_)) => {
                EnvelopeKind::Response
            }
            _ => EnvelopeKind::Malformed,
        }
    }

    pub fn is_request(&self) -> bool {
        self.kind() == EnvelopeKind::Request
    }

    pub fn is_notification(&self) -> bool {
        self.kind() == EnvelopeKind::Notification
    }

    pub fn is_response(&self) -> bool {
        self.kind() == EnvelopeKind::Response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kinds() {
        assert!(Envelope::request(1.into(), "tools/list", None).is_request());
        assert!(Envelope::notification("notifications/initialized", None).is_notification());
        assert!(Envelope::success(1.into(), json!({})).is_response());
        let err = JsonRpcErrorObject {
            code: -32601,
            message: "nope".to_string(),
            data: None,
        };
        assert!(Envelope::failure("a".into(), err).is_response());
    }

    #[test]
    fn test_result_and_error_together_is_malformed() {
        let mut env = Envelope::success(1.into(), json!(1));
        env.error = Some(JsonRpcErrorObject {
            code: -32603,
            message: "x".to_string(),
            data: None,
        });
        assert_eq!(env.kind(), EnvelopeKind::Malformed);
    }

    #[test]
    fn test_null_result_is_present() {
        let env: Envelope =
            serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 7, "result": null })).unwrap();
        assert_eq!(env.result, Some(Value::Null));
        assert!(env.is_response());
    }

    #[test]
    fn test_null_id_reads_as_absent() {
        let env: Envelope = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": { "code": -32700, "message": "Parse error" }
        }))
        .unwrap();
        assert!(env.id.is_none());
        assert_eq!(env.kind(), EnvelopeKind::Malformed);
    }

    #[test]
    fn test_notification_omits_absent_fields() {
        let value = serde_json::to_value(Envelope::notification("ping", None)).unwrap();
        assert_eq!(value, json!({ "jsonrpc": "2.0", "method": "ping" }));
    }
}
