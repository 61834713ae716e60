//! # Frames
//!
//! Wire unit of the transport. Encoded as one JSON text message.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{TransportError, WireError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    /// A call expecting exactly one reply with the same id.
    Request {
        id: u64,
        event: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    Reply {
        id: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<WireError>,
        #[serde(default)]
        result: Value,
    },
    /// Unsolicited server message.
    Push {
        event: String,
        #[serde(default)]
        args: Vec<Value>,
    },
}

impl Frame {
    pub fn to_text(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::MalformedFrame(e.to_string()))
    }

    pub fn from_text(text: &str) -> Result<Self, TransportError> {
        serde_json::from_str(text).map_err(|e| TransportError::MalformedFrame(e.to_string()))
    }

    /// Successful reply to call `id`.
    pub fn ok(id: u64, result: Value) -> Self {
        Frame::Reply {
            id,
            error: None,
            result,
        }
    }

    /// Failed reply to call `id`.
    pub fn err(id: u64, error: WireError) -> Self {
        Frame::Reply {
            id,
            error: Some(error),
            result: Value::Null,
        }
    }
}

/// Reply as handed back to the caller of `emit`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub error: Option<WireError>,
    pub result: Value,
}

impl Reply {
    /// Split into the payload or the wire error.
    pub fn into_result(self) -> Result<Value, WireError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

/// Encode a chaincode response payload for a reply.
///
/// Payloads are UTF-8 JSON text; absent payloads travel as `null`. Invalid
/// UTF-8 is replaced with U+FFFD.
pub fn payload_to_wire(payload: Option<&[u8]>) -> Value {
    match payload {
        Some(bytes) if !bytes.is_empty() => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        _ => Value::Null,
    }
}

/// Decode a chaincode response payload. `null` and `""` are no payload.
pub fn payload_from_wire(value: Value) -> Option<Vec<u8>> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.into_bytes()),
        other => Some(other.to_string().into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::ErrorKind;

    #[test]
    fn test_payload_wire_encoding() {
        assert_eq!(payload_to_wire(None), Value::Null);
        assert_eq!(payload_to_wire(Some(&b""[..])), Value::Null);
        assert_eq!(payload_to_wire(Some(&b"{\"a\":1}"[..])), json!("{\"a\":1}"));

        assert_eq!(payload_from_wire(Value::Null), None);
        assert_eq!(payload_from_wire(json!("")), None);
        assert_eq!(payload_from_wire(json!("[1]")), Some(b"[1]".to_vec()));
        assert_eq!(payload_from_wire(json!({ "a": 1 })), Some(b"{\"a\":1}".to_vec()));
    }

    #[test]
    fn test_binary_payload_is_replaced_lossily() {
        let wire = payload_to_wire(Some(&[0x61, 0xff, 0x62][..]));
        assert_eq!(wire, json!("a\u{fffd}b"));
        assert_eq!(payload_from_wire(wire), Some("a\u{fffd}b".as_bytes().to_vec()));
    }

    #[test]
    fn test_request_layout() {
        let frame = Frame::Request {
            id: 7,
            event: "/api/connectionPing".into(),
            args: vec![json!("conn-1"), json!("ctx-1")],
        };
        let value: Value = serde_json::from_str(&frame.to_text().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "request",
                "id": 7,
                "event": "/api/connectionPing",
                "args": ["conn-1", "ctx-1"]
            })
        );
    }

    #[test]
    fn test_successful_reply_omits_error() {
        let text = Frame::ok(3, json!({ "version": "0.1.0" })).to_text().unwrap();
        assert!(!text.contains("error"));
    }

    #[test]
    fn test_reply_error_parses() {
        let frame = Frame::from_text(
            r#"{"type":"reply","id":1,"error":{"name":"TypeError","message":"bad","stack":"TypeError: bad"}}"#,
        )
        .unwrap();
        let Frame::Reply { id, error, result } = frame else {
            panic!("expected reply");
        };
        assert_eq!(id, 1);
        assert_eq!(result, Value::Null);
        assert_eq!(error, Some(WireError::new(ErrorKind::TypeError, "bad")));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            Frame::from_text("{\"type\":\"shout\"}"),
            Err(TransportError::MalformedFrame(_))
        ));
    }
}
