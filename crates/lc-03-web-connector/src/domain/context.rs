//! Engine call context and response.

use serde_json::Value;

/// Everything an engine needs to know about one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineContext {
    /// Business network the call runs against.
    pub network: String,
    /// Calling participant. `None` for the admin identity.
    pub participant: Option<String>,
    pub transaction_id: String,
    /// Read-only call: state changes are rejected.
    pub is_static: bool,
}

impl EngineContext {
    pub fn new(network: impl Into<String>, user: &str) -> Self {
        Self {
            network: network.into(),
            participant: (user != ADMIN_IDENTITY).then(|| user.to_string()),
            transaction_id: uuid::Uuid::new_v4().to_string(),
            is_static: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// Identity that always passes login and is not bound to a participant.
pub const ADMIN_IDENTITY: &str = "admin";

/// Result of one engine call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineResponse {
    /// JSON result, `None` when the function returns nothing.
    pub payload: Option<Value>,
    /// Events emitted during the call, in order.
    pub events: Vec<Value>,
}

impl EngineResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: Value) -> Self {
        Self {
            payload: Some(payload),
            events: Vec::new(),
        }
    }
}
