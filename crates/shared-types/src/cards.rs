//! # Business Network Cards
//!
//! A card bundles who you are (credentials) with where you connect
//! (connection profile). Card stores key cards by name.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessNetworkCard {
    /// Card metadata such as `userName`, `businessNetwork` and `roles`.
    pub metadata: Value,
    pub connection_profile: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Value>,
}

impl BusinessNetworkCard {
    pub fn new(metadata: Value, connection_profile: Value) -> Self {
        Self {
            metadata,
            connection_profile,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Value) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn user_name(&self) -> Option<&str> {
        self.metadata.get("userName").and_then(Value::as_str)
    }
}

/// Every card in a store, by card name.
pub type CardMap = BTreeMap<String, BusinessNetworkCard>;
