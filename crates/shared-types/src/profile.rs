//! # Connection Profiles
//!
//! A connection profile names a connector type and carries whatever settings
//! that connector needs. It is immutable for the life of a connection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default connector server URL used by the proxy.
pub const DEFAULT_CONNECTOR_SERVER_URL: &str = "http://localhost:15699";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub connector_type: String,
    /// Connector specific settings, kept verbatim.
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl ConnectionProfile {
    pub fn new(name: impl Into<String>, connector_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connector_type: connector_type.into(),
            settings: Map::new(),
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// Parse a profile out of the options object sent with a connect call.
    pub fn from_options(name: &str, options: &Value) -> Option<Self> {
        let object = options.as_object()?;
        let connector_type = object.get("type")?.as_str()?.to_string();
        let settings = object
            .iter()
            .filter(|(key, _)| key.as_str() != "type" && key.as_str() != "name")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Some(Self {
            name: name.to_string(),
            connector_type,
            settings,
        })
    }

    /// The profile as the options object sent on the wire.
    pub fn to_options(&self) -> Value {
        let mut object = self.settings.clone();
        object.insert("name".to_string(), Value::String(self.name.clone()));
        object.insert(
            "type".to_string(),
            Value::String(self.connector_type.clone()),
        );
        Value::Object(object)
    }

    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(Value::as_str)
    }
}

/// Overlay `given` options on a stored profile. Keys in `given` win; a
/// non-object on either side yields `given` unchanged.
pub fn merge_options(stored: &Value, given: &Value) -> Value {
    match (stored, given) {
        (Value::Object(stored), Value::Object(given)) => {
            let mut merged = stored.clone();
            merged.extend(given.iter().map(|(key, value)| (key.clone(), value.clone())));
            Value::Object(merged)
        }
        _ => given.clone(),
    }
}
