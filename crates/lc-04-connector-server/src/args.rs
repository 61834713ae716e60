//! Positional argument extraction for request frames.

use serde_json::Value;
use shared_types::{ApiEvent, ConnectorError, ConnectorResult};

pub(crate) struct Args<'a> {
    event: ApiEvent,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub(crate) fn new(event: ApiEvent, values: &'a [Value]) -> Self {
        Self { event, values }
    }

    pub(crate) fn event(&self) -> ApiEvent {
        self.event
    }

    fn invalid(&self, index: usize, name: &str, expected: &str) -> ConnectorError {
        ConnectorError::InvalidArgument(format!(
            "{}: argument {index} ({name}) must be {expected}",
            self.event
        ))
    }

    pub(crate) fn str(&self, index: usize, name: &str) -> ConnectorResult<&'a str> {
        self.values
            .get(index)
            .and_then(Value::as_str)
            .ok_or_else(|| self.invalid(index, name, "a string"))
    }

    /// `null` and missing arguments read as `None`.
    pub(crate) fn opt_str(&self, index: usize, name: &str) -> ConnectorResult<Option<&'a str>> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.as_str())),
            Some(_) => Err(self.invalid(index, name, "a string or null")),
        }
    }

    /// Missing arguments read as `null`.
    pub(crate) fn value(&self, index: usize) -> Value {
        self.values.get(index).cloned().unwrap_or(Value::Null)
    }

    /// Array argument. Non-string elements are passed on as JSON text.
    pub(crate) fn strings(&self, index: usize, name: &str) -> ConnectorResult<Vec<String>> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect()),
            Some(_) => Err(self.invalid(index, name, "an array")),
        }
    }
}
