//! In-process connector configuration.

use serde::{Deserialize, Serialize};

/// Runtime engine backing in-process connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Built-in key/value ledger.
    #[default]
    Ledger,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub engine: EngineKind,
}
