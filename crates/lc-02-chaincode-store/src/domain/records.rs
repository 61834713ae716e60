//! Persisted network and chaincode records.

use serde::{Deserialize, Serialize};
use shared_types::{chaincode_id, ConnectorResult, NetworkDefinition};
use std::collections::BTreeMap;

/// One installed version of a business network. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaincodeRecord {
    /// `name@version`
    pub id: String,
    pub name: String,
    pub version: String,
    /// Hex-encoded network archive.
    pub network_archive: String,
}

impl ChaincodeRecord {
    pub fn from_definition(definition: &NetworkDefinition) -> ConnectorResult<Self> {
        Ok(Self {
            id: definition.chaincode_id(),
            name: definition.name.clone(),
            version: definition.version.clone(),
            network_archive: definition.to_archive_hex()?,
        })
    }

    pub fn definition(&self) -> ConnectorResult<NetworkDefinition> {
        NetworkDefinition::from_archive_hex(&self.network_archive)
    }
}

/// Lifecycle state of one business network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRecord {
    pub name: String,
    pub active_version: Option<String>,
    #[serde(default)]
    pub installed_chaincodes: BTreeMap<String, ChaincodeRecord>,
}

impl NetworkRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active_version: None,
            installed_chaincodes: BTreeMap::new(),
        }
    }

    pub fn is_installed(&self, version: &str) -> bool {
        self.installed_chaincodes.contains_key(version)
    }

    /// Id of the active chaincode, if any.
    pub fn active_id(&self) -> Option<String> {
        self.active_version
            .as_deref()
            .map(|version| chaincode_id(&self.name, version))
    }

    pub fn active_chaincode(&self) -> Option<&ChaincodeRecord> {
        self.active_version
            .as_deref()
            .and_then(|version| self.installed_chaincodes.get(version))
    }
}
