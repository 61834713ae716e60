//! # Business Network Definitions
//!
//! A business network definition is the deployable unit handed to
//! `install`. It travels as a binary archive: a four byte magic followed by
//! the `bincode` encoding of the definition. Records and wire frames carry the
//! archive hex-encoded.

use crate::errors::{ConnectorError, ConnectorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ARCHIVE_MAGIC: &[u8; 4] = b"LCNA";

/// Chaincode identifier for a network version: `name@version`.
pub fn chaincode_id(name: &str, version: &str) -> String {
    format!("{name}@{version}")
}

/// A named, versioned business network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDefinition {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Model, script and ACL files keyed by path.
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

impl NetworkDefinition {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: String::new(),
            files: BTreeMap::new(),
        }
    }

    /// Builder-style description setter.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder-style file setter.
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    /// `name@version` of this definition.
    pub fn chaincode_id(&self) -> String {
        chaincode_id(&self.name, &self.version)
    }

    /// Encode into the binary archive format.
    pub fn to_archive(&self) -> ConnectorResult<Vec<u8>> {
        let body = bincode::serialize(self).map_err(|e| ConnectorError::Archive(e.to_string()))?;
        let mut archive = Vec::with_capacity(ARCHIVE_MAGIC.len() + body.len());
        archive.extend_from_slice(ARCHIVE_MAGIC);
        archive.extend_from_slice(&body);
        Ok(archive)
    }

    /// Decode a binary archive.
    pub fn from_archive(bytes: &[u8]) -> ConnectorResult<Self> {
        let body = bytes
            .strip_prefix(ARCHIVE_MAGIC.as_slice())
            .ok_or_else(|| ConnectorError::Archive("missing archive header".to_string()))?;
        let definition: Self =
            bincode::deserialize(body).map_err(|e| ConnectorError::Archive(e.to_string()))?;
        if definition.name.is_empty() || definition.version.is_empty() {
            return Err(ConnectorError::Archive(
                "network name and version are required".to_string(),
            ));
        }
        Ok(definition)
    }

    /// Archive as lowercase hex.
    pub fn to_archive_hex(&self) -> ConnectorResult<String> {
        Ok(hex::encode(self.to_archive()?))
    }

    pub fn from_archive_hex(encoded: &str) -> ConnectorResult<Self> {
        let bytes = hex::decode(encoded).map_err(|e| ConnectorError::Archive(e.to_string()))?;
        Self::from_archive(&bytes)
    }
}
