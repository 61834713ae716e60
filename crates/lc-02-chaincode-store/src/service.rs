//! # Chaincode Store Service
//!
//! Install, start and upgrade of business network versions on top of a
//! `DataCollection`.
//!
//! Every operation is a read-modify-write of one network record, so the
//! store serializes them behind a single async lock.

use crate::adapters::memory::InMemoryCollection;
use crate::domain::records::{ChaincodeRecord, NetworkRecord};
use crate::ports::outbound::DynDataCollection;
use crate::CHAINCODES_COLLECTION;
use shared_types::{
    chaincode_id, CollectionError, ConnectorResult, LifecycleError, NetworkDefinition,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct ChaincodeStore {
    collection: DynDataCollection,
    lock: Mutex<()>,
}

impl ChaincodeStore {
    pub fn new(collection: DynDataCollection) -> Self {
        Self {
            collection,
            lock: Mutex::new(()),
        }
    }

    /// Store backed by a fresh in-memory collection.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCollection::new(CHAINCODES_COLLECTION)))
    }

    /// Record a new version of a network.
    pub async fn install(&self, definition: &NetworkDefinition) -> ConnectorResult<()> {
        let _guard = self.lock.lock().await;
        let id = definition.chaincode_id();
        let chaincode = ChaincodeRecord::from_definition(definition)?;

        match self.load(&definition.name).await? {
            Some(mut record) => {
                if record.is_installed(&definition.version) {
                    return Err(LifecycleError::AlreadyInstalled(id).into());
                }
                record
                    .installed_chaincodes
                    .insert(definition.version.clone(), chaincode);
                self.save(&record, false).await?;
            }
            None => {
                let mut record = NetworkRecord::new(definition.name.clone());
                record
                    .installed_chaincodes
                    .insert(definition.version.clone(), chaincode);
                self.save(&record, true).await?;
            }
        }

        info!(chaincode = %id, "Chaincode installed");
        Ok(())
    }

    /// Activate an installed version of a network that has none active.
    pub async fn start(&self, name: &str, version: &str) -> ConnectorResult<NetworkDefinition> {
        let _guard = self.lock.lock().await;
        let id = chaincode_id(name, version);

        let Some(mut record) = self.load(name).await? else {
            return Err(LifecycleError::NotInstalled(id).into());
        };
        if let Some(active) = record.active_id() {
            return Err(LifecycleError::AlreadyStarted(active).into());
        }
        let definition = match record.installed_chaincodes.get(version) {
            Some(chaincode) => chaincode.definition()?,
            None => return Err(LifecycleError::NotInstalled(id).into()),
        };

        record.active_version = Some(version.to_string());
        self.save(&record, false).await?;

        info!(chaincode = %id, "Chaincode started");
        Ok(definition)
    }

    /// Switch a started network to another installed version.
    pub async fn upgrade(&self, name: &str, version: &str) -> ConnectorResult<NetworkDefinition> {
        let _guard = self.lock.lock().await;
        let id = chaincode_id(name, version);

        let Some(mut record) = self.load(name).await? else {
            return Err(LifecycleError::NotInstalled(id).into());
        };
        let definition = match record.installed_chaincodes.get(version) {
            Some(chaincode) => chaincode.definition()?,
            None => return Err(LifecycleError::NotInstalled(id).into()),
        };
        let previous = match record.active_version.take() {
            Some(previous) => previous,
            None => return Err(LifecycleError::NotStarted(name.to_string()).into()),
        };

        record.active_version = Some(version.to_string());
        self.save(&record, false).await?;

        info!(chaincode = %id, previous = %previous, "Chaincode upgraded");
        Ok(definition)
    }

    /// Definition of the active version of a network.
    pub async fn get_started_chaincode(&self, name: &str) -> ConnectorResult<NetworkDefinition> {
        let _guard = self.lock.lock().await;
        let record = self.load(name).await?;
        match record.as_ref().and_then(NetworkRecord::active_chaincode) {
            Some(chaincode) => chaincode.definition(),
            None => Err(LifecycleError::NotStarted(name.to_string()).into()),
        }
    }

    /// Forget a network and all of its versions. Removing an unknown network is a no-op.
    pub async fn remove_network(&self, name: &str) -> ConnectorResult<()> {
        let _guard = self.lock.lock().await;
        if self.collection.exists(name).await {
            self.collection.remove(name).await?;
            debug!(network = %name, "Network removed");
        }
        Ok(())
    }

    /// Names of networks with an active version, sorted.
    pub async fn started_networks(&self) -> ConnectorResult<Vec<String>> {
        let _guard = self.lock.lock().await;
        let mut started = Vec::new();
        for key in self.collection.keys().await? {
            if let Some(record) = self.load(&key).await? {
                if record.active_version.is_some() {
                    started.push(record.name);
                }
            }
        }
        started.sort();
        Ok(started)
    }

    async fn load(&self, name: &str) -> ConnectorResult<Option<NetworkRecord>> {
        if !self.collection.exists(name).await {
            return Ok(None);
        }
        let value = self.collection.get(name).await?;
        let record = serde_json::from_value(value).map_err(|e| CollectionError::Corrupt {
            key: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(record))
    }

    async fn save(&self, record: &NetworkRecord, create: bool) -> ConnectorResult<()> {
        let value =
            serde_json::to_value(record).map_err(|e| CollectionError::Backend(e.to_string()))?;
        if create {
            self.collection.add(&record.name, value).await?;
        } else {
            self.collection.update(&record.name, value).await?;
        }
        Ok(())
    }
}
