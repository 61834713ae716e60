//! # Web Connection Manager
//!
//! Owns the state shared by every in-process connection it creates: the
//! chaincode store, the identities collection and the runtime engine.

use crate::adapters::ledger_engine::LedgerEngine;
use crate::config::{EngineKind, WebConfig};
use crate::connection::WebConnection;
use crate::domain::identity::{IdentityRecord, PLACEHOLDER_PRIVATE_KEY};
use crate::ports::outbound::DynRuntimeEngine;
use crate::{CONNECTOR_TYPE, IDENTITIES_COLLECTION};
use async_trait::async_trait;
use lc_02_chaincode_store::{ChaincodeStore, DataCollection, DynDataCollection, InMemoryCollection};
use serde_json::Value;
use shared_types::{
    CollectionError, ConnectionId, ConnectionManager, ConnectionManagerFactory, ConnectorError,
    ConnectorResult, DynConnection, DynConnectionManager, IdentityCredentials, IdentityInfo,
    RegistryError,
};
use std::sync::Arc;
use tracing::{debug, info};

struct Shared {
    store: ChaincodeStore,
    identities: DynDataCollection,
    engine: DynRuntimeEngine,
}

#[derive(Clone)]
pub struct WebConnectionManager {
    inner: Arc<Shared>,
}

impl WebConnectionManager {
    pub fn new(config: &WebConfig) -> Self {
        let engine: DynRuntimeEngine = match config.engine {
            EngineKind::Ledger => Arc::new(LedgerEngine::new()),
        };
        Self::with_engine(engine)
    }

    /// Manager over in-memory collections and the given engine.
    pub fn with_engine(engine: DynRuntimeEngine) -> Self {
        Self::with_parts(
            ChaincodeStore::in_memory(),
            Arc::new(InMemoryCollection::new(IDENTITIES_COLLECTION)),
            engine,
        )
    }

    pub fn with_parts(
        store: ChaincodeStore,
        identities: DynDataCollection,
        engine: DynRuntimeEngine,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                store,
                identities,
                engine,
            }),
        }
    }

    pub fn store(&self) -> &ChaincodeStore {
        &self.inner.store
    }

    pub fn engine(&self) -> &DynRuntimeEngine {
        &self.inner.engine
    }

    /// Open an in-process connection.
    pub fn connect_web(&self, profile_name: &str, network_name: Option<&str>) -> Arc<WebConnection> {
        let connection_id = ConnectionId::generate();
        info!(
            connection_id = %connection_id,
            profile = %profile_name,
            network = ?network_name,
            "In-process connection opened"
        );
        Arc::new(WebConnection::new(
            self.clone(),
            connection_id,
            profile_name.to_string(),
            network_name.map(str::to_string),
        ))
    }

    pub(crate) async fn load_identity(&self, id: &str) -> ConnectorResult<Option<IdentityRecord>> {
        let identities = &self.inner.identities;
        if !identities.exists(id).await {
            return Ok(None);
        }
        let value = identities.get(id).await?;
        let record = serde_json::from_value(value).map_err(|e| CollectionError::Corrupt {
            key: id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(record))
    }

    /// Existing identity, or a freshly issued one.
    pub(crate) async fn issue_identity(&self, id: &str) -> ConnectorResult<IdentityInfo> {
        if let Some(existing) = self.load_identity(id).await? {
            return Ok(existing.info());
        }
        let record = IdentityRecord::issued(id);
        match self.inner.identities.add(id, to_value(&record)?).await {
            Ok(()) => {
                info!(user = %id, "Identity issued");
                Ok(record.info())
            }
            // Lost a race with a concurrent issue for the same id.
            Err(CollectionError::AlreadyExists { .. }) => match self.load_identity(id).await? {
                Some(existing) => Ok(existing.info()),
                None => Err(CollectionError::NotFound {
                    key: id.to_string(),
                    collection: IDENTITIES_COLLECTION.to_string(),
                }
                .into()),
            },
            Err(e) => Err(e.into()),
        }
    }
}

fn to_value(record: &IdentityRecord) -> ConnectorResult<Value> {
    serde_json::to_value(record).map_err(|e| CollectionError::Backend(e.to_string()).into())
}

#[async_trait]
impl ConnectionManager for WebConnectionManager {
    fn connector_type(&self) -> &str {
        CONNECTOR_TYPE
    }

    async fn connect(
        &self,
        profile_name: &str,
        network_name: Option<&str>,
        _options: &Value,
    ) -> ConnectorResult<DynConnection> {
        let connection: DynConnection = self.connect_web(profile_name, network_name);
        Ok(connection)
    }

    async fn import_identity(
        &self,
        _profile_name: &str,
        _options: &Value,
        id: &str,
        certificate: &str,
        private_key: &str,
    ) -> ConnectorResult<()> {
        if certificate.trim().is_empty() {
            return Err(ConnectorError::InvalidArgument(
                "certificate must not be empty".to_string(),
            ));
        }
        let record = IdentityRecord::imported(id, certificate, private_key);
        let value = to_value(&record)?;
        let identities = &self.inner.identities;
        if identities.exists(id).await {
            identities.update(id, value).await?;
        } else {
            identities.add(id, value).await?;
        }
        info!(user = %id, identifier = ?record.identifier, "Identity imported");
        Ok(())
    }

    async fn export_identity(
        &self,
        _profile_name: &str,
        _options: &Value,
        id: &str,
    ) -> ConnectorResult<Option<IdentityCredentials>> {
        let credentials = self.load_identity(id).await?.and_then(|record| {
            let certificate = record.certificate?;
            Some(IdentityCredentials {
                certificate,
                private_key: record
                    .private_key
                    .unwrap_or_else(|| PLACEHOLDER_PRIVATE_KEY.to_string()),
            })
        });
        debug!(user = %id, found = credentials.is_some(), "Identity exported");
        Ok(credentials)
    }

    async fn remove_identity(
        &self,
        _profile_name: &str,
        _options: &Value,
        id: &str,
    ) -> ConnectorResult<bool> {
        let identities = &self.inner.identities;
        if !identities.exists(id).await {
            return Ok(false);
        }
        match identities.remove(id).await {
            Ok(()) => {
                info!(user = %id, "Identity removed");
                Ok(true)
            }
            Err(CollectionError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Registry factory for the in-process connector.
pub struct WebConnectionManagerFactory {
    config: WebConfig,
}

impl WebConnectionManagerFactory {
    pub fn new(config: WebConfig) -> Self {
        Self { config }
    }
}

impl ConnectionManagerFactory for WebConnectionManagerFactory {
    fn connector_type(&self) -> &str {
        CONNECTOR_TYPE
    }

    fn create(&self) -> Result<DynConnectionManager, RegistryError> {
        Ok(Arc::new(WebConnectionManager::new(&self.config)))
    }
}
