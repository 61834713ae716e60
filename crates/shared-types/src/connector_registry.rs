//! # Connector Registry
//!
//! Maps a connector type tag to the factory that builds its connection
//! manager. Filled explicitly at startup; nothing is resolved by module name.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = ConnectorRegistry::new();
//! registry.register(Arc::new(WebConnectionManagerFactory::default()));
//!
//! let manager = registry.manager_for("web")?;
//! let connection = manager.connect("profile", Some("net"), &options).await?;
//! ```

use crate::connector_trait::DynConnectionManager;
use crate::errors::RegistryError;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds connection managers for one connector type.
pub trait ConnectionManagerFactory: Send + Sync {
    fn connector_type(&self) -> &str;

    fn create(&self) -> Result<DynConnectionManager, RegistryError>;
}

/// Central registry of connector implementations.
///
/// Managers are created lazily, once per type tag, and cached.
#[derive(Default)]
pub struct ConnectorRegistry {
    factories: RwLock<HashMap<String, Arc<dyn ConnectionManagerFactory>>>,
    managers: Mutex<HashMap<String, DynConnectionManager>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under its own type tag.
    pub fn register(&self, factory: Arc<dyn ConnectionManagerFactory>) {
        let tag = factory.connector_type().to_string();
        self.register_as(tag, factory);
    }

    /// Register a factory under an explicit tag (used for aliases).
    pub fn register_as(&self, tag: impl Into<String>, factory: Arc<dyn ConnectionManagerFactory>) {
        let tag = tag.into();
        info!("[Registry] Registering connector type '{}'", tag);

        if self.factories.write().insert(tag.clone(), factory).is_some() {
            warn!("[Registry] Connector type '{}' already registered, replacing", tag);
            self.managers.lock().remove(&tag);
        }
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.factories.read().contains_key(tag)
    }

    /// All registered type tags, sorted.
    pub fn connector_types(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.factories.read().keys().cloned().collect();
        tags.sort();
        tags
    }

    /// The cached manager for `tag`, created on first use.
    pub fn manager_for(&self, tag: &str) -> Result<DynConnectionManager, RegistryError> {
        let mut managers = self.managers.lock();
        if let Some(manager) = managers.get(tag) {
            return Ok(Arc::clone(manager));
        }

        let factory = self
            .factories
            .read()
            .get(tag)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownConnectorType(tag.to_string()))?;

        let manager = factory.create()?;
        debug!("[Registry] Created connection manager for '{}'", tag);
        managers.insert(tag.to_string(), Arc::clone(&manager));
        Ok(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector_trait::{ConnectionManager, DynConnection, IdentityCredentials};
    use crate::errors::{ConnectorError, ConnectorResult};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullManager;

    #[async_trait]
    impl ConnectionManager for NullManager {
        fn connector_type(&self) -> &str {
            "null"
        }

        async fn connect(
            &self,
            _profile_name: &str,
            _network_name: Option<&str>,
            _options: &Value,
        ) -> ConnectorResult<DynConnection> {
            Err(ConnectorError::NotSupported("connect".into()))
        }

        async fn import_identity(
            &self,
            _profile_name: &str,
            _options: &Value,
            _id: &str,
            _certificate: &str,
            _private_key: &str,
        ) -> ConnectorResult<()> {
            Ok(())
        }

        async fn export_identity(
            &self,
            _profile_name: &str,
            _options: &Value,
            _id: &str,
        ) -> ConnectorResult<Option<IdentityCredentials>> {
            Ok(None)
        }

        async fn remove_identity(
            &self,
            _profile_name: &str,
            _options: &Value,
            _id: &str,
        ) -> ConnectorResult<bool> {
            Ok(false)
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        created: AtomicUsize,
    }

    impl ConnectionManagerFactory for CountingFactory {
        fn connector_type(&self) -> &str {
            "null"
        }

        fn create(&self) -> Result<DynConnectionManager, RegistryError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullManager))
        }
    }

    #[test]
    fn test_manager_is_created_once_per_tag() {
        let registry = ConnectorRegistry::new();
        let factory = Arc::new(CountingFactory::default());
        registry.register(factory.clone());

        let first = registry.manager_for("null").unwrap();
        let second = registry.manager_for("null").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_alias_gets_its_own_manager() {
        let registry = ConnectorRegistry::new();
        let factory = Arc::new(CountingFactory::default());
        registry.register(factory.clone());
        registry.register_as("nothing", factory.clone());

        assert_eq!(registry.connector_types(), vec!["nothing", "null"]);
        registry.manager_for("nothing").unwrap();
        registry.manager_for("null").unwrap();
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_tag() {
        let registry = ConnectorRegistry::new();
        let err = registry.manager_for("hlfv1").err().unwrap();
        assert_eq!(err, RegistryError::UnknownConnectorType("hlfv1".into()));
    }
}
