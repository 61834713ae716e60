//! Connector registry wiring.

use crate::config::ConnectorConfig;
use lc_01_proxy_connector::ProxyConnectionManagerFactory;
use lc_03_web_connector::WebConnectionManagerFactory;
use shared_types::ConnectorRegistry;
use std::sync::Arc;

/// Alias for the in-process connector.
pub const EMBEDDED_CONNECTOR_TYPE: &str = "embedded";

/// Registry with every connector this runtime ships.
pub fn build_registry(config: &ConnectorConfig) -> ConnectorRegistry {
    let registry = ConnectorRegistry::new();
    registry.register(Arc::new(ProxyConnectionManagerFactory::new(config.proxy.clone())));

    let web = Arc::new(WebConnectionManagerFactory::new(config.web.clone()));
    registry.register(web.clone());
    registry.register_as(EMBEDDED_CONNECTOR_TYPE, web);
    registry
}
