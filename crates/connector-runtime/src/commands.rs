//! Subcommand implementations. `main` only parses arguments and dispatches.

use crate::config::ConnectorConfig;
use crate::registry::build_registry;
use anyhow::{Context, Result};
use lc_01_proxy_connector::ProxyConnectionManager;
use lc_04_connector_server::ConnectorServer;
use serde_json::{json, Value};
use shared_bus::WsListener;
use shared_types::{Connection, NetworkDefinition};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Run the connector server until ctrl-c.
pub async fn serve(config: &ConnectorConfig) -> Result<()> {
    config.validate()?;
    let registry = Arc::new(build_registry(config));
    info!(connectors = ?registry.connector_types(), "Connector registry ready");

    let listener = WsListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    let server = ConnectorServer::new(registry).with_handshake_timeout(config.server.handshake_timeout());

    tokio::select! {
        result = server.serve_ws(listener) => {
            result.context("connector server stopped")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            info!(active_sessions = server.active_sessions(), "Shutdown requested");
        }
    }
    Ok(())
}

/// Who to log in as and where, for the one-shot client commands.
#[derive(Debug, Clone)]
pub struct ClientRequest {
    pub profile: String,
    pub network: Option<String>,
    pub connector_type: String,
    pub user: String,
    pub secret: String,
}

impl ClientRequest {
    fn options(&self) -> Value {
        json!({ "type": self.connector_type })
    }
}

/// Connect through the proxy, log in and ping the bound network.
pub async fn ping_with(manager: &ProxyConnectionManager, request: &ClientRequest) -> Result<Value> {
    let connection = manager
        .connect_proxy(&request.profile, request.network.as_deref(), &request.options())
        .await
        .context("connect failed")?;

    let outcome = async {
        let ctx = connection
            .login(&request.user, &request.secret)
            .await
            .context("login failed")?;
        connection.ping(&*ctx).await.context("ping failed")
    }
    .await;

    if let Err(e) = connection.disconnect().await {
        warn!(error = %e, "Disconnect after ping failed");
    }
    outcome
}

/// Install and start a network archive through the proxy.
pub async fn deploy_with(
    manager: &ProxyConnectionManager,
    request: &ClientRequest,
    definition: &NetworkDefinition,
    start_transaction: &Value,
) -> Result<()> {
    let connection = manager
        .connect_proxy(&request.profile, None, &request.options())
        .await
        .context("connect failed")?;

    let outcome = async {
        let ctx = connection
            .login(&request.user, &request.secret)
            .await
            .context("login failed")?;
        connection
            .install(&*ctx, definition, &json!({}))
            .await
            .with_context(|| format!("install of {} failed", definition.chaincode_id()))?;
        connection
            .start(&*ctx, &definition.name, &definition.version, start_transaction, &json!({}))
            .await
            .with_context(|| format!("start of {} failed", definition.chaincode_id()))?;
        info!(chaincode = %definition.chaincode_id(), "Network started");
        Ok::<(), anyhow::Error>(())
    }
    .await;

    if let Err(e) = connection.disconnect().await {
        warn!(error = %e, "Disconnect after deploy failed");
    }
    outcome
}

pub async fn ping(config: &ConnectorConfig, request: &ClientRequest) -> Result<Value> {
    let manager = ProxyConnectionManager::new(config.proxy.clone());
    ping_with(&manager, request).await
}

pub async fn deploy(config: &ConnectorConfig, request: &ClientRequest, archive: &Path) -> Result<()> {
    let bytes = std::fs::read(archive)
        .with_context(|| format!("failed to read archive {}", archive.display()))?;
    let definition = NetworkDefinition::from_archive(&bytes)?;
    let manager = ProxyConnectionManager::new(config.proxy.clone());
    deploy_with(&manager, request, &definition, &json!({})).await
}

pub fn print_config(config: &ConnectorConfig) -> Result<String> {
    Ok(config.to_toml()?)
}
