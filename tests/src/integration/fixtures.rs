use connector_runtime::{build_registry, ConnectorConfig};
use lc_01_proxy_connector::{ProxyConfig, ProxyConnection, ProxyConnectionManager};
use lc_04_connector_server::ConnectorServer;
use serde_json::{json, Value};
use shared_bus::{memory_transport, MemoryDialer};
use shared_types::{Connection, ConnectorError, DynSecurityContext, NetworkDefinition, RemoteError};
use std::sync::Arc;
use std::time::Duration;

pub struct Harness {
    pub manager: ProxyConnectionManager,
    pub server: ConnectorServer,
    pub dialer: MemoryDialer,
}

/// Proxy manager wired to an in-process connector server.
pub fn harness() -> Harness {
    let server = ConnectorServer::new(Arc::new(build_registry(&ConnectorConfig::default())));
    let (dialer, listener) = memory_transport();
    tokio::spawn({
        let server = server.clone();
        async move { server.serve_memory(listener).await }
    });
    let manager = ProxyConnectionManager::with_dialer(
        ProxyConfig::default().with_server_url("memory://connector"),
        Arc::new(dialer.clone()),
    );
    Harness {
        manager,
        server,
        dialer,
    }
}

pub fn web() -> Value {
    json!({ "type": "web" })
}

pub async fn login_admin(
    manager: &ProxyConnectionManager,
    network: Option<&str>,
) -> (Arc<ProxyConnection>, DynSecurityContext) {
    let connection = manager.connect_proxy("default", network, &web()).await.unwrap();
    let ctx = connection.login("admin", "adminpw").await.unwrap();
    (connection, ctx)
}

/// Install and start `name@1.0`, then disconnect.
pub async fn deploy(manager: &ProxyConnectionManager, name: &str) {
    let (connection, ctx) = login_admin(manager, None).await;
    let definition = NetworkDefinition::new(name, "1.0").with_file("models/base.cto", "namespace org.acme");
    connection.install(&*ctx, &definition, &json!({})).await.unwrap();
    connection
        .start(&*ctx, name, "1.0", &json!({ "$class": "org.acme.Setup" }), &json!({}))
        .await
        .unwrap();
    connection.disconnect().await.unwrap();
}

pub fn remote(err: ConnectorError) -> RemoteError {
    match err {
        ConnectorError::Remote(remote) => remote,
        other => panic!("expected a remote error, got {other:?}"),
    }
}

pub async fn wait_for_sessions(server: &ConnectorServer, expected: usize) {
    for _ in 0..200 {
        if server.active_sessions() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {expected} sessions, have {}", server.active_sessions());
}
