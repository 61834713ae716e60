//! The same stack over a loopback WebSocket.

use connector_runtime::commands::{deploy_with, ping_with};
use connector_runtime::{build_registry, ClientRequest, ConnectorConfig};
use lc_01_proxy_connector::{ProxyConfig, ProxyConnectionManager, TransportStatus};
use lc_04_connector_server::ConnectorServer;
use serde_json::json;
use shared_bus::WsListener;
use shared_types::{Connection, NetworkDefinition};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

async fn ws_proxy(config: ProxyConfig) -> (ProxyConnectionManager, ConnectorServer) {
    let listener = WsListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = ConnectorServer::new(Arc::new(build_registry(&ConnectorConfig::default())));
    tokio::spawn({
        let server = server.clone();
        async move { server.serve_ws(listener).await }
    });
    let manager = ProxyConnectionManager::new(config.with_server_url(format!("http://{addr}")));
    (manager, server)
}

fn request(network: Option<&str>) -> ClientRequest {
    ClientRequest {
        profile: "default".to_string(),
        network: network.map(str::to_string),
        connector_type: "web".to_string(),
        user: "admin".to_string(),
        secret: "adminpw".to_string(),
    }
}

#[tokio::test]
async fn test_deploy_and_ping_over_websocket() {
    let (manager, _server) = ws_proxy(ProxyConfig::default()).await;

    deploy_with(&manager, &request(None), &NetworkDefinition::new("net", "1.0"), &json!({}))
        .await
        .unwrap();
    let pong = ping_with(&manager, &request(Some("net"))).await.unwrap();

    assert!(pong.get("version").is_some());
    assert_eq!(manager.transport_state(), TransportStatus::Disconnected);
}

#[tokio::test]
async fn test_events_over_websocket_with_socket_left_open() {
    let (manager, server) = ws_proxy(ProxyConfig::default().leave_open()).await;
    deploy_with(&manager, &request(None), &NetworkDefinition::new("net", "1.0"), &json!({}))
        .await
        .unwrap();
    assert!(manager.is_transport_open());

    let connection = manager
        .connect_proxy("default", Some("net"), &json!({ "type": "web" }))
        .await
        .unwrap();
    let ctx = connection.login("admin", "adminpw").await.unwrap();
    let mut events = connection.subscribe_events();

    connection
        .invoke_chaincode(&*ctx, "emit", &[r#"{"n":1}"#.into()], &json!({}))
        .await
        .unwrap();
    let batch = timeout(Duration::from_secs(2), events.recv()).await.unwrap().unwrap();
    assert_eq!(batch, vec![json!({ "n": 1 })]);

    connection.disconnect().await.unwrap();
    assert!(manager.is_transport_open());
    assert_eq!(server.active_sessions(), 1);
}

#[tokio::test]
async fn test_silent_tcp_client_does_not_block_proxy() {
    let listener = WsListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = ConnectorServer::new(Arc::new(build_registry(&ConnectorConfig::default())));
    tokio::spawn({
        let server = server.clone();
        async move { server.serve_ws(listener).await }
    });

    // Connected but never sends a handshake.
    let _silent = tokio::net::TcpStream::connect(addr).await.unwrap();

    let manager = ProxyConnectionManager::new(ProxyConfig::default().with_server_url(format!("http://{addr}")));
    let definition = NetworkDefinition::new("net", "1.0");
    timeout(
        Duration::from_secs(2),
        deploy_with(&manager, &request(None), &definition, &json!({})),
    )
    .await
    .unwrap()
    .unwrap();
    let pong = timeout(Duration::from_secs(2), ping_with(&manager, &request(Some("net"))))
        .await
        .unwrap()
        .unwrap();
    assert!(pong.get("version").is_some());
}
