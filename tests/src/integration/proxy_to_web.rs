//! Proxy → connector server → web connector over the in-process transport.

use super::fixtures::{deploy, harness, login_admin, remote, wait_for_sessions, web};
use lc_01_proxy_connector::TransportStatus;
use serde_json::{json, Value};
use shared_types::{
    Connection, ConnectionManager, ConnectorError, ErrorKind, NetworkDefinition, SecurityContext,
};
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn test_install_start_invoke_query() {
    let h = harness();
    deploy(&h.manager, "net").await;

    let (connection, ctx) = login_admin(&h.manager, Some("net")).await;
    assert_eq!(connection.list(&*ctx).await.unwrap(), vec!["net"]);

    let written = connection
        .invoke_chaincode(&*ctx, "putState", &["asset1".into(), r#"{"owner":"alice"}"#.into()], &json!({}))
        .await
        .unwrap();
    assert_eq!(written, None);

    let bytes = connection
        .query_chaincode(&*ctx, "getState", &["asset1".into()])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap(), json!({ "owner": "alice" }));

    let pong = connection.ping(&*ctx).await.unwrap();
    assert!(pong.get("version").is_some());

    let tx = connection.create_transaction_id(&*ctx).await.unwrap();
    assert!(!tx.id.is_empty());
    assert!(!tx.id_str.is_empty());

    connection.disconnect().await.unwrap();
    assert_eq!(h.manager.pool_size(), 0);
}

#[tokio::test]
async fn test_lifecycle_errors_cross_the_wire() {
    let h = harness();
    deploy(&h.manager, "net").await;
    let (connection, ctx) = login_admin(&h.manager, None).await;

    let again = connection
        .install(&*ctx, &NetworkDefinition::new("net", "1.0"), &json!({}))
        .await
        .unwrap_err();
    let again = remote(again);
    assert_eq!(again.kind(), ErrorKind::Error);
    assert_eq!(again.message(), "Chaincode already installed: net@1.0");

    let started = remote(
        connection
            .start(&*ctx, "net", "1.0", &json!({}), &json!({}))
            .await
            .unwrap_err(),
    );
    assert_eq!(started.message(), "Chaincode already started: net@1.0");

    let missing = remote(
        connection
            .upgrade(&*ctx, "net", "2.0", &json!({}))
            .await
            .unwrap_err(),
    );
    assert_eq!(missing.message(), "Chaincode not installed: net@2.0");
}

#[tokio::test]
async fn test_upgrade_keeps_world_state() {
    let h = harness();
    deploy(&h.manager, "net").await;
    let (connection, ctx) = login_admin(&h.manager, Some("net")).await;
    connection
        .invoke_chaincode(&*ctx, "putState", &["k".into(), "v".into()], &json!({}))
        .await
        .unwrap();

    connection
        .install(&*ctx, &NetworkDefinition::new("net", "2.0"), &json!({}))
        .await
        .unwrap();
    connection.upgrade(&*ctx, "net", "2.0", &json!({})).await.unwrap();

    let bytes = connection
        .query_chaincode(&*ctx, "getState", &["k".into()])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap(), json!("v"));
}

#[tokio::test]
async fn test_identity_management_through_manager() {
    let h = harness();

    h.manager
        .import_identity("default", &web(), "bob", "CERT", "KEY")
        .await
        .unwrap();
    let exported = h
        .manager
        .export_identity("default", &web(), "bob")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(exported.certificate, "CERT");
    assert_eq!(exported.private_key, "KEY");

    assert!(h.manager.remove_identity("default", &web(), "bob").await.unwrap());
    assert!(!h.manager.remove_identity("default", &web(), "bob").await.unwrap());
    assert!(h.manager.export_identity("default", &web(), "bob").await.unwrap().is_none());

    let rejected = h
        .manager
        .import_identity("default", &web(), "eve", "", "KEY")
        .await
        .unwrap_err();
    assert_eq!(remote(rejected).kind(), ErrorKind::TypeError);

    // Every identity call ran under its own reservation.
    assert_eq!(h.manager.pool_size(), 0);
}

#[tokio::test]
async fn test_issued_identity_can_log_in() {
    let h = harness();
    let (admin, ctx) = login_admin(&h.manager, None).await;

    let issued = admin.create_identity(&*ctx, "carol", &json!({})).await.unwrap();
    assert_eq!(issued.user_id, "carol");

    let carol = admin.login("carol", &issued.user_secret).await.unwrap();
    assert_eq!(carol.user(), "carol");

    let wrong = remote(admin.login("carol", "guess").await.unwrap_err());
    assert!(wrong.message().contains("does not match"));
}

#[tokio::test]
async fn test_events_reach_only_the_owning_connection() {
    let h = harness();
    deploy(&h.manager, "net").await;
    let (emitter, ctx) = login_admin(&h.manager, Some("net")).await;
    let (bystander, _) = login_admin(&h.manager, Some("net")).await;

    let mut mine = emitter.subscribe_events();
    let mut theirs = bystander.subscribe_events();

    emitter
        .invoke_chaincode(&*ctx, "emit", &[r#"{"eventId":"e1"}"#.into()], &json!({}))
        .await
        .unwrap();

    let batch = timeout(Duration::from_secs(2), mine.recv()).await.unwrap().unwrap();
    assert_eq!(batch, vec![json!({ "eventId": "e1" })]);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(theirs.try_recv().is_err());
}

#[tokio::test]
async fn test_context_bound_to_its_connection() {
    let h = harness();
    let (first, ctx) = login_admin(&h.manager, None).await;
    let (second, _) = login_admin(&h.manager, None).await;
    assert_ne!(first.connection_id(), second.connection_id());

    let err = remote(second.list(&*ctx).await.unwrap_err());
    assert_eq!(err.kind(), ErrorKind::ReferenceError);
}

#[tokio::test]
async fn test_unknown_connector_type_releases_reservation() {
    let h = harness();
    let err = h
        .manager
        .connect_proxy("default", None, &json!({ "type": "hlfv1" }))
        .await
        .err()
        .unwrap();
    assert!(remote(err).message().contains("hlfv1"));
    assert_eq!(h.manager.pool_size(), 0);
}

#[tokio::test]
async fn test_calls_after_disconnect_fail_fast() {
    let h = harness();
    let (connection, ctx) = login_admin(&h.manager, None).await;
    connection.disconnect().await.unwrap();

    assert!(matches!(
        connection.ping(&*ctx).await,
        Err(ConnectorError::ConnectionClosed(_))
    ));
    // Disconnecting twice is harmless.
    connection.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_transport_closes_after_last_connection_and_redials() {
    let h = harness();
    let (a, _) = login_admin(&h.manager, None).await;
    let (b, _) = login_admin(&h.manager, None).await;
    assert_eq!(h.dialer.dial_count(), 1);
    wait_for_sessions(&h.server, 1).await;

    a.disconnect().await.unwrap();
    assert!(h.manager.is_transport_open());

    b.disconnect().await.unwrap();
    assert_eq!(h.manager.transport_state(), TransportStatus::Disconnected);
    wait_for_sessions(&h.server, 0).await;

    let (c, ctx) = login_admin(&h.manager, None).await;
    assert_eq!(h.dialer.dial_count(), 2);
    assert!(c.list(&*ctx).await.unwrap().is_empty());
}
