//! Card and connection profile stores reached through the proxy.

use super::fixtures::{harness, remote, web};
use lc_01_proxy_connector::{ProxyCardStore, ProxyConnectionProfileStore};
use serde_json::json;
use shared_types::{BusinessNetworkCard, Connection, ErrorKind};

fn admin_card() -> BusinessNetworkCard {
    BusinessNetworkCard::new(
        json!({ "userName": "admin", "businessNetwork": "test-network" }),
        json!({ "name": "default", "type": "web" }),
    )
    .with_credentials(json!({ "certificate": "CERT", "privateKey": "KEY" }))
}

#[tokio::test]
async fn test_card_store_round_trip() {
    let h = harness();
    let cards = ProxyCardStore::new(h.manager.clone());

    assert!(!cards.has("admin@test-network").await.unwrap());
    cards.put("admin@test-network", &admin_card()).await.unwrap();
    assert!(cards.has("admin@test-network").await.unwrap());
    assert_eq!(cards.get("admin@test-network").await.unwrap(), admin_card());

    let all = cards.get_all().await.unwrap();
    assert_eq!(all.keys().collect::<Vec<_>>(), vec!["admin@test-network"]);

    assert!(cards.delete("admin@test-network").await.unwrap());
    assert!(!cards.delete("admin@test-network").await.unwrap());

    let missing = remote(cards.get("admin@test-network").await.unwrap_err());
    assert_eq!(missing.kind(), ErrorKind::Error);
    assert!(missing.message().contains("admin@test-network"));
    assert_eq!(h.manager.pool_size(), 0);
}

#[tokio::test]
async fn test_cards_survive_the_client_socket() {
    let h = harness();
    ProxyCardStore::new(h.manager.clone())
        .put("alice@net", &admin_card())
        .await
        .unwrap();
    assert!(!h.manager.is_transport_open());

    // The next call dials a fresh socket and sees the same server store.
    let fresh = ProxyCardStore::new(h.manager.clone());
    assert!(fresh.has("alice@net").await.unwrap());
}

#[tokio::test]
async fn test_connect_saves_profile_on_server() {
    let h = harness();
    let profiles = ProxyConnectionProfileStore::new(h.manager.clone());
    profiles
        .save("default", &json!({ "type": "web", "channel": "composer" }))
        .await
        .unwrap();

    let connection = h.manager.connect_proxy("default", None, &web()).await.unwrap();
    connection.disconnect().await.unwrap();

    assert_eq!(
        profiles.load("default").await.unwrap(),
        json!({ "type": "web", "channel": "composer" })
    );
    let all = profiles.load_all().await.unwrap();
    assert_eq!(all.len(), 1);

    profiles.delete("default").await.unwrap();
    let gone = remote(profiles.load("default").await.unwrap_err());
    assert_eq!(gone.kind(), ErrorKind::Error);
    assert_eq!(h.manager.pool_size(), 0);
}
