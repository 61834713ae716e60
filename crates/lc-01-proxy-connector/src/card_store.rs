//! # Proxy Card Store
//!
//! Business network card store kept on the connector server. Each call
//! holds a pool reservation on the shared socket for its duration, the
//! same way identity calls do.

use crate::manager::{parse_result, ProxyConnectionManager};
use serde_json::{json, Value};
use shared_types::{ApiEvent, BusinessNetworkCard, CardMap, ConnectorError, ConnectorResult};
use tracing::debug;

#[derive(Clone)]
pub struct ProxyCardStore {
    manager: ProxyConnectionManager,
}

impl ProxyCardStore {
    /// Store sharing `manager`'s socket and pool.
    pub fn new(manager: ProxyConnectionManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &ProxyConnectionManager {
        &self.manager
    }

    pub async fn get(&self, card_name: &str) -> ConnectorResult<BusinessNetworkCard> {
        let event = ApiEvent::BusinessNetworkCardStoreGet;
        let value = self.manager.reserved_call(event, vec![json!(card_name)]).await?;
        parse_result(event, value)
    }

    pub async fn has(&self, card_name: &str) -> ConnectorResult<bool> {
        let event = ApiEvent::BusinessNetworkCardStoreHas;
        let value = self.manager.reserved_call(event, vec![json!(card_name)]).await?;
        parse_result(event, value)
    }

    pub async fn put(&self, card_name: &str, card: &BusinessNetworkCard) -> ConnectorResult<()> {
        let card = serde_json::to_value(card)
            .map_err(|e| ConnectorError::InvalidArgument(format!("card {card_name}: {e}")))?;
        self.manager
            .reserved_call(ApiEvent::BusinessNetworkCardStorePut, vec![json!(card_name), card])
            .await?;
        debug!(card = card_name, "Card stored on connector server");
        Ok(())
    }

    pub async fn get_all(&self) -> ConnectorResult<CardMap> {
        let event = ApiEvent::BusinessNetworkCardStoreGetAll;
        let value = self.manager.reserved_call(event, Vec::new()).await?;
        parse_result(event, value)
    }

    /// `false` when the server had no such card.
    pub async fn delete(&self, card_name: &str) -> ConnectorResult<bool> {
        let event = ApiEvent::BusinessNetworkCardStoreDelete;
        let value = self.manager.reserved_call(event, vec![json!(card_name)]).await?;
        // An older server answers with nothing; treat it as deleted.
        match value {
            Value::Null => Ok(true),
            other => parse_result(event, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Connection;
    use crate::config::ProxyConfig;
    use crate::manager::TransportStatus;
    use crate::test_utils::{admin_card, GatedDialer, ScriptedServer, ADMIN_CARD};
    use shared_types::ErrorKind;
    use std::sync::Arc;
    use std::time::Duration;

    fn store_for(server: &ScriptedServer) -> ProxyCardStore {
        ProxyCardStore::new(ProxyConnectionManager::with_dialer(
            ProxyConfig::default(),
            Arc::new(server.dialer.clone()),
        ))
    }

    #[tokio::test]
    async fn test_get_inflates_card() {
        let server = ScriptedServer::start();
        let store = store_for(&server);

        let card = store.get(ADMIN_CARD).await.unwrap();
        assert_eq!(card.user_name(), Some("admin"));
        assert_eq!(card.connection_profile["type"], "web");
        assert_eq!(card.credentials.unwrap()["privateKey"], "KEY");

        assert_eq!(
            server.calls_of(ApiEvent::BusinessNetworkCardStoreGet),
            vec![vec![json!(ADMIN_CARD)]]
        );
        assert_eq!(store.manager().pool_size(), 0);
        assert_eq!(store.manager().transport_state(), TransportStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_missing_card_relays_remote_error() {
        let server = ScriptedServer::start();
        let store = store_for(&server);

        match store.get("nobody@net").await {
            Err(ConnectorError::Remote(remote)) => {
                assert_eq!(remote.kind(), ErrorKind::Error);
                assert_eq!(remote.message(), "Card not found: nobody@net");
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(store.manager().pool_size(), 0);
    }

    #[tokio::test]
    async fn test_has_put_get_all_delete() {
        let server = ScriptedServer::start();
        let store = store_for(&server);

        assert!(store.has(ADMIN_CARD).await.unwrap());
        assert!(!store.has("bob@net").await.unwrap());

        let card: BusinessNetworkCard = serde_json::from_value(admin_card()).unwrap();
        store.put("copy@test-network", &card).await.unwrap();
        assert_eq!(
            server.calls_of(ApiEvent::BusinessNetworkCardStorePut),
            vec![vec![json!("copy@test-network"), admin_card()]]
        );

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[ADMIN_CARD], card);

        assert!(store.delete(ADMIN_CARD).await.unwrap());
        assert!(!store.delete("bob@net").await.unwrap());
        assert_eq!(store.manager().pool_size(), 0);
    }

    #[tokio::test]
    async fn test_store_call_waits_for_shared_dial() {
        let server = ScriptedServer::start();
        let dialer = Arc::new(GatedDialer::new(server.dialer.clone()));
        let manager = ProxyConnectionManager::with_dialer(ProxyConfig::default(), dialer.clone());
        let store = ProxyCardStore::new(manager.clone());

        let has = tokio::spawn({
            let store = store.clone();
            async move { store.has(ADMIN_CARD).await }
        });
        let connect = tokio::spawn({
            let manager = manager.clone();
            async move { manager.connect_proxy("p", None, &json!({})).await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(manager.pool_size(), 2);
        assert_eq!(manager.transport_state(), TransportStatus::Connecting);

        dialer.open();
        assert!(has.await.unwrap().unwrap());
        let connection = connect.await.unwrap().unwrap();

        assert_eq!(dialer.dial_count(), 1);
        assert_eq!(manager.pool_size(), 1);
        assert!(manager.has_connection(connection.connection_id()));
        assert!(manager.is_transport_open());
    }
}
