//! Connection profile store kept on the connector server.

use crate::manager::{parse_result, ProxyConnectionManager};
use serde_json::{json, Map, Value};
use shared_types::{ApiEvent, ConnectorResult};

#[derive(Clone)]
pub struct ProxyConnectionProfileStore {
    manager: ProxyConnectionManager,
}

impl ProxyConnectionProfileStore {
    pub fn new(manager: ProxyConnectionManager) -> Self {
        Self { manager }
    }

    /// Options saved under `profile_name`.
    pub async fn load(&self, profile_name: &str) -> ConnectorResult<Value> {
        self.manager
            .reserved_call(ApiEvent::ConnectionProfileStoreLoad, vec![json!(profile_name)])
            .await
    }

    pub async fn save(&self, profile_name: &str, options: &Value) -> ConnectorResult<()> {
        self.manager
            .reserved_call(
                ApiEvent::ConnectionProfileStoreSave,
                vec![json!(profile_name), options.clone()],
            )
            .await?;
        Ok(())
    }

    pub async fn load_all(&self) -> ConnectorResult<Map<String, Value>> {
        let event = ApiEvent::ConnectionProfileStoreLoadAll;
        let value = self.manager.reserved_call(event, Vec::new()).await?;
        parse_result(event, value)
    }

    pub async fn delete(&self, profile_name: &str) -> ConnectorResult<()> {
        self.manager
            .reserved_call(ApiEvent::ConnectionProfileStoreDelete, vec![json!(profile_name)])
            .await?;
        Ok(())
    }
}
