//! # Client Stores
//!
//! Business network cards and connection profiles kept on the server for
//! its clients. Both stores are shared by every session.

use lc_02_chaincode_store::{DataCollection, DynDataCollection, InMemoryCollection};
use serde_json::{Map, Value};
use shared_types::{BusinessNetworkCard, CardMap, CollectionError, ConnectorError, ConnectorResult};
use std::sync::Arc;
use tracing::debug;

pub const CARDS_COLLECTION: &str = "cards";
pub const PROFILES_COLLECTION: &str = "profiles";

#[derive(Clone)]
pub struct ClientStores {
    cards: DynDataCollection,
    profiles: DynDataCollection,
}

impl ClientStores {
    pub fn new(cards: DynDataCollection, profiles: DynDataCollection) -> Self {
        Self { cards, profiles }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryCollection::new(CARDS_COLLECTION)),
            Arc::new(InMemoryCollection::new(PROFILES_COLLECTION)),
        )
    }

    pub async fn card_get(&self, name: &str) -> ConnectorResult<BusinessNetworkCard> {
        let value = self.cards.get(name).await?;
        decode_card(name, value)
    }

    pub async fn card_has(&self, name: &str) -> bool {
        self.cards.exists(name).await
    }

    /// Store a card, replacing any card of the same name.
    pub async fn card_put(&self, name: &str, card: &BusinessNetworkCard) -> ConnectorResult<()> {
        let value = serde_json::to_value(card)
            .map_err(|e| ConnectorError::InvalidArgument(format!("card {name}: {e}")))?;
        upsert(self.cards.as_ref(), name, value).await?;
        debug!(card = name, "Card stored");
        Ok(())
    }

    pub async fn card_get_all(&self) -> ConnectorResult<CardMap> {
        let mut cards = CardMap::new();
        for name in self.cards.keys().await? {
            let value = self.cards.get(&name).await?;
            let card = decode_card(&name, value)?;
            cards.insert(name, card);
        }
        Ok(cards)
    }

    /// `false` when there was no such card.
    pub async fn card_delete(&self, name: &str) -> ConnectorResult<bool> {
        match self.cards.remove(name).await {
            Ok(()) => Ok(true),
            Err(CollectionError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn profile_load(&self, name: &str) -> ConnectorResult<Value> {
        Ok(self.profiles.get(name).await?)
    }

    /// Stored options for `name`, or `None` when no profile is saved.
    pub async fn profile_find(&self, name: &str) -> ConnectorResult<Option<Value>> {
        match self.profiles.get(name).await {
            Ok(options) => Ok(Some(options)),
            Err(CollectionError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn profile_save(&self, name: &str, options: Value) -> ConnectorResult<()> {
        upsert(self.profiles.as_ref(), name, options).await?;
        debug!(profile = name, "Connection profile saved");
        Ok(())
    }

    pub async fn profile_load_all(&self) -> ConnectorResult<Map<String, Value>> {
        let mut profiles = Map::new();
        for name in self.profiles.keys().await? {
            let options = self.profiles.get(&name).await?;
            profiles.insert(name, options);
        }
        Ok(profiles)
    }

    /// Fails with `NotFound` for a profile that was never saved.
    pub async fn profile_delete(&self, name: &str) -> ConnectorResult<()> {
        Ok(self.profiles.remove(name).await?)
    }
}

async fn upsert(collection: &dyn DataCollection, key: &str, value: Value) -> Result<(), CollectionError> {
    if collection.exists(key).await {
        collection.update(key, value).await
    } else {
        collection.add(key, value).await
    }
}

fn decode_card(name: &str, value: Value) -> ConnectorResult<BusinessNetworkCard> {
    serde_json::from_value(value).map_err(|e| {
        ConnectorError::Collection(CollectionError::Corrupt {
            key: name.to_string(),
            reason: e.to_string(),
        })
    })
}
