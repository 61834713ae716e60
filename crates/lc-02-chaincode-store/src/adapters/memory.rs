//! In-memory data collection.

use crate::ports::outbound::DataCollection;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::CollectionError;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct InMemoryCollection {
    name: String,
    data: RwLock<BTreeMap<String, Value>>,
}

impl InMemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn not_found(&self, key: &str) -> CollectionError {
        CollectionError::NotFound {
            key: key.to_string(),
            collection: self.name.clone(),
        }
    }
}

#[async_trait]
impl DataCollection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Value, CollectionError> {
        self.data
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| self.not_found(key))
    }

    async fn add(&self, key: &str, value: Value) -> Result<(), CollectionError> {
        let mut data = self.data.write();
        if data.contains_key(key) {
            return Err(CollectionError::AlreadyExists {
                key: key.to_string(),
                collection: self.name.clone(),
            });
        }
        data.insert(key.to_string(), value);
        Ok(())
    }

    async fn update(&self, key: &str, value: Value) -> Result<(), CollectionError> {
        let mut data = self.data.write();
        match data.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(self.not_found(key)),
        }
    }

    async fn exists(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    async fn remove(&self, key: &str) -> Result<(), CollectionError> {
        self.data
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| self.not_found(key))
    }

    async fn keys(&self) -> Result<Vec<String>, CollectionError> {
        Ok(self.data.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_then_get() {
        let collection = InMemoryCollection::new("identities");
        collection.add("alice", json!({ "secret": "x" })).await.unwrap();

        assert!(collection.exists("alice").await);
        assert_eq!(collection.get("alice").await.unwrap(), json!({ "secret": "x" }));
    }

    #[tokio::test]
    async fn test_add_existing_fails() {
        let collection = InMemoryCollection::new("identities");
        collection.add("alice", json!(1)).await.unwrap();

        let err = collection.add("alice", json!(2)).await.unwrap_err();
        assert_eq!(
            err,
            CollectionError::AlreadyExists {
                key: "alice".into(),
                collection: "identities".into()
            }
        );
        assert_eq!(collection.get("alice").await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_missing_key_operations_fail() {
        let collection = InMemoryCollection::new("chaincodes");

        assert!(!collection.exists("net").await);
        assert!(matches!(
            collection.get("net").await,
            Err(CollectionError::NotFound { .. })
        ));
        assert!(matches!(
            collection.update("net", json!({})).await,
            Err(CollectionError::NotFound { .. })
        ));
        assert!(matches!(
            collection.remove("net").await,
            Err(CollectionError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let collection = InMemoryCollection::new("chaincodes");
        collection.add("b", json!(1)).await.unwrap();
        collection.add("a", json!(1)).await.unwrap();
        collection.update("b", json!(2)).await.unwrap();

        assert_eq!(collection.get("b").await.unwrap(), json!(2));
        assert_eq!(collection.keys().await.unwrap(), vec!["a", "b"]);

        collection.remove("a").await.unwrap();
        assert_eq!(collection.len(), 1);
    }
}
