//! # Outbound Ports (Driven Ports)
//!
//! Persistence the chaincode store and the in-process connector depend on.

use async_trait::async_trait;
use serde_json::Value;
use shared_types::CollectionError;
use std::sync::Arc;

/// A named collection of JSON objects keyed by string id.
///
/// Production: any document store behind this trait
/// Testing: `InMemoryCollection`
#[async_trait]
pub trait DataCollection: Send + Sync {
    /// Name of the collection, used in error messages.
    fn name(&self) -> &str;

    /// Fails with `NotFound` for a missing key.
    async fn get(&self, key: &str) -> Result<Value, CollectionError>;

    /// Fails with `AlreadyExists` for an existing key.
    async fn add(&self, key: &str, value: Value) -> Result<(), CollectionError>;

    /// Fails with `NotFound` for a missing key.
    async fn update(&self, key: &str, value: Value) -> Result<(), CollectionError>;

    async fn exists(&self, key: &str) -> bool;

    /// Fails with `NotFound` for a missing key.
    async fn remove(&self, key: &str) -> Result<(), CollectionError>;

    /// All keys, sorted.
    async fn keys(&self) -> Result<Vec<String>, CollectionError>;
}

pub type DynDataCollection = Arc<dyn DataCollection>;
