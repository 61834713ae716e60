//! # Outbound Ports (Driven Ports)

use crate::domain::context::{EngineContext, EngineResponse};
use async_trait::async_trait;
use shared_types::ConnectorResult;
use std::sync::Arc;

/// Executes chaincode functions for started business networks.
///
/// Production: a full business network runtime
/// Testing: `LedgerEngine`
#[async_trait]
pub trait RuntimeEngine: Send + Sync {
    /// Instantiate (`init`) or upgrade (`upgrade`) a network.
    async fn init(
        &self,
        ctx: &EngineContext,
        function: &str,
        args: &[String],
    ) -> ConnectorResult<EngineResponse>;

    /// Read-only call. Implementations must not change state.
    async fn query(
        &self,
        ctx: &EngineContext,
        function: &str,
        args: &[String],
    ) -> ConnectorResult<EngineResponse>;

    async fn invoke(
        &self,
        ctx: &EngineContext,
        function: &str,
        args: &[String],
    ) -> ConnectorResult<EngineResponse>;
}

pub type DynRuntimeEngine = Arc<dyn RuntimeEngine>;
