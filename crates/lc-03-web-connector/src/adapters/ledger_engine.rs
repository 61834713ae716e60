//! # Ledger Engine
//!
//! Built-in runtime engine: a key/value world state per business network.
//!
//! | Function | Kind | Arguments | Payload |
//! |----------|------|-----------|---------|
//! | `ping` | query | - | `{version, participant}` |
//! | `getState` | query | key | stored value |
//! | `listState` | query | prefix? | object of matching entries |
//! | `putState` | invoke | key, JSON value | - |
//! | `deleteState` | invoke | key | `true` if the key existed |
//! | `emit` | invoke | JSON event | - |

use crate::domain::context::{EngineContext, EngineResponse};
use crate::ports::outbound::RuntimeEngine;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use shared_types::{CollectionError, ConnectorError, ConnectorResult};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Collection name used in missing-key errors.
const WORLD_STATE: &str = "world";

#[derive(Debug, Default)]
struct NetworkState {
    world: BTreeMap<String, Value>,
    start_transaction: Value,
    upgrades: u32,
}

#[derive(Debug, Default)]
pub struct LedgerEngine {
    networks: RwLock<HashMap<String, NetworkState>>,
}

impl LedgerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self, network: &str) -> bool {
        self.networks.read().contains_key(network)
    }

    /// Number of upgrades applied since `init`.
    pub fn upgrade_count(&self, network: &str) -> Option<u32> {
        self.networks.read().get(network).map(|state| state.upgrades)
    }

    /// Start transaction the network was initialized with.
    pub fn start_transaction(&self, network: &str) -> Option<Value> {
        self.networks
            .read()
            .get(network)
            .map(|state| state.start_transaction.clone())
    }

    fn not_initialized(network: &str) -> ConnectorError {
        ConnectorError::Engine(format!(
            "Business network '{network}' has not been initialized"
        ))
    }

    fn read(&self, ctx: &EngineContext, function: &str, args: &[String]) -> ConnectorResult<Value> {
        let networks = self.networks.read();
        let state = networks
            .get(&ctx.network)
            .ok_or_else(|| Self::not_initialized(&ctx.network))?;

        match function {
            "ping" => Ok(json!({
                "version": env!("CARGO_PKG_VERSION"),
                "participant": ctx.participant,
            })),
            "getState" => {
                let key = arg(function, args, 0)?;
                state.world.get(key).cloned().ok_or_else(|| {
                    CollectionError::NotFound {
                        key: key.to_string(),
                        collection: WORLD_STATE.to_string(),
                    }
                    .into()
                })
            }
            "listState" => {
                let prefix = args.first().map(String::as_str).unwrap_or("");
                let entries: Map<String, Value> = state
                    .world
                    .range(prefix.to_string()..)
                    .take_while(|(key, _)| key.starts_with(prefix))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                Ok(Value::Object(entries))
            }
            other => Err(unsupported(other)),
        }
    }
}

fn arg<'a>(function: &str, args: &'a [String], index: usize) -> ConnectorResult<&'a str> {
    args.get(index).map(String::as_str).ok_or_else(|| {
        ConnectorError::InvalidArgument(format!(
            "{function} expects at least {} argument(s), got {}",
            index + 1,
            args.len()
        ))
    })
}

/// Arguments that are not valid JSON are stored as strings.
fn parse_json(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn unsupported(function: &str) -> ConnectorError {
    ConnectorError::Engine(format!("Unsupported function: {function}"))
}

fn is_mutation(function: &str) -> bool {
    matches!(function, "putState" | "deleteState" | "emit")
}

#[async_trait]
impl RuntimeEngine for LedgerEngine {
    async fn init(
        &self,
        ctx: &EngineContext,
        function: &str,
        args: &[String],
    ) -> ConnectorResult<EngineResponse> {
        let mut networks = self.networks.write();
        match function {
            "init" => {
                let start_transaction = args.first().map(|raw| parse_json(raw)).unwrap_or(Value::Null);
                networks.insert(
                    ctx.network.clone(),
                    NetworkState {
                        start_transaction,
                        ..NetworkState::default()
                    },
                );
                debug!(network = %ctx.network, "Ledger initialized");
            }
            "upgrade" => {
                let state = networks
                    .get_mut(&ctx.network)
                    .ok_or_else(|| Self::not_initialized(&ctx.network))?;
                state.upgrades += 1;
                debug!(network = %ctx.network, upgrades = state.upgrades, "Ledger upgraded");
            }
            other => return Err(unsupported(other)),
        }
        Ok(EngineResponse::empty())
    }

    async fn query(
        &self,
        ctx: &EngineContext,
        function: &str,
        args: &[String],
    ) -> ConnectorResult<EngineResponse> {
        if is_mutation(function) {
            return Err(ConnectorError::Engine(format!(
                "Function '{function}' cannot be called from a query"
            )));
        }
        self.read(ctx, function, args).map(EngineResponse::with_payload)
    }

    async fn invoke(
        &self,
        ctx: &EngineContext,
        function: &str,
        args: &[String],
    ) -> ConnectorResult<EngineResponse> {
        if ctx.is_static {
            return Err(ConnectorError::Engine(
                "read-only context cannot invoke".to_string(),
            ));
        }
        if !is_mutation(function) {
            return self.read(ctx, function, args).map(EngineResponse::with_payload);
        }

        let mut networks = self.networks.write();
        let state = networks
            .get_mut(&ctx.network)
            .ok_or_else(|| Self::not_initialized(&ctx.network))?;

        match function {
            "putState" => {
                let key = arg(function, args, 0)?;
                let value = parse_json(arg(function, args, 1)?);
                state.world.insert(key.to_string(), value);
                Ok(EngineResponse::empty())
            }
            "deleteState" => {
                let key = arg(function, args, 0)?;
                let existed = state.world.remove(key).is_some();
                Ok(EngineResponse::with_payload(Value::Bool(existed)))
            }
            "emit" => {
                let event = parse_json(arg(function, args, 0)?);
                Ok(EngineResponse {
                    payload: None,
                    events: vec![event],
                })
            }
            other => Err(unsupported(other)),
        }
    }
}
