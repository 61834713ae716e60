//! # Connector Runtime
//!
//! Configuration, logging and registry wiring for the `connector-runtime`
//! binary, plus the subcommands it runs.
//!
//! ```text
//! connector.toml ──▶ ConnectorConfig ──▶ build_registry ──▶ ConnectorServer (serve)
//!        ▲                 │
//!   LC_* env vars          └──▶ ProxyConnectionManager ──▶ ping / deploy
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod commands;
pub mod config;
pub mod registry;
pub mod telemetry;

pub use commands::ClientRequest;
pub use config::{ConfigError, ConnectorConfig, LoggingConfig};
pub use registry::{build_registry, EMBEDDED_CONNECTOR_TYPE};
pub use telemetry::{init_tracing, TelemetryError};
