//! # Adapters
//!
//! - `ledger_engine.rs` - Built-in key/value runtime engine

pub mod ledger_engine;
