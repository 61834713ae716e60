//! # Domain Layer
//!
//! - `context` - Engine call context and response
//! - `identity` - Identity records kept by the in-process connector

pub mod context;
pub mod identity;
