//! # Ports Layer
//!
//! - `outbound.rs` - Driven ports (persistence required by the store)

pub mod outbound;
