//! # Ports Layer
//!
//! - `outbound.rs` - The runtime engine a web connection executes against

pub mod outbound;
