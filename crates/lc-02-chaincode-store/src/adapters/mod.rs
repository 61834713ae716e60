//! # Adapters
//!
//! - `memory.rs` - In-memory `DataCollection`

pub mod memory;
