//! # Chaincode Store (lc-02)
//!
//! Tracks which versions of each business network are installed and which
//! one is active, mirroring the chaincode lifecycle of a Fabric peer.
//!
//! ## Lifecycle
//!
//! ```text
//!            install(v)             start(v)              upgrade(v')
//! unknown ─────────────▶ installed ──────────▶ started(v) ────────────▶ started(v')
//!                          │   ▲                                │
//!                          └───┘ install(v'')                   │ remove_network
//!                                                               ▼
//!                                                            unknown
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Unique versions | A version can be installed once per network |
//! | Single active | At most one active version per network |
//! | Active is installed | The active version is always an installed one |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Network and chaincode records
//! - `ports/` - The `DataCollection` persistence port
//! - `adapters/` - In-memory collection
//! - `service.rs` - `ChaincodeStore` state machine

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::memory::InMemoryCollection;
pub use domain::records::{ChaincodeRecord, NetworkRecord};
pub use ports::outbound::{DataCollection, DynDataCollection};
pub use service::ChaincodeStore;

/// Name of the collection chaincode records are kept in.
pub const CHAINCODES_COLLECTION: &str = "chaincodes";
