//! # Ledger Connector Test Suite
//!
//! ```text
//! tests/
//! ├── benches/          # Codec and archive throughput
//! └── src/integration/  # Proxy → connector server → web connector
//!     ├── proxy_to_web.rs   (in-process transport)
//!     └── websocket.rs      (loopback WebSocket)
//! ```
//!
//! ```bash
//! cargo test -p lc-tests
//! cargo bench -p lc-tests
//! ```

pub mod integration;
