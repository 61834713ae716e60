//! # Shared Bus - Frame Transport for Connector RPC
//!
//! Carries event-named RPC calls between a proxy connector and the connector
//! server it talks to.
//!
//! ## Layers
//!
//! ```text
//! ┌──────────────┐  emit(event, args)   ┌──────────────┐
//! │  RpcSocket   │ ───── Request ─────▶ │   Server     │
//! │ PendingCalls │ ◀──── Reply ──────── │   session    │
//! │  EventDemux  │ ◀──── Push ───────── │              │
//! └──────┬───────┘                      └──────┬───────┘
//!        │ FramePipe                           │ FramePipe
//!   ┌────┴──────────── WebSocket / in-memory ──┴────┐
//! ```
//!
//! - **Frames** are JSON text, one per WebSocket message.
//! - **Calls** are correlated by a per-socket monotonically increasing id.
//! - **Pushes** named `events` are routed to the logical connection they name.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod demux;
pub mod dialer;
pub mod frame;
pub mod pending;
pub mod pipe;
pub mod socket;
pub mod ws;

pub use demux::EventDemux;
pub use dialer::{dial_with_timeout, memory_transport, Dialer, MemoryDialer, MemoryListener};
pub use frame::{payload_from_wire, payload_to_wire, Frame, Reply};
pub use pending::PendingCalls;
pub use pipe::{duplex, FramePipe};
pub use socket::RpcSocket;
pub use ws::{WsDialer, WsIncoming, WsListener};

/// Frames buffered per direction before senders wait.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Event batches buffered per logical connection.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;
