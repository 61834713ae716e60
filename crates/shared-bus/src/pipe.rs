//! # Frame Pipes
//!
//! A bidirectional, in-order channel of frames. Every transport (WebSocket or
//! in-memory) is reduced to one of these before the RPC layer sees it.

use crate::frame::Frame;
use tokio::sync::mpsc;

/// One end of a frame channel.
///
/// The peer sees end-of-stream on its `inbound` once every clone of this
/// end's `outbound` has been dropped.
#[derive(Debug)]
pub struct FramePipe {
    pub outbound: mpsc::Sender<Frame>,
    pub inbound: mpsc::Receiver<Frame>,
}

/// Two connected pipe ends.
pub fn duplex(capacity: usize) -> (FramePipe, FramePipe) {
    let (a_tx, b_rx) = mpsc::channel(capacity);
    let (b_tx, a_rx) = mpsc::channel(capacity);
    (
        FramePipe {
            outbound: a_tx,
            inbound: a_rx,
        },
        FramePipe {
            outbound: b_tx,
            inbound: b_rx,
        },
    )
}
