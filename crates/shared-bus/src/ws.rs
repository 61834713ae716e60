//! # WebSocket Transport
//!
//! Bridges a WebSocket stream onto a [`FramePipe`]. One text message carries
//! one JSON frame. A bridge task owns the socket and is the only writer.

use crate::dialer::Dialer;
use crate::frame::Frame;
use crate::pipe::{duplex, FramePipe};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use shared_types::TransportError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, connect_async, WebSocketStream};
use tracing::{debug, info, warn};

/// Map a connector server URL onto its WebSocket endpoint.
///
/// `http` becomes `ws` and `https` becomes `wss`. WebSocket URLs pass through.
pub fn websocket_url(url: &str) -> Result<String, TransportError> {
    if let Some(rest) = url.strip_prefix("http://") {
        Ok(format!("ws://{rest}"))
    } else if let Some(rest) = url.strip_prefix("https://") {
        Ok(format!("wss://{rest}"))
    } else if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(url.to_string())
    } else {
        Err(TransportError::InvalidUrl(url.to_string()))
    }
}

/// Dials connector servers over WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsDialer;

#[async_trait]
impl Dialer for WsDialer {
    async fn dial(&self, url: &str) -> Result<FramePipe, TransportError> {
        let ws_url = websocket_url(url)?;
        let (stream, _) =
            connect_async(ws_url.as_str())
                .await
                .map_err(|e| TransportError::ConnectFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        info!(url = %ws_url, "Connected to connector server");
        let (local, remote) = duplex(DEFAULT_CHANNEL_CAPACITY);
        tokio::spawn(bridge(stream, remote, ws_url));
        Ok(local)
    }
}

/// Accepts WebSocket clients and hands each one out as a [`FramePipe`].
pub struct WsListener {
    listener: TcpListener,
}

impl WsListener {
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::ConnectFailed {
                url: addr.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener
            .local_addr()
            .map_err(|e| TransportError::ConnectFailed {
                url: "listener".to_string(),
                reason: e.to_string(),
            })
    }

    /// Wait for the next TCP client. The WebSocket handshake is left to
    /// [`WsIncoming::upgrade`] so a slow client cannot hold up the accept loop.
    pub async fn accept(&self) -> Result<WsIncoming, TransportError> {
        let (tcp, peer) =
            self.listener
                .accept()
                .await
                .map_err(|e| TransportError::ConnectFailed {
                    url: "listener".to_string(),
                    reason: e.to_string(),
                })?;
        debug!(%peer, "Accepted TCP client");
        Ok(WsIncoming { tcp, peer })
    }
}

/// A TCP client that has not completed the WebSocket handshake yet.
pub struct WsIncoming {
    tcp: TcpStream,
    peer: SocketAddr,
}

impl WsIncoming {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Complete the handshake within `handshake_timeout` and start bridging.
    pub async fn upgrade(self, handshake_timeout: Duration) -> Result<FramePipe, TransportError> {
        let peer = self.peer.to_string();
        let stream = match timeout(handshake_timeout, accept_async(self.tcp)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(TransportError::ConnectFailed {
                    url: peer,
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(TransportError::Timeout {
                    url: peer,
                    timeout_ms: u64::try_from(handshake_timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        };

        debug!(%peer, "WebSocket handshake complete");
        let (local, remote) = duplex(DEFAULT_CHANNEL_CAPACITY);
        tokio::spawn(bridge(stream, remote, peer));
        Ok(local)
    }
}

/// Pump frames between a WebSocket stream and the far end of a pipe.
///
/// Ends when either side goes away. Dropping the pipe ends tells the local
/// holder that the transport is gone.
async fn bridge<S>(stream: WebSocketStream<S>, pipe: FramePipe, peer: String)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sink, mut source) = stream.split();
    let FramePipe {
        outbound,
        mut inbound,
    } = pipe;

    loop {
        tokio::select! {
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => match Frame::from_text(text.as_str()) {
                    Ok(frame) => {
                        if outbound.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(%peer, error = %e, "Dropping malformed frame"),
                },
                Some(Ok(Message::Ping(data))) => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(%peer, error = %e, "WebSocket read failed");
                    break;
                }
            },
            frame = inbound.recv() => match frame {
                Some(frame) => {
                    let text = match frame.to_text() {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(%peer, error = %e, "Failed to encode frame");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            _ = outbound.closed() => break,
        }
    }

    let _ = sink.send(Message::Close(None)).await;
    debug!(%peer, "WebSocket bridge closed");
}
