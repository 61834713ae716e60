//! Scripted connector server and dialers for exercising the proxy in
//! isolation.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_bus::{memory_transport, Dialer, Frame, FramePipe, MemoryDialer};
use shared_types::events::EVENTS;
use shared_types::{ApiEvent, ErrorKind, TransportError, WireError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Semaphore};

/// Card name the canned server knows about.
pub const ADMIN_CARD: &str = "admin@test-network";

pub fn admin_card() -> Value {
    json!({
        "metadata": { "userName": "admin", "businessNetwork": "test-network" },
        "connectionProfile": { "name": "hlfv1", "type": "web" },
        "credentials": { "certificate": "CERT", "privateKey": "KEY" }
    })
}

type Handler = Arc<dyn Fn(&str, &[Value]) -> Result<Value, WireError> + Send + Sync>;
type CallLog = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

pub struct ScriptedServer {
    pub dialer: MemoryDialer,
    calls: CallLog,
    sessions: Arc<Mutex<Vec<mpsc::Sender<Frame>>>>,
    kill: watch::Sender<u64>,
}

impl ScriptedServer {
    /// Server answering every event with canned results.
    pub fn start() -> Self {
        let next_connection = Arc::new(AtomicUsize::new(0));
        let next_tx = Arc::new(AtomicUsize::new(0));
        Self::with_handler(move |event, args| {
            let arg = |i: usize| args.get(i).and_then(Value::as_str).unwrap_or_default().to_string();
            let Ok(event) = event.parse::<ApiEvent>() else {
                return Err(WireError::new(ErrorKind::Error, format!("Unknown event {event}")));
            };
            Ok(match event {
                ApiEvent::ConnectionManagerConnect => {
                    json!(format!("conn-{}", next_connection.fetch_add(1, Ordering::SeqCst)))
                }
                ApiEvent::ConnectionLogin if arg(2) == "bad" => {
                    return Err(WireError::new(
                        ErrorKind::Error,
                        format!("Authorization failed for {}", arg(1)),
                    ));
                }
                ApiEvent::ConnectionLogin => json!(format!("ctx-{}", arg(1))),
                ApiEvent::ConnectionPing => json!({ "version": "0.1.0", "participant": null }),
                ApiEvent::ConnectionQueryChainCode if arg(2) == "empty" => Value::Null,
                ApiEvent::ConnectionQueryChainCode => json!("{\"ok\":true}"),
                ApiEvent::ConnectionList => json!(["net-a"]),
                ApiEvent::ConnectionCreateIdentity => {
                    json!({ "userID": arg(2), "userSecret": "s3cret" })
                }
                ApiEvent::ConnectionCreateTransactionId => {
                    let id = format!("tx-{}", next_tx.fetch_add(1, Ordering::SeqCst) + 1);
                    json!({ "id": id, "idStr": id })
                }
                ApiEvent::ConnectionManagerExportIdentity if arg(2) == "alice" => {
                    json!({ "certificate": "CERT", "privateKey": "KEY" })
                }
                ApiEvent::ConnectionManagerRemoveIdentity => json!(arg(2) == "alice"),
                ApiEvent::BusinessNetworkCardStoreGet if arg(0) == ADMIN_CARD => admin_card(),
                ApiEvent::BusinessNetworkCardStoreGet => {
                    return Err(WireError::new(
                        ErrorKind::Error,
                        format!("Card not found: {}", arg(0)),
                    ));
                }
                ApiEvent::BusinessNetworkCardStoreHas | ApiEvent::BusinessNetworkCardStoreDelete => {
                    json!(arg(0) == ADMIN_CARD)
                }
                ApiEvent::BusinessNetworkCardStoreGetAll => json!({ ADMIN_CARD: admin_card() }),
                ApiEvent::ConnectionProfileStoreLoad if arg(0) == "hlfv1" => json!({ "type": "web" }),
                ApiEvent::ConnectionProfileStoreLoad => {
                    return Err(WireError::new(
                        ErrorKind::Error,
                        format!("Profile not found: {}", arg(0)),
                    ));
                }
                ApiEvent::ConnectionProfileStoreLoadAll => json!({ "hlfv1": { "type": "web" } }),
                _ => Value::Null,
            })
        })
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str, &[Value]) -> Result<Value, WireError> + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        let (dialer, mut listener) = memory_transport();
        let calls: CallLog = Arc::default();
        let sessions: Arc<Mutex<Vec<mpsc::Sender<Frame>>>> = Arc::default();
        let (kill, _) = watch::channel(0u64);

        let accept_calls = Arc::clone(&calls);
        let accept_sessions = Arc::clone(&sessions);
        let accept_kill = kill.subscribe();
        tokio::spawn(async move {
            while let Some(pipe) = listener.accept().await {
                accept_sessions.lock().push(pipe.outbound.clone());
                tokio::spawn(session(
                    pipe,
                    Arc::clone(&handler),
                    Arc::clone(&accept_calls),
                    accept_kill.clone(),
                ));
            }
        });

        Self {
            dialer,
            calls,
            sessions,
            kill,
        }
    }

    /// Arguments of every call made with `event`, in arrival order.
    pub fn calls_of(&self, event: ApiEvent) -> Vec<Vec<Value>> {
        self.calls
            .lock()
            .iter()
            .filter(|(name, _)| name == event.as_str())
            .map(|(_, args)| args.clone())
            .collect()
    }

    /// Push an event batch for `connection_id` on every open session.
    pub async fn push_events(&self, connection_id: &str, batch: Value) {
        let sessions: Vec<_> = self.sessions.lock().clone();
        for outbound in sessions {
            let _ = outbound
                .send(Frame::Push {
                    event: EVENTS.to_string(),
                    args: vec![json!(connection_id), batch.clone()],
                })
                .await;
        }
    }

    /// Hang up on every client.
    pub fn drop_sessions(&self) {
        self.sessions.lock().clear();
        self.kill.send_modify(|generation| *generation += 1);
    }
}

async fn session(
    mut pipe: FramePipe,
    handler: Handler,
    calls: CallLog,
    mut kill: watch::Receiver<u64>,
) {
    kill.borrow_and_update();
    loop {
        tokio::select! {
            frame = pipe.inbound.recv() => {
                let Some(frame) = frame else { break };
                let Frame::Request { id, event, args } = frame else { continue };
                calls.lock().push((event.clone(), args.clone()));
                let reply = match handler(&event, &args) {
                    Ok(result) => Frame::ok(id, result),
                    Err(error) => Frame::err(id, error),
                };
                if pipe.outbound.send(reply).await.is_err() {
                    break;
                }
            }
            _ = kill.changed() => break,
        }
    }
}

/// Holds every dial until `open` is called.
pub struct GatedDialer {
    inner: MemoryDialer,
    gate: Semaphore,
    dials: AtomicUsize,
}

impl GatedDialer {
    pub fn new(inner: MemoryDialer) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
            dials: AtomicUsize::new(0),
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dialer for GatedDialer {
    async fn dial(&self, url: &str) -> Result<FramePipe, TransportError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| TransportError::Closed)?;
        self.inner.dial(url).await
    }
}

/// Fails the first `failures` dials.
pub struct FlakyDialer {
    inner: MemoryDialer,
    remaining_failures: AtomicUsize,
}

impl FlakyDialer {
    pub fn new(inner: MemoryDialer, failures: usize) -> Self {
        Self {
            inner,
            remaining_failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl Dialer for FlakyDialer {
    async fn dial(&self, url: &str) -> Result<FramePipe, TransportError> {
        let failing = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TransportError::ConnectFailed {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        self.inner.dial(url).await
    }
}
