//! Broadcast channels and transports
//!
//! A [`NetChannel`] mirrors a local channel to the other participants of a
//! shared session. Outgoing events are mapped to a transport-safe message,
//! wrapped in a [`WireMessage`] tagged with the channel name and this mod's
//! id, and handed to a [`Transport`]. Transports never echo a message back to
//! its sender, so `broadcast` can raise the event locally as well.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace, warn};

use super::channel::{Channel, Subscription, Unsubscribe};
use super::error::{EventError, TransportError};

/// Event arguments that can cross the transport
pub trait NetEvent: Send + Sync + Sized + 'static {
    type Message: Serialize + DeserializeOwned;

    fn to_message(&self) -> Self::Message;

    fn from_message(message: Self::Message) -> Self;
}

/// Envelope delivered between participants
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub channel_name: String,
    pub sender_mod_id: String,
    pub payload: Value,
}

/// The host's inter-participant messaging facility
pub trait Transport: Send + Sync {
    /// Deliver `message` to every other participant
    fn send(&self, message: WireMessage) -> Result<(), TransportError>;
}

/// Transport for single-participant sessions; drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send(&self, message: WireMessage) -> Result<(), TransportError> {
        trace!(channel = %message.channel_name, "NullTransport::send: no peers");
        Ok(())
    }
}

struct Peer {
    id: usize,
    tx: UnboundedSender<WireMessage>,
}

/// In-process hub connecting several participants
///
/// Each participant joins once and gets a [`HubTransport`] for sending plus an
/// inbox receiver; messages go to every participant except the sender.
pub struct PeerHub {
    peers: Mutex<Vec<Peer>>,
    next_id: AtomicUsize,
}

impl PeerHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            peers: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(0),
        })
    }

    /// Join the hub as a new participant
    pub fn join(self: &Arc<Self>) -> (HubTransport, UnboundedReceiver<WireMessage>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.lock().push(Peer { id, tx });
        debug!(peer = id, "PeerHub::join: participant joined");
        (
            HubTransport {
                hub: Arc::clone(self),
                id,
            },
            rx,
        )
    }

    pub fn peer_count(&self) -> usize {
        self.peers.lock().len()
    }

    fn deliver(&self, from: usize, message: WireMessage) -> Result<(), TransportError> {
        let mut peers = self.peers.lock();
        let mut total = 0;
        let mut failed = 0;
        peers.retain(|peer| {
            if peer.id == from {
                return true;
            }
            total += 1;
            if peer.tx.send(message.clone()).is_err() {
                failed += 1;
                return false;
            }
            true
        });
        if failed > 0 {
            return Err(TransportError::Partial { failed, total });
        }
        Ok(())
    }

    fn leave(&self, id: usize) {
        self.peers.lock().retain(|peer| peer.id != id);
        debug!(peer = id, "PeerHub::leave: participant left");
    }
}

impl fmt::Debug for PeerHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerHub").field("peers", &self.peer_count()).finish()
    }
}

/// One participant's sending side of a [`PeerHub`]
#[derive(Debug)]
pub struct HubTransport {
    hub: Arc<PeerHub>,
    id: usize,
}

impl Transport for HubTransport {
    fn send(&self, message: WireMessage) -> Result<(), TransportError> {
        trace!(peer = self.id, channel = %message.channel_name, "HubTransport::send");
        self.hub.deliver(self.id, message)
    }
}

impl Drop for HubTransport {
    fn drop(&mut self) {
        self.hub.leave(self.id);
    }
}

/// A local channel mirrored across participants
pub struct NetChannel<A> {
    local: Channel<A>,
    mod_id: String,
    transport: Arc<dyn Transport>,
}

impl<A: NetEvent> NetChannel<A> {
    pub fn new(name: &'static str, mod_id: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            local: Channel::new(name),
            mod_id: mod_id.into(),
            transport,
        }
    }

    pub fn name(&self) -> &'static str {
        self.local.name()
    }

    /// The wrapped local channel
    pub fn local(&self) -> &Channel<A> {
        &self.local
    }

    pub fn add<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        self.local.add(listener)
    }

    pub fn remove(&self, subscription: Subscription) -> bool {
        self.local.remove(subscription)
    }

    pub fn has_listeners(&self) -> bool {
        self.local.has_listeners()
    }

    /// Raise on this participant only
    pub fn raise(&self, args: &A) {
        self.local.raise(args);
    }

    /// Send `args` to every other participant and optionally raise it here
    ///
    /// Sending is fire-and-forget: a transport failure is logged and the
    /// local raise still happens. Only a message that cannot be encoded is
    /// reported, and in that case nothing is sent or raised.
    pub fn broadcast(&self, args: &A, send_to_self: bool) -> Result<(), EventError> {
        let payload = serde_json::to_value(args.to_message()).map_err(|source| EventError::Encode {
            channel: self.name(),
            source,
        })?;
        let message = WireMessage {
            channel_name: self.name().to_string(),
            sender_mod_id: self.mod_id.clone(),
            payload,
        };

        debug!(channel = self.name(), send_to_self, "NetChannel::broadcast");
        if let Err(e) = self.transport.send(message) {
            warn!(channel = self.name(), error = %e, "NetChannel::broadcast: transport failed");
        }

        if send_to_self {
            self.local.raise(args);
        }
        Ok(())
    }

    /// Decode an inbound payload and raise it locally
    pub fn raise_from_payload(&self, payload: Value) -> Result<(), EventError> {
        let message: A::Message = serde_json::from_value(payload).map_err(|source| EventError::Decode {
            channel: self.name().to_string(),
            source,
        })?;
        self.local.raise(&A::from_message(message));
        Ok(())
    }
}

impl<A> fmt::Debug for NetChannel<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetChannel")
            .field("local", &self.local)
            .field("mod_id", &self.mod_id)
            .finish()
    }
}

/// Type-erased inbound side of a broadcast channel
pub trait Route: Unsubscribe {
    fn route(&self, payload: Value) -> Result<(), EventError>;
}

impl<A: NetEvent> Unsubscribe for NetChannel<A> {
    fn channel_name(&self) -> &'static str {
        self.name()
    }

    fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.remove(subscription)
    }
}

impl<A: NetEvent> Route for NetChannel<A> {
    fn route(&self, payload: Value) -> Result<(), EventError> {
        self.raise_from_payload(payload)
    }
}
