//! Local multicast channels

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::{debug, trace};

/// Unique id of one listener registration
pub type SubscriptionId = u64;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Token returned by [`Channel::add`], used to remove the listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    channel: &'static str,
    id: SubscriptionId,
}

impl Subscription {
    /// Name of the channel the listener was added to
    pub fn channel(&self) -> &'static str {
        self.channel
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

type Listener<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// Named, typed multicast channel
///
/// Listeners run in registration order. `raise` iterates over a snapshot of
/// the listener set, so a listener may add or remove listeners (including
/// itself) without affecting the dispatch in progress.
pub struct Channel<A> {
    name: &'static str,
    listeners: RwLock<Vec<(SubscriptionId, Listener<A>)>>,
    count: AtomicUsize,
}

impl<A: 'static> Channel<A> {
    pub fn new(name: &'static str) -> Self {
        debug!(name, "Channel::new: creating channel");
        Self {
            name,
            listeners: RwLock::new(Vec::new()),
            count: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register a listener
    pub fn add<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let id = NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed);
        let mut listeners = self.listeners.write();
        listeners.push((id, Arc::new(listener)));
        self.count.store(listeners.len(), Ordering::Release);
        trace!(channel = self.name, id, "Channel::add");
        Subscription {
            channel: self.name,
            id,
        }
    }

    /// Remove a listener; returns false if it was not registered here
    pub fn remove(&self, subscription: Subscription) -> bool {
        if subscription.channel != self.name {
            return false;
        }
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription.id);
        self.count.store(listeners.len(), Ordering::Release);
        let removed = listeners.len() != before;
        trace!(channel = self.name, id = subscription.id, removed, "Channel::remove");
        removed
    }

    /// Whether any listener is registered
    ///
    /// Callers check this before building an expensive payload.
    pub fn has_listeners(&self) -> bool {
        self.count.load(Ordering::Acquire) > 0
    }

    pub fn listener_count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Invoke every listener with `args`
    pub fn raise(&self, args: &A) {
        if !self.has_listeners() {
            return;
        }
        let snapshot: Vec<Listener<A>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        trace!(channel = self.name, listeners = snapshot.len(), "Channel::raise");
        for listener in snapshot {
            listener(args);
        }
    }
}

impl<A> fmt::Debug for Channel<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("listeners", &self.count.load(Ordering::Acquire))
            .finish()
    }
}

/// Type-erased view of a channel, enough to drop a subscription by name
pub trait Unsubscribe: Send + Sync {
    fn channel_name(&self) -> &'static str;

    fn unsubscribe(&self, subscription: Subscription) -> bool;
}

impl<A: 'static> Unsubscribe for Channel<A> {
    fn channel_name(&self) -> &'static str {
        self.name
    }

    fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.remove(subscription)
    }
}
