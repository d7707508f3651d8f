//! Event bus connecting host hooks to tasks
//!
//! Host hooks raise typed events on the channels of a [`TaskEvents`]. Task
//! lists subscribe each task's handlers to the channels the task declares.
//! Broadcast channels additionally mirror events to the other participants
//! of a shared session through a [`Transport`].
//!
//! # Architecture
//!
//! ```text
//!   host hooks                          other participants
//!       │                                      ▲     │
//!       ▼                                      │     │ WireMessage
//! ┌──────────────────────────────────────┐     │     ▼
//! │              TaskEvents              │  Transport ──▶ inbox
//! │                                      │     ▲            │
//! │  Channel<A>      NetChannel<A> ──────┼─────┘            │
//! │     │                 │  ◀───────────┼── receive/pump ◀─┘
//! └─────┼─────────────────┼──────────────┘
//!       ▼                 ▼
//!   task handlers (subscribed by TaskList)
//!       │
//!       ▼
//!   task-status-changed, task-list-changed
//! ```

mod bus;
mod channel;
mod error;
mod net;
mod types;

pub use bus::{Channels, TaskEvents, names};
pub use channel::{Channel, Subscription, SubscriptionId, Unsubscribe};
pub use error::{EventError, TransportError};
pub use net::{HubTransport, NetChannel, NetEvent, NullTransport, PeerHub, Route, Transport, WireMessage};
pub use types::{
    BuildingConstructed, BuildingConstructedMessage, FarmAnimalTraded, InventoryChanged, ItemGifted, ItemReceived,
    SalablePurchased, SalableSold, TaskListChanged, TaskStatusChanged,
};
