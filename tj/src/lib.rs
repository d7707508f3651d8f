//! TaskJournal - event-driven task tracker
//!
//! Players keep a journal of tasks (collect wood, buy seeds, give a gift,
//! upgrade a tool). Tasks advance on their own as the game raises events, can
//! renew weekly, monthly or annually, and are persisted per save and per
//! player in a keyed JSON data store.
//!
//! # Core Concepts
//!
//! - **Tasks**: a shared [`TaskCore`] plus kind-specific matching behind the [`Task`] trait
//! - **Ownership**: each player's [`TaskList`] owns its tasks' event subscriptions
//! - **Factories**: typed parameters with constraints build and edit tasks
//! - **Shared sessions**: broadcast channels mirror events to other participants
//!
//! # Modules
//!
//! - [`task`] - Task model and built-in kinds
//! - [`events`] - Channels, broadcast transport and event arguments
//! - [`factory`] - Task parameters, factories and the kind registry
//! - [`list`] - Per-owner task lists
//! - [`manager`] - Session lifecycle, persistence and the end-of-day sweep
//! - [`persistence`] - Stored record codec, including the legacy layout
//! - [`catalog`] - Game data lookups used by validation and pricing
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod catalog;
pub mod cli;
pub mod config;
pub mod date;
pub mod domain;
pub mod error;
pub mod events;
pub mod factory;
pub mod list;
pub mod manager;
pub mod persistence;
pub mod task;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, StaticCatalog};
pub use config::Config;
pub use date::{Period, Season, WorldDate};
pub use domain::{Building, FarmAnimal, Item, PlayerId};
pub use error::{JournalError, Result};
pub use events::{EventError, PeerHub, TaskEvents, Transport, WireMessage};
pub use factory::{FactoryError, ParamValue, SmartIcons, TaskFactory, TaskParameter, TaskRegistry};
pub use list::TaskList;
pub use manager::{DayEndReport, Session, TaskManager};
pub use persistence::{DecodeError, TaskData};
pub use task::{Task, TaskCore, TaskHandle, TaskState, TaskStatus};
