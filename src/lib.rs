//! offsync - an offline-first action queue
//!
//! Actions are registered by name with an async handler. Executing an action
//! while offline, or when its handler fails, stores it in a durable pile that
//! is replayed later with the action's original timestamp.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use offsync::features::sync::{ActionData, ActionPile, HandlerResult};
//! use offsync::network::NetworkSwitch;
//! use offsync::storage::MemoryStore;
//!
//! async fn deliver(data: ActionData) -> HandlerResult {
//!     Ok(serde_json::Value::Object(data))
//! }
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let pile = ActionPile::open(MemoryStore::new(), Arc::new(NetworkSwitch::offline()))?;
//! pile.register("send_form", deliver);
//!
//! // Offline: the action is queued.
//! assert!(pile.execute("send_form", ActionData::new()).await.is_err());
//! assert_eq!(pile.len().await, 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod network;
pub mod output;
pub mod storage;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::{ActionError, OffsyncError, StorageError};
pub use features::sync::{ActionPile, ActionRegistry};
