//! Offline action synchronization.
//!
//! Callers register a handler per action name, then ask the pile to execute
//! actions. When the network is down or the handler fails, the action is
//! persisted and replayed later with its original timestamp.
//!
//! Features:
//! - Direct execution with write-through deferral
//! - Concurrent replay of the whole pile with partial progress kept
//! - Purging by name and cleanup of records with no registered handler
//! - Optional de-duplication by content key

pub mod pile;
pub mod record;
pub mod registry;
pub mod replay;

pub use pile::{ActionPile, PileOptions, PileStats};
pub use record::{
    content_key, now_timestamp, timestamp_of, ActionData, ActionRecord, RecordState,
    TIMESTAMP_FIELD,
};
pub use registry::{ActionHandler, ActionRegistry, HandlerResult};
pub use replay::{format_replay_report, ActionAnswer, ReplayOutcome, ReplayReport};
