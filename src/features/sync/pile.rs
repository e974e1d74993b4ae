//! The action pile: a durable FIFO of actions waiting to be delivered.
//!
//! The in-memory record list is the authority. Every mutation computes the
//! new list, rewrites the whole serialized pile to storage and only then
//! replaces the in-memory list, all under one lock. A failed write leaves
//! both sides unchanged.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::record::{now_timestamp, with_timestamp, ActionData, ActionRecord, RecordState};
use super::registry::{ActionHandler, ActionRegistry};
use super::replay::{ActionAnswer, ReplayOutcome, ReplayReport};
use crate::config::Config;
use crate::error::{ActionError, StorageError};
use crate::network::{NetworkOracle, NetworkState};
use crate::storage::KeyValueStore;

/// Where and how the pile is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PileOptions {
    pub namespace: String,
    pub key: String,
    /// Skip appending a record whose content key is already in the pile.
    pub dedupe: bool,
}

impl Default for PileOptions {
    fn default() -> Self {
        Self {
            namespace: "offline-sync".to_string(),
            key: "actions_data".to_string(),
            dedupe: false,
        }
    }
}

impl From<&Config> for PileOptions {
    fn from(config: &Config) -> Self {
        Self {
            namespace: config.storage.namespace.clone(),
            key: config.storage.key.clone(),
            dedupe: config.sync.dedupe,
        }
    }
}

/// Pile summary.
#[derive(Debug, Clone, Serialize)]
pub struct PileStats {
    /// Records in the pile.
    pub pending: usize,
    /// Records whose replay is running.
    pub replaying: usize,
    /// Timestamp of the oldest record.
    pub oldest: Option<DateTime<Utc>>,
    /// Record count per action name.
    pub by_action: BTreeMap<String, usize>,
}

struct PileState {
    records: Vec<ActionRecord>,
    in_flight: HashSet<String>,
    store: Box<dyn KeyValueStore>,
}

impl PileState {
    /// Persist `records`, then make them the in-memory pile.
    fn commit(
        &mut self,
        records: Vec<ActionRecord>,
        options: &PileOptions,
    ) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(&records).map_err(StorageError::Serialize)?;
        if let Err(e) = self.store.set(&options.namespace, &options.key, &serialized) {
            warn!(error = %e, "failed to persist action pile");
            return Err(e);
        }
        self.records = records;
        Ok(())
    }
}

/// Durable action queue.
pub struct ActionPile {
    registry: ActionRegistry,
    network: Arc<dyn NetworkOracle>,
    options: PileOptions,
    state: Mutex<PileState>,
}

impl ActionPile {
    /// Load the pile from `store` with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored pile cannot be read or is corrupt.
    pub fn open<S>(store: S, network: Arc<dyn NetworkOracle>) -> Result<Self, StorageError>
    where
        S: KeyValueStore + 'static,
    {
        Self::open_with_options(store, network, PileOptions::default())
    }

    /// Load the pile from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored pile cannot be read or is corrupt.
    pub fn open_with_options<S>(
        store: S,
        network: Arc<dyn NetworkOracle>,
        options: PileOptions,
    ) -> Result<Self, StorageError>
    where
        S: KeyValueStore + 'static,
    {
        let records = load_records(&store, &options)?;
        debug!(
            count = records.len(),
            namespace = %options.namespace,
            key = %options.key,
            "loaded action pile"
        );

        Ok(Self {
            registry: ActionRegistry::new(),
            network,
            options,
            state: Mutex::new(PileState {
                records,
                in_flight: HashSet::new(),
                store: Box::new(store),
            }),
        })
    }

    /// The registry handlers are looked up in.
    #[must_use]
    pub const fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn options(&self) -> &PileOptions {
        &self.options
    }

    /// Register `handler` under `action_name`, replacing any previous one.
    pub fn register<H>(&self, action_name: impl Into<String>, handler: H)
    where
        H: ActionHandler + 'static,
    {
        self.registry.register(action_name, handler);
    }

    #[must_use]
    pub fn is_registered(&self, action_name: &str) -> bool {
        self.registry.is_registered(action_name)
    }

    /// Current answer of the network oracle.
    #[must_use]
    pub fn network_state(&self) -> NetworkState {
        self.network.network_state()
    }

    /// Attempt a fresh action now, deferring it to the pile on failure.
    ///
    /// # Errors
    ///
    /// See [`ActionPile::execute_action`].
    pub async fn execute(
        &self,
        action_name: &str,
        data: ActionData,
    ) -> Result<ActionAnswer, ActionError> {
        self.execute_action(action_name, data, None).await
    }

    /// Execute `action_name` with `data`.
    ///
    /// Without `record_id` this is a fresh attempt: when offline, or when
    /// the handler fails, a record is appended to the pile. With `record_id`
    /// it replays that stored record using its original timestamp, removing
    /// it on success and leaving it untouched on failure.
    ///
    /// # Errors
    ///
    /// - `NotRegistered` if no handler exists; nothing is stored.
    /// - `Offline` if the oracle reports offline.
    /// - `Failed` if the handler rejected the action.
    /// - `RecordNotFound` if `record_id` is not in the pile.
    /// - `RecordBusy` if `record_id` is already being replayed.
    /// - `Storage` if the pile could not be persisted.
    pub async fn execute_action(
        &self,
        action_name: &str,
        data: ActionData,
        record_id: Option<&str>,
    ) -> Result<ActionAnswer, ActionError> {
        let Some(handler) = self.registry.handler(action_name) else {
            return Err(ActionError::NotRegistered(action_name.to_string()));
        };

        match record_id {
            None => self.run_direct(handler, action_name, data).await,
            Some(id) => {
                let timestamp = self.claim(id).await?;
                self.replay_claimed(handler, data, id, timestamp).await
            }
        }
    }

    async fn run_direct(
        &self,
        handler: Arc<dyn ActionHandler>,
        action_name: &str,
        data: ActionData,
    ) -> Result<ActionAnswer, ActionError> {
        let timestamp = now_timestamp();

        if !self.network_state().is_online() {
            let queued = self.append(action_name, data, timestamp).await?;
            return Err(ActionError::Offline {
                queued: Some(queued),
            });
        }

        match handler.handle(with_timestamp(&data, timestamp)).await {
            Ok(answer) => Ok(ActionAnswer { data: answer }),
            Err(error) => {
                debug!(action = action_name, "handler failed, deferring to pile");
                let queued = self.append(action_name, data, timestamp).await?;
                Err(ActionError::Failed {
                    data: error,
                    queued: Some(queued),
                })
            }
        }
    }

    async fn run_replay(
        &self,
        handler: Arc<dyn ActionHandler>,
        data: ActionData,
        record_id: &str,
        timestamp: i64,
    ) -> Result<ActionAnswer, ActionError> {
        if !self.network_state().is_online() {
            return Err(ActionError::Offline { queued: None });
        }

        match handler.handle(with_timestamp(&data, timestamp)).await {
            Ok(answer) => {
                self.remove_record(record_id).await?;
                Ok(ActionAnswer { data: answer })
            }
            Err(error) => Err(ActionError::Failed {
                data: error,
                queued: None,
            }),
        }
    }

    /// Mark `record_id` as replaying and return its stored timestamp.
    async fn claim(&self, record_id: &str) -> Result<i64, ActionError> {
        let mut state = self.state.lock().await;
        let timestamp = state
            .records
            .iter()
            .find(|r| r.id == record_id)
            .map(|r| r.timestamp)
            .ok_or_else(|| ActionError::RecordNotFound(record_id.to_string()))?;
        if !state.in_flight.insert(record_id.to_string()) {
            return Err(ActionError::RecordBusy(record_id.to_string()));
        }
        Ok(timestamp)
    }

    /// Replay a record the caller has claimed, then release the claim.
    async fn replay_claimed(
        &self,
        handler: Arc<dyn ActionHandler>,
        data: ActionData,
        record_id: &str,
        timestamp: i64,
    ) -> Result<ActionAnswer, ActionError> {
        let still_queued = self
            .state
            .lock()
            .await
            .records
            .iter()
            .any(|r| r.id == record_id);

        let result = if still_queued {
            self.run_replay(handler, data, record_id, timestamp).await
        } else {
            Err(ActionError::RecordNotFound(record_id.to_string()))
        };

        self.state.lock().await.in_flight.remove(record_id);
        result
    }

    /// Append a record for `action_name` without attempting it.
    ///
    /// Returns the id of the new record, or of the already queued record
    /// with the same content when de-duplication is enabled.
    ///
    /// # Errors
    ///
    /// Returns `NotRegistered` for unknown actions and `Storage` if the pile
    /// could not be persisted.
    pub async fn enqueue_action(
        &self,
        action_name: &str,
        data: ActionData,
    ) -> Result<String, ActionError> {
        if !self.is_registered(action_name) {
            return Err(ActionError::NotRegistered(action_name.to_string()));
        }
        self.append(action_name, data, now_timestamp()).await
    }

    async fn append(
        &self,
        action_name: &str,
        data: ActionData,
        timestamp: i64,
    ) -> Result<String, ActionError> {
        let record = ActionRecord::new(action_name, data, timestamp);
        let mut state = self.state.lock().await;

        if self.options.dedupe {
            if let Some(existing) = state
                .records
                .iter()
                .find(|r| r.content_key == record.content_key)
            {
                debug!(action = action_name, id = %existing.id, "identical action already queued");
                return Ok(existing.id.clone());
            }
        }

        let id = record.id.clone();
        let mut records = state.records.clone();
        records.push(record);
        state.commit(records, &self.options)?;

        debug!(action = action_name, %id, pending = state.records.len(), "queued action");
        Ok(id)
    }

    async fn remove_record(&self, record_id: &str) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;

        let Some(index) = state.records.iter().position(|r| r.id == record_id) else {
            // Purged while replaying.
            return Ok(());
        };

        let mut records = state.records.clone();
        records.remove(index);
        state.commit(records, &self.options)?;

        debug!(id = record_id, pending = state.records.len(), "delivered queued action");
        Ok(())
    }

    /// Replay every stored record whose action is registered, concurrently.
    ///
    /// Records already being replayed are skipped. Delivered records are
    /// removed as each replay completes. `processed_something` is false only
    /// for an empty pile.
    pub async fn replay_pile(&self) -> ReplayReport {
        let (batch, pile_was_empty) = {
            let mut state = self.state.lock().await;
            let batch: Vec<ActionRecord> = state
                .records
                .iter()
                .filter(|r| {
                    self.registry.is_registered(&r.action_name) && !state.in_flight.contains(&r.id)
                })
                .cloned()
                .collect();
            for record in &batch {
                state.in_flight.insert(record.id.clone());
            }
            (batch, state.records.is_empty())
        };

        if batch.is_empty() {
            let mut report = ReplayReport::empty();
            report.processed_something = !pile_was_empty;
            return report;
        }

        let launched = batch.len();
        let outcomes = join_all(batch.into_iter().map(|record| async move {
            let result = match self.registry.handler(&record.action_name) {
                Some(handler) => {
                    self.replay_claimed(handler, record.action_data, &record.id, record.timestamp)
                        .await
                }
                None => {
                    self.state.lock().await.in_flight.remove(&record.id);
                    Err(ActionError::NotRegistered(record.action_name.clone()))
                }
            };
            ReplayOutcome {
                record_id: record.id,
                action_name: record.action_name,
                result,
            }
        }))
        .await;

        let report: ReplayReport = outcomes.into_iter().collect();
        info!(
            launched,
            delivered = report.delivered,
            failed = report.failed,
            "replayed action pile"
        );
        report
    }

    /// Replay the pile; succeeds only if every launched replay succeeded.
    ///
    /// Delivered records stay removed even when this returns an error.
    ///
    /// # Errors
    ///
    /// Returns the first replay failure in pile order.
    pub async fn process_actions_pile(&self) -> Result<ReplayReport, ActionError> {
        self.replay_pile().await.into_result()
    }

    /// Remove every record named `action_name`, then every record whose
    /// action is no longer registered. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the pile could not be persisted.
    pub async fn remove_action_by_name_from_pile(
        &self,
        action_name: &str,
    ) -> Result<usize, ActionError> {
        let removed = self
            .retain(|r| r.action_name != action_name && self.registry.is_registered(&r.action_name))
            .await?;
        info!(action = action_name, removed, "purged actions from pile");
        Ok(removed)
    }

    /// Remove records whose action is no longer registered.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the pile could not be persisted.
    pub async fn clean_pile(&self) -> Result<usize, ActionError> {
        let removed = self
            .retain(|r| self.registry.is_registered(&r.action_name))
            .await?;
        if removed > 0 {
            info!(removed, "removed orphaned actions from pile");
        }
        Ok(removed)
    }

    async fn retain<F>(&self, keep: F) -> Result<usize, StorageError>
    where
        F: Fn(&ActionRecord) -> bool,
    {
        let mut state = self.state.lock().await;
        let records: Vec<ActionRecord> = state.records.iter().filter(|r| keep(r)).cloned().collect();
        let removed = state.records.len() - records.len();

        if removed > 0 {
            state.commit(records, &self.options)?;
        }
        Ok(removed)
    }

    /// Number of records in the pile.
    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of the stored records, in order.
    pub async fn records(&self) -> Vec<ActionRecord> {
        self.state.lock().await.records.clone()
    }

    /// Snapshot of the records' data payloads, in order.
    pub async fn data(&self) -> Vec<ActionData> {
        self.state
            .lock()
            .await
            .records
            .iter()
            .map(|r| r.action_data.clone())
            .collect()
    }

    /// State of a stored record, `None` if it is not in the pile.
    pub async fn record_state(&self, record_id: &str) -> Option<RecordState> {
        let state = self.state.lock().await;
        state.records.iter().find(|r| r.id == record_id)?;
        if state.in_flight.contains(record_id) {
            Some(RecordState::Replaying)
        } else {
            Some(RecordState::Pending)
        }
    }

    pub async fn stats(&self) -> PileStats {
        let state = self.state.lock().await;
        let mut by_action = BTreeMap::new();
        for record in &state.records {
            *by_action.entry(record.action_name.clone()).or_insert(0) += 1;
        }

        PileStats {
            pending: state.records.len(),
            replaying: state.in_flight.len(),
            oldest: state
                .records
                .iter()
                .map(|r| r.timestamp)
                .min()
                .and_then(|t| DateTime::from_timestamp(t, 0)),
            by_action,
        }
    }
}

impl std::fmt::Debug for ActionPile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionPile")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn load_records(
    store: &dyn KeyValueStore,
    options: &PileOptions,
) -> Result<Vec<ActionRecord>, StorageError> {
    let Some(raw) = store.get(&options.namespace, &options.key)? else {
        return Ok(Vec::new());
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries: Vec<Option<ActionRecord>> =
        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            namespace: options.namespace.clone(),
            key: options.key.clone(),
            source,
        })?;

    let total = entries.len();
    let records: Vec<ActionRecord> = entries.into_iter().flatten().collect();
    if records.len() < total {
        warn!(
            skipped = total - records.len(),
            "skipped empty entries in stored action pile"
        );
    }
    Ok(records)
}
