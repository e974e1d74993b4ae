//! Action registry: action name to handler.
//!
//! The registry lives in memory only and is rebuilt by registration calls at
//! startup. Registering a name twice replaces the earlier handler.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use super::record::ActionData;

/// Handler outcome: the answer on success, the error payload on failure.
pub type HandlerResult = Result<Value, Value>;

/// Delivers one action to the remote side.
///
/// Handlers receive the action data with the `timestamp` field added and
/// must not touch the pile they are registered with.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, data: ActionData) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> ActionHandler for F
where
    F: Fn(ActionData) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, data: ActionData) -> HandlerResult {
        (self)(data).await
    }
}

/// Shared, cloneable registry.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: Arc<RwLock<HashMap<String, Arc<dyn ActionHandler>>>>,
}

impl ActionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `action_name`. Returns `true` if a previous
    /// handler was replaced.
    pub fn register<H>(&self, action_name: impl Into<String>, handler: H) -> bool
    where
        H: ActionHandler + 'static,
    {
        self.register_arc(action_name, Arc::new(handler))
    }

    /// Register an already shared handler.
    pub fn register_arc(
        &self,
        action_name: impl Into<String>,
        handler: Arc<dyn ActionHandler>,
    ) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(action_name.into(), handler)
            .is_some()
    }

    #[must_use]
    pub fn is_registered(&self, action_name: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(action_name)
    }

    /// Handler for `action_name`, if any.
    #[must_use]
    pub fn handler(&self, action_name: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(action_name)
            .cloned()
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}
