//! Actions dispatched from rendered components

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Opaque action payload
///
/// The renderer never looks inside; the executor behind the dispatcher
/// decides what it means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(pub Value);

impl Action {
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for Action {
    fn from(value: Value) -> Self {
        Action(value)
    }
}

/// Receiver of dispatched actions
pub trait ActionDispatcher: Send + Sync {
    fn dispatch(&self, action: Action);
}

impl<F> ActionDispatcher for F
where
    F: Fn(Action) + Send + Sync,
{
    fn dispatch(&self, action: Action) {
        self(action)
    }
}

/// Cloneable callback handed to every rendered component
#[derive(Clone)]
pub struct ActionHandle {
    dispatcher: Arc<dyn ActionDispatcher>,
}

impl ActionHandle {
    pub fn new(dispatcher: Arc<dyn ActionDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// A handle that drops every action
    pub fn noop() -> Self {
        Self::new(Arc::new(|_: Action| {}))
    }

    /// Forward an action unchanged
    pub fn dispatch(&self, action: Action) {
        self.dispatcher.dispatch(action);
    }
}

impl Default for ActionHandle {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for ActionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionHandle").finish_non_exhaustive()
    }
}
