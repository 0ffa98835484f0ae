//! TreeBackend Trait - Tree Store Abstraction
//!
//! This module defines the capability a hierarchical key-value store must
//! offer to sit behind [`TreeService`](crate::services::TreeService):
//! path-addressed reads and writes, a shallow-merge primitive, and a change
//! feed per observed location.
//!
//! # Event Flow
//!
//! 1. A caller registers interest with [`TreeBackend::observe`]
//! 2. The store returns a broadcast receiver for that location and event kind
//! 3. Every matching change is published as a [`TreeEvent`]
//! 4. Dropping the receiver ends the observation

use crate::db::{BackendError, TreePath, TreeQuery};
use crate::models::Mapping;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Change categories reported by the tree store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// The whole value at the location
    Value,
    ChildAdded,
    ChildChanged,
    ChildRemoved,
    ChildMoved,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Value => "value",
            EventKind::ChildAdded => "child_added",
            EventKind::ChildChanged => "child_changed",
            EventKind::ChildRemoved => "child_removed",
            EventKind::ChildMoved => "child_moved",
        }
    }
}

/// One change notification
///
/// For `Value` events `key` is the observed location's key and `value` its
/// full current value (`Null` when empty). For child events `key` names the
/// child and `value` is its new value, or its last value when removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEvent {
    pub kind: EventKind,
    pub key: Option<String>,
    pub value: Value,
}

/// Abstraction over a remote hierarchical key-value store
#[async_trait]
pub trait TreeBackend: Send + Sync {
    /// Read the value at a location, with query clauses applied
    ///
    /// Missing locations read as `Value::Null`.
    async fn get_value(&self, query: &TreeQuery) -> Result<Value, BackendError>;

    /// Replace the whole subtree at `path`; `Null` removes it
    async fn set_value(&self, path: &TreePath, value: Value) -> Result<(), BackendError>;

    /// Shallow merge: each key in `children` (a relative path) is set
    /// independently, other children are left untouched
    async fn update_children(&self, path: &TreePath, children: Mapping)
        -> Result<(), BackendError>;

    /// Remove the subtree at `path`
    async fn remove_value(&self, path: &TreePath) -> Result<(), BackendError>;

    /// Register interest in `kind` events at `query`
    ///
    /// Registration is synchronous; events flow until the receiver is
    /// dropped or the store shuts down.
    fn observe(
        &self,
        query: &TreeQuery,
        kind: EventKind,
    ) -> Result<broadcast::Receiver<TreeEvent>, BackendError>;
}
