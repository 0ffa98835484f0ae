//! MemoryTreeStore - In-Process TreeBackend
//!
//! Holds the whole tree as one `serde_json::Value` and publishes change events
//! to registered observers over tokio broadcast channels.
//!
//! # Storage Rules
//!
//! - Writing `Null` removes a location
//! - Empty objects do not exist: a location whose last child is removed
//!   disappears, and so on up the tree
//!
//! # Event Rules
//!
//! - On registration a `Value` observer receives the current value and a
//!   `ChildAdded` observer receives one event per existing child
//! - After each write, observers whose (query-filtered) value changed receive
//!   child events first, then the `Value` event
//! - `ChildMoved` is never produced: the store keeps no priorities
//! - Observers whose receivers were dropped are pruned on the next write

use crate::config::{ServiceConfig, DEFAULT_EVENT_CHANNEL_CAPACITY};
use crate::db::{BackendError, EventKind, TreeBackend, TreeEvent, TreePath, TreeQuery};
use crate::models::Mapping;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

struct Observer {
    query: TreeQuery,
    kind: EventKind,
    tx: broadcast::Sender<TreeEvent>,
}

struct TreeState {
    root: Value,
    observers: Vec<Observer>,
    denied: Vec<TreePath>,
    offline: bool,
    writes: usize,
}

/// In-memory tree store
pub struct MemoryTreeStore {
    state: Mutex<TreeState>,
    channel_capacity: usize,
}

impl MemoryTreeStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CHANNEL_CAPACITY)
    }

    /// Store whose observer channels buffer `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(TreeState {
                root: Value::Null,
                observers: Vec::new(),
                denied: Vec::new(),
                offline: false,
                writes: 0,
            }),
            channel_capacity: capacity.max(1),
        }
    }

    /// Store using the channel capacity from `config`
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::with_capacity(config.event_channel_capacity)
    }

    /// Store seeded with an initial tree
    pub fn with_root(root: Value) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            state.root = normalize(root);
        }
        store
    }

    pub fn set_offline(&self, offline: bool) -> Result<(), BackendError> {
        self.lock()?.offline = offline;
        Ok(())
    }

    /// Reject writes at or below `path`
    pub fn deny_writes(&self, path: TreePath) -> Result<(), BackendError> {
        self.lock()?.denied.push(path);
        Ok(())
    }

    pub fn write_count(&self) -> Result<usize, BackendError> {
        Ok(self.lock()?.writes)
    }

    /// Number of live observers
    pub fn observer_count(&self) -> Result<usize, BackendError> {
        let mut state = self.lock()?;
        state.observers.retain(|o| o.tx.receiver_count() > 0);
        Ok(state.observers.len())
    }

    /// Raw value at `path`, bypassing the facade
    pub fn raw_value(&self, path: &TreePath) -> Result<Value, BackendError> {
        Ok(value_at(&self.lock()?.root, &path.segments()).clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, TreeState>, BackendError> {
        self.state
            .lock()
            .map_err(|_| BackendError::internal("Failed to acquire lock"))
    }

    fn checked(&self, path: &TreePath) -> Result<MutexGuard<'_, TreeState>, BackendError> {
        let state = self.lock()?;
        if state.offline {
            return Err(BackendError::unavailable("tree store is offline"));
        }
        if !path.is_valid() {
            return Err(BackendError::invalid_argument(format!(
                "invalid tree path: {}",
                path
            )));
        }
        Ok(state)
    }

    /// Apply `writes` (absolute path, value) atomically and notify observers
    fn write(&self, path: &TreePath, writes: Vec<(TreePath, Value)>) -> Result<(), BackendError> {
        let mut state = self.checked(path)?;
        if state.denied.iter().any(|d| path.starts_with(d)) {
            return Err(BackendError::permission_denied(format!(
                "writes to {} are not allowed",
                path
            )));
        }

        state.observers.retain(|o| o.tx.receiver_count() > 0);
        let before: Vec<Value> = state
            .observers
            .iter()
            .map(|o| o.query.apply(value_at(&state.root, &o.query.path().segments()).clone()))
            .collect();

        for (target, value) in writes {
            write_at(&mut state.root, &target.segments(), normalize(value));
        }
        state.writes += 1;

        for (observer, previous) in state.observers.iter().zip(before) {
            let current = observer
                .query
                .apply(value_at(&state.root, &observer.query.path().segments()).clone());
            if previous == current {
                continue;
            }
            for event in diff_events(observer, &previous, &current) {
                // No receivers left; pruned on the next write
                let _ = observer.tx.send(event);
            }
        }

        Ok(())
    }
}

impl Default for MemoryTreeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TreeBackend for MemoryTreeStore {
    async fn get_value(&self, query: &TreeQuery) -> Result<Value, BackendError> {
        let state = self.checked(query.path())?;
        let value = value_at(&state.root, &query.path().segments()).clone();
        Ok(query.apply(value))
    }

    async fn set_value(&self, path: &TreePath, value: Value) -> Result<(), BackendError> {
        self.write(path, vec![(path.clone(), value)])
    }

    async fn update_children(
        &self,
        path: &TreePath,
        children: Mapping,
    ) -> Result<(), BackendError> {
        let mut writes = Vec::with_capacity(children.len());
        for (relative, value) in children {
            let target = TreePath::new(format!("{}/{}", path.as_str(), relative));
            if relative.trim_matches('/').is_empty() || !target.is_valid() {
                return Err(BackendError::invalid_argument(format!(
                    "invalid child key: {}",
                    relative
                )));
            }
            writes.push((target, value));
        }
        self.write(path, writes)
    }

    async fn remove_value(&self, path: &TreePath) -> Result<(), BackendError> {
        self.write(path, vec![(path.clone(), Value::Null)])
    }

    fn observe(
        &self,
        query: &TreeQuery,
        kind: EventKind,
    ) -> Result<broadcast::Receiver<TreeEvent>, BackendError> {
        let mut state = self.checked(query.path())?;
        let current = query.apply(value_at(&state.root, &query.path().segments()).clone());

        let initial: Vec<TreeEvent> = match kind {
            EventKind::Value => vec![TreeEvent {
                kind,
                key: query.path().key().map(str::to_string),
                value: current,
            }],
            EventKind::ChildAdded => children_of(&current)
                .iter()
                .map(|(key, value)| TreeEvent {
                    kind,
                    key: Some(key.clone()),
                    value: value.clone(),
                })
                .collect(),
            _ => Vec::new(),
        };

        let (tx, rx) = broadcast::channel(self.channel_capacity.max(initial.len() + 1));
        for event in initial {
            let _ = tx.send(event);
        }

        tracing::debug!(
            "Registered {} observer at {}",
            kind.as_str(),
            query.path()
        );
        state.observers.push(Observer {
            query: query.clone(),
            kind,
            tx,
        });
        Ok(rx)
    }
}

fn diff_events(observer: &Observer, previous: &Value, current: &Value) -> Vec<TreeEvent> {
    let kind = observer.kind;
    let before = children_of(previous);
    let after = children_of(current);

    match kind {
        EventKind::Value => vec![TreeEvent {
            kind,
            key: observer.query.path().key().map(str::to_string),
            value: current.clone(),
        }],
        EventKind::ChildAdded => after
            .iter()
            .filter(|(key, _)| !before.contains_key(*key))
            .map(|(key, value)| child_event(kind, key, value))
            .collect(),
        EventKind::ChildRemoved => before
            .iter()
            .filter(|(key, _)| !after.contains_key(*key))
            .map(|(key, value)| child_event(kind, key, value))
            .collect(),
        EventKind::ChildChanged => after
            .iter()
            .filter(|(key, value)| before.get(*key).is_some_and(|old| old != *value))
            .map(|(key, value)| child_event(kind, key, value))
            .collect(),
        EventKind::ChildMoved => Vec::new(),
    }
}

fn child_event(kind: EventKind, key: &str, value: &Value) -> TreeEvent {
    TreeEvent {
        kind,
        key: Some(key.to_string()),
        value: value.clone(),
    }
}

fn children_of(value: &Value) -> Mapping {
    match value {
        Value::Object(map) => map.clone(),
        _ => Mapping::new(),
    }
}

static NULL: Value = Value::Null;

fn value_at<'a>(root: &'a Value, segments: &[&str]) -> &'a Value {
    let mut current = root;
    for segment in segments {
        match current.get(*segment) {
            Some(next) => current = next,
            None => return &NULL,
        }
    }
    current
}

/// Write `value` at `segments`, creating parents and pruning empty ones
fn write_at(node: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Mapping::new());
    }

    if let Value::Object(map) = node {
        let child = map.entry(head.to_string()).or_insert(Value::Null);
        write_at(child, rest, value);
        if child.is_null() {
            map.shift_remove(*head);
        }
        if map.is_empty() {
            *node = Value::Null;
        }
    }
}

/// Drop null children and empty objects
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Mapping = map
                .into_iter()
                .map(|(key, child)| (key, normalize(child)))
                .filter(|(_, child)| !child.is_null())
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Object(cleaned)
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(value: Value) -> Mapping {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_set_and_read_nested() {
        let store = MemoryTreeStore::new();
        store
            .set_value(&TreePath::new("users/u1"), json!({ "name": "Alice" }))
            .await
            .unwrap();

        let root = store.get_value(&TreeQuery::new(TreePath::root())).await.unwrap();
        assert_eq!(root, json!({ "users": { "u1": { "name": "Alice" } } }));

        let name = store
            .get_value(&TreeQuery::new(TreePath::new("users/u1/name")))
            .await
            .unwrap();
        assert_eq!(name, json!("Alice"));
    }

    #[tokio::test]
    async fn test_missing_location_reads_null() {
        let store = MemoryTreeStore::new();
        let value = store
            .get_value(&TreeQuery::new(TreePath::new("nothing/here")))
            .await
            .unwrap();
        assert!(value.is_null());
    }

    #[tokio::test]
    async fn test_update_children_is_shallow_merge() {
        let store = MemoryTreeStore::with_root(json!({
            "status": { "u1": { "online": false, "lastSeen": 123 } }
        }));
        let path = TreePath::new("status/u1");

        store
            .update_children(&path, mapping(json!({ "online": true })))
            .await
            .unwrap();
        assert_eq!(
            store.raw_value(&path).unwrap(),
            json!({ "online": true, "lastSeen": 123 })
        );
    }

    #[tokio::test]
    async fn test_update_children_accepts_relative_paths() {
        let store = MemoryTreeStore::new();
        store
            .update_children(
                &TreePath::root(),
                mapping(json!({ "a/b": 1, "c": { "d": 2 } })),
            )
            .await
            .unwrap();
        assert_eq!(
            store.raw_value(&TreePath::root()).unwrap(),
            json!({ "a": { "b": 1 }, "c": { "d": 2 } })
        );
    }

    #[tokio::test]
    async fn test_update_children_rejects_bad_keys() {
        let store = MemoryTreeStore::new();
        let result = store
            .update_children(&TreePath::new("a"), mapping(json!({ "b.c": 1 })))
            .await;
        assert!(matches!(result, Err(BackendError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_remove_prunes_empty_parents() {
        let store = MemoryTreeStore::with_root(json!({ "a": { "b": { "c": 1 } }, "x": 2 }));
        store.remove_value(&TreePath::new("a/b/c")).await.unwrap();
        assert_eq!(store.raw_value(&TreePath::root()).unwrap(), json!({ "x": 2 }));
    }

    #[tokio::test]
    async fn test_null_children_are_dropped_on_write() {
        let store = MemoryTreeStore::new();
        store
            .set_value(&TreePath::new("p"), json!({ "keep": 1, "gone": null, "empty": {} }))
            .await
            .unwrap();
        assert_eq!(store.raw_value(&TreePath::new("p")).unwrap(), json!({ "keep": 1 }));
    }

    #[tokio::test]
    async fn test_value_observer_gets_initial_and_changes() {
        let store = MemoryTreeStore::new();
        let query = TreeQuery::new(TreePath::new("counter"));
        let mut rx = store.observe(&query, EventKind::Value).unwrap();

        let initial = rx.recv().await.unwrap();
        assert_eq!(initial.value, Value::Null);
        assert_eq!(initial.key.as_deref(), Some("counter"));

        store.set_value(&TreePath::new("counter"), json!(1)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().value, json!(1));

        // Unrelated write does not notify
        store.set_value(&TreePath::new("other"), json!(true)).await.unwrap();
        store.set_value(&TreePath::new("counter"), json!(2)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().value, json!(2));
    }

    #[tokio::test]
    async fn test_child_events() {
        let store = MemoryTreeStore::with_root(json!({ "rooms": { "r1": { "n": 1 } } }));
        let query = TreeQuery::new(TreePath::new("rooms"));
        let mut added = store.observe(&query, EventKind::ChildAdded).unwrap();
        let mut changed = store.observe(&query, EventKind::ChildChanged).unwrap();
        let mut removed = store.observe(&query, EventKind::ChildRemoved).unwrap();

        assert_eq!(added.recv().await.unwrap().key.as_deref(), Some("r1"));

        store
            .set_value(&TreePath::new("rooms/r2"), json!({ "n": 2 }))
            .await
            .unwrap();
        let event = added.recv().await.unwrap();
        assert_eq!(event.key.as_deref(), Some("r2"));
        assert_eq!(event.value, json!({ "n": 2 }));

        store
            .set_value(&TreePath::new("rooms/r1/n"), json!(5))
            .await
            .unwrap();
        let event = changed.recv().await.unwrap();
        assert_eq!(event.key.as_deref(), Some("r1"));
        assert_eq!(event.value, json!({ "n": 5 }));

        store.remove_value(&TreePath::new("rooms/r2")).await.unwrap();
        let event = removed.recv().await.unwrap();
        assert_eq!(event.key.as_deref(), Some("r2"));
        assert_eq!(event.value, json!({ "n": 2 }));
    }

    #[tokio::test]
    async fn test_dropped_receivers_are_pruned() {
        let store = MemoryTreeStore::new();
        let query = TreeQuery::new(TreePath::new("a"));
        let rx = store.observe(&query, EventKind::Value).unwrap();
        assert_eq!(store.observer_count().unwrap(), 1);
        drop(rx);
        assert_eq!(store.observer_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_denied_and_offline() {
        let store = MemoryTreeStore::new();
        store.deny_writes(TreePath::new("locked")).unwrap();
        let result = store.set_value(&TreePath::new("locked/x"), json!(1)).await;
        assert!(matches!(result, Err(BackendError::PermissionDenied(_))));

        store.set_offline(true).unwrap();
        let result = store.get_value(&TreeQuery::new(TreePath::root())).await;
        assert!(matches!(result, Err(BackendError::Unavailable(_))));
    }
}
