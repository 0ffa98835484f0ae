//! MemoryDocumentStore - In-Process DocumentBackend
//!
//! Keeps documents in a `BTreeMap` keyed by path. Used by tests, benchmarks
//! and local development in place of a remote document database.
//!
//! Besides plain storage it can simulate the two failure modes callers most
//! often need to exercise:
//!
//! - **Offline**: every call fails with [`BackendError::Unavailable`]
//! - **Write rules**: writes under a denied collection fail with
//!   [`BackendError::PermissionDenied`]

use crate::db::{
    BackendError, CollectionPath, DocumentBackend, DocumentPath, DocumentQuery, DocumentSnapshot,
};
use crate::models::Mapping;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct StoredDocument {
    data: Mapping,
    update_time: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct DocumentState {
    documents: BTreeMap<String, StoredDocument>,
    denied_collections: Vec<CollectionPath>,
    offline: bool,
    writes: usize,
}

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    state: Mutex<DocumentState>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with documents
    pub fn with_documents(documents: impl IntoIterator<Item = (DocumentPath, Mapping)>) -> Self {
        let now = Utc::now();
        let documents = documents
            .into_iter()
            .map(|(path, data)| {
                (
                    path.as_str().to_string(),
                    StoredDocument {
                        data,
                        update_time: now,
                    },
                )
            })
            .collect();

        Self {
            state: Mutex::new(DocumentState {
                documents,
                ..Default::default()
            }),
        }
    }

    /// Simulate losing (or regaining) the connection
    pub fn set_offline(&self, offline: bool) -> Result<(), BackendError> {
        self.lock()?.offline = offline;
        Ok(())
    }

    /// Reject writes to documents in `collection`
    pub fn deny_writes(&self, collection: CollectionPath) -> Result<(), BackendError> {
        self.lock()?.denied_collections.push(collection);
        Ok(())
    }

    /// Number of successful writes and deletes so far
    pub fn write_count(&self) -> Result<usize, BackendError> {
        Ok(self.lock()?.writes)
    }

    /// Raw contents of a document, bypassing the facade
    pub fn raw_document(&self, path: &DocumentPath) -> Result<Option<Mapping>, BackendError> {
        Ok(self
            .lock()?
            .documents
            .get(path.as_str())
            .map(|doc| doc.data.clone()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, DocumentState>, BackendError> {
        self.state
            .lock()
            .map_err(|_| BackendError::internal("Failed to acquire lock"))
    }

    /// Lock for a read, checking connectivity and path shape
    fn read_state(&self, path: &DocumentPath) -> Result<MutexGuard<'_, DocumentState>, BackendError> {
        let state = self.lock()?;
        if state.offline {
            return Err(BackendError::unavailable("document store is offline"));
        }
        if !path.is_valid() {
            return Err(BackendError::invalid_argument(format!(
                "not a document path: {}",
                path
            )));
        }
        Ok(state)
    }

    /// Lock for a write, additionally enforcing write rules
    fn write_state(
        &self,
        path: &DocumentPath,
    ) -> Result<MutexGuard<'_, DocumentState>, BackendError> {
        let state = self.read_state(path)?;
        let parent = path.parent();
        if state.denied_collections.iter().any(|c| *c == parent) {
            return Err(BackendError::permission_denied(format!(
                "writes to {} are not allowed",
                parent
            )));
        }
        Ok(state)
    }
}

#[async_trait]
impl DocumentBackend for MemoryDocumentStore {
    async fn get_document(&self, path: &DocumentPath) -> Result<DocumentSnapshot, BackendError> {
        let state = self.read_state(path)?;
        let snapshot = match state.documents.get(path.as_str()) {
            Some(doc) => DocumentSnapshot::new(path.clone(), Some(doc.data.clone()))
                .with_update_time(doc.update_time),
            None => DocumentSnapshot::new(path.clone(), None),
        };
        Ok(snapshot)
    }

    async fn run_query(&self, query: &DocumentQuery) -> Result<Vec<DocumentSnapshot>, BackendError> {
        let state = self.lock()?;
        if state.offline {
            return Err(BackendError::unavailable("document store is offline"));
        }
        if !query.collection().is_valid() {
            return Err(BackendError::invalid_argument(format!(
                "not a collection path: {}",
                query.collection()
            )));
        }

        let documents: Vec<DocumentSnapshot> = state
            .documents
            .iter()
            .filter_map(|(key, doc)| {
                let path = DocumentPath::new(key.as_str());
                (path.parent() == *query.collection()).then(|| {
                    DocumentSnapshot::new(path, Some(doc.data.clone()))
                        .with_update_time(doc.update_time)
                })
            })
            .collect();
        drop(state);

        Ok(query.apply(documents))
    }

    async fn set_document(&self, path: &DocumentPath, data: Mapping) -> Result<(), BackendError> {
        let mut state = self.write_state(path)?;
        state.documents.insert(
            path.as_str().to_string(),
            StoredDocument {
                data,
                update_time: Utc::now(),
            },
        );
        state.writes += 1;
        Ok(())
    }

    async fn merge_document(&self, path: &DocumentPath, data: Mapping) -> Result<(), BackendError> {
        let mut state = self.write_state(path)?;
        let entry = state
            .documents
            .entry(path.as_str().to_string())
            .or_insert_with(|| StoredDocument {
                data: Mapping::new(),
                update_time: Utc::now(),
            });
        deep_merge(&mut entry.data, data);
        entry.update_time = Utc::now();
        state.writes += 1;
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<(), BackendError> {
        let mut state = self.write_state(path)?;
        state.documents.remove(path.as_str());
        state.writes += 1;
        Ok(())
    }
}

fn deep_merge(target: &mut Mapping, incoming: Mapping) {
    for (key, value) in incoming {
        match value {
            Value::Object(nested) if target.get(&key).is_some_and(Value::is_object) => {
                if let Some(Value::Object(existing)) = target.get_mut(&key) {
                    deep_merge(existing, nested);
                }
            }
            other => {
                target.insert(key, other);
            }
        }
    }
}
