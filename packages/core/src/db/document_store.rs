//! DocumentBackend Trait - Document Store Abstraction
//!
//! This module defines the capability a document store must offer to sit
//! behind [`DocumentService`](crate::services::DocumentService): keyed
//! document fetch, write, merge and delete, plus collection queries.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: every call may cross a network boundary
//! 2. **Raw errors**: implementations report [`BackendError`]; the facade
//!    owns the mapping to the public taxonomy
//! 3. **Untyped payloads**: documents cross the boundary as [`Mapping`]

use crate::db::{BackendError, DocumentPath, DocumentQuery};
use crate::models::Mapping;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of reading one document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Document key (last path segment)
    pub id: String,

    /// Full document location
    pub path: DocumentPath,

    /// Document contents, `None` when the document does not exist
    pub data: Option<Mapping>,

    /// Last write time reported by the store, if known
    pub update_time: Option<DateTime<Utc>>,
}

impl DocumentSnapshot {
    pub fn new(path: DocumentPath, data: Option<Mapping>) -> Self {
        Self {
            id: path.key().to_string(),
            path,
            data,
            update_time: None,
        }
    }

    pub fn with_update_time(mut self, update_time: DateTime<Utc>) -> Self {
        self.update_time = Some(update_time);
        self
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }
}

/// Abstraction over a remote document database
///
/// Implementations must be `Send + Sync` so facades can be shared across
/// tasks.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Fetch a single document
    ///
    /// A missing document is not an error: the snapshot is returned with
    /// `data == None`.
    async fn get_document(&self, path: &DocumentPath) -> Result<DocumentSnapshot, BackendError>;

    /// Execute a collection query
    ///
    /// # Returns
    ///
    /// Matching documents in the order the store reports them. An empty
    /// collection yields an empty vector.
    async fn run_query(&self, query: &DocumentQuery) -> Result<Vec<DocumentSnapshot>, BackendError>;

    /// Replace the full contents of a document, creating it if needed
    async fn set_document(&self, path: &DocumentPath, data: Mapping) -> Result<(), BackendError>;

    /// Merge fields into a document, creating it if needed
    ///
    /// Nested maps are merged recursively; every other value replaces the
    /// stored one.
    async fn merge_document(&self, path: &DocumentPath, data: Mapping)
        -> Result<(), BackendError>;

    /// Remove a document; removing a missing document succeeds
    async fn delete_document(&self, path: &DocumentPath) -> Result<(), BackendError>;
}
