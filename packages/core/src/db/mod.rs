//! Database Layer
//!
//! This module defines the two store capabilities the facades are built on,
//! the locations and queries that address them, and an in-memory
//! implementation of each:
//!
//! - [`DocumentBackend`] - keyed documents grouped in collections
//! - [`TreeBackend`] - one hierarchical key-value tree with a change feed
//! - [`MemoryDocumentStore`] / [`MemoryTreeStore`] - in-process backends for
//!   tests and local development
//!
//! # Architecture
//!
//! Backends speak only untyped [`Mapping`](crate::models::Mapping) /
//! `serde_json::Value` payloads and report raw [`BackendError`]s. Typing and
//! error classification happen in the service layer.

mod document_store;
mod error;
mod memory_document_store;
mod memory_tree_store;
pub mod paths;
pub mod query;
mod tree_store;

pub use document_store::{DocumentBackend, DocumentSnapshot};
pub use error::BackendError;
pub use memory_document_store::MemoryDocumentStore;
pub use memory_tree_store::MemoryTreeStore;
pub use paths::{CollectionPath, DocumentPath, TreePath};
pub use query::{
    DocumentQuery, Filter, FilterOperator, OrderClause, OrderDirection, TreeLimit, TreeOrder,
    TreeQuery,
};
pub use tree_store::{EventKind, TreeBackend, TreeEvent};
