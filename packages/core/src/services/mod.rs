//! Facade Services
//!
//! This module contains the typed facades callers use instead of talking to
//! a backend directly:
//!
//! - `DocumentService` - fetch, query and mutate documents
//! - `TreeService` - fetch, mutate and subscribe to tree locations
//! - `StoreError` - the closed error taxonomy every facade call reports
//!
//! Each facade call maps to at most one backend call. There is no retry,
//! caching or shared mutable state at this layer.

pub mod document_service;
pub mod error;
mod subscription;
pub mod tree_service;

pub use document_service::DocumentService;
pub use error::{StoreError, StoreResult};
pub use subscription::Subscription;
pub use tree_service::TreeService;
