//! BaseKit Core
//!
//! Typed facades over backend-as-a-service databases: a document store
//! (collections of keyed documents) and a tree store (one hierarchical
//! key-value tree with a change feed).
//!
//! # Architecture
//!
//! - **Capability traits**: stores are reached only through
//!   [`db::DocumentBackend`] and [`db::TreeBackend`]
//! - **Typed models**: records implement [`models::Model`] and cross the
//!   boundary as generic JSON mappings
//! - **Closed errors**: every facade failure is one [`StoreError`] kind
//!
//! # Modules
//!
//! - [`models`] - Model contract and data converter
//! - [`endpoints`] - Request descriptors (target + operation)
//! - [`services`] - `DocumentService`, `TreeService`, error taxonomy
//! - [`db`] - Backend traits, paths, queries, in-memory backends
//! - [`config`] - Facade configuration

pub mod config;
pub mod db;
pub mod endpoints;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::{ServiceConfig, UpdateMode};
pub use endpoints::*;
pub use models::{Mapping, Model};
pub use services::*;
