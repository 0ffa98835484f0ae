//! DocumentService - Typed Facade over a DocumentBackend
//!
//! Resolves a [`DocumentEndpoint`], performs exactly one backend call, and
//! converts the payload through the data converter. Every failure leaves as a
//! [`StoreError`].
//!
//! # Failure Kinds
//!
//! | Call        | Target not resolvable | Wrong operation         | Backend failure |
//! |-------------|-----------------------|-------------------------|-----------------|
//! | `fetch`     | `DocumentNotFound`    | `InvalidRequest`        | `InvalidPath`   |
//! | `fetch_all` | `CollectionNotFound`  | `OperationNotSupported` | mapped          |
//! | `execute`   | `DocumentNotFound`    | `OperationNotSupported` | mapped          |
//!
//! "mapped" is the uniform `From<BackendError>` conversion.
//!
//! # Examples
//!
//! ```rust,no_run
//! use basekit_core::db::{CollectionPath, MemoryDocumentStore};
//! use basekit_core::endpoints::DocumentRequest;
//! use basekit_core::services::DocumentService;
//! # use basekit_core::models::Model;
//! # use serde::{Deserialize, Serialize};
//! # #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
//! # struct User { id: String, name: String }
//! # impl Model for User {
//! #     fn id(&self) -> &str { &self.id }
//! #     fn set_id(&mut self, id: String) { self.id = id; }
//! # }
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = DocumentService::new(Arc::new(MemoryDocumentStore::new()));
//!
//!     let path = CollectionPath::new("users").new_document();
//!     let user = User { id: String::new(), name: "Alice".to_string() };
//!     service.execute(&DocumentRequest::create(path.clone(), user)).await?;
//!
//!     let stored: User = service.fetch(&DocumentRequest::get(path)).await?;
//!     println!("Created user {}", stored.id);
//!     Ok(())
//! }
//! ```

use crate::config::{ServiceConfig, UpdateMode};
use crate::db::{DocumentBackend, DocumentPath, DocumentQuery};
use crate::endpoints::{DocumentEndpoint, DocumentTarget, Operation};
use crate::models::{converter, Mapping, Model};
use crate::services::{StoreError, StoreResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Document-store facade
pub struct DocumentService<B: DocumentBackend + ?Sized> {
    backend: Arc<B>,
    config: ServiceConfig,
}

impl<B: DocumentBackend + ?Sized> Clone for DocumentService<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            config: self.config.clone(),
        }
    }
}

impl<B: DocumentBackend + ?Sized> DocumentService<B> {
    /// Create a facade with the default configuration
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_config(backend, ServiceConfig::default())
    }

    pub fn with_config(backend: Arc<B>, config: ServiceConfig) -> Self {
        Self { backend, config }
    }

    /// Underlying backend, for calls the facade does not wrap
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Fetch a single document and decode it into `M`
    ///
    /// # Errors
    ///
    /// - `DocumentNotFound` if the target is not a valid document path
    /// - `InvalidRequest` for any operation other than `Read`
    /// - `InvalidPath` if the backend fetch fails
    /// - `ParseError` if the document has no data or does not decode
    pub async fn fetch<M, E>(&self, endpoint: &E) -> StoreResult<M>
    where
        M: Model,
        E: DocumentEndpoint<M> + ?Sized,
    {
        let target = endpoint.target();
        let path = resolve_document(&target)?;
        let operation = endpoint.operation();
        debug!("Document {} at {}", operation.name(), path);

        if !operation.is_read() {
            return Err(StoreError::InvalidRequest);
        }

        let snapshot = self.backend.get_document(path).await.map_err(|e| {
            warn!("Fetching {} failed: {}", path, e);
            StoreError::InvalidPath
        })?;

        let data = snapshot.data.ok_or_else(|| {
            debug!("Document {} has no data", path);
            StoreError::ParseError
        })?;

        converter::decode_mapping(data)
    }

    /// Run a query and decode every document into `M`
    ///
    /// Results keep the backend's order. One undecodable document fails the
    /// whole call; an empty result is an empty vector.
    ///
    /// # Errors
    ///
    /// - `CollectionNotFound` if the target is not a query over a valid
    ///   collection
    /// - `InvalidQuery` if the query clauses are malformed
    /// - `OperationNotSupported` for any operation other than `Read`
    /// - `ParseError` if any document does not decode
    pub async fn fetch_all<M, E>(&self, endpoint: &E) -> StoreResult<Vec<M>>
    where
        M: Model,
        E: DocumentEndpoint<M> + ?Sized,
    {
        let target = endpoint.target();
        let query = resolve_query(&target)?;
        let operation = endpoint.operation();
        debug!("Collection {} at {}", operation.name(), query.collection());

        if !operation.is_read() {
            return Err(StoreError::OperationNotSupported);
        }

        let snapshots = self.backend.run_query(query).await.map_err(|e| {
            warn!("Query on {} failed: {}", query.collection(), e);
            StoreError::from(e)
        })?;

        snapshots
            .into_iter()
            .map(|snapshot| {
                let data = snapshot.data.ok_or(StoreError::ParseError)?;
                converter::decode_mapping(data)
            })
            .collect()
    }

    /// Create, update or delete a single document
    ///
    /// `Create` stamps the model's id with the document key before writing.
    /// `Create` always replaces the stored document; `Update` replaces it
    /// too unless the config selects [`UpdateMode::Merge`].
    ///
    /// # Errors
    ///
    /// - `DocumentNotFound` if the target is not a valid document path
    /// - `OperationNotSupported` for `Read` (nothing is written)
    /// - `ParseError` if the model cannot be encoded (strict encoding)
    /// - backend failures, mapped
    pub async fn execute<M, E>(&self, endpoint: &E) -> StoreResult<()>
    where
        M: Model,
        E: DocumentEndpoint<M> + ?Sized,
    {
        let target = endpoint.target();
        let path = resolve_document(&target)?;
        let operation = endpoint.operation();
        debug!("Document {} at {}", operation.name(), path);

        let result = match operation {
            Operation::Read => return Err(StoreError::OperationNotSupported),
            Operation::Create(mut model) => {
                model.set_id(path.key().to_string());
                let data = self.encode(&model)?;
                self.backend.set_document(path, data).await
            }
            Operation::Update(model) => {
                let data = self.encode(&model)?;
                match self.config.document_update_mode {
                    UpdateMode::Overwrite => self.backend.set_document(path, data).await,
                    UpdateMode::Merge => self.backend.merge_document(path, data).await,
                }
            }
            Operation::Delete => self.backend.delete_document(path).await,
        };

        result.map_err(|e| {
            warn!("Writing {} failed: {}", path, e);
            StoreError::from(e)
        })
    }

    fn encode<T: Serialize>(&self, model: &T) -> StoreResult<Mapping> {
        if self.config.strict_encoding {
            converter::try_encode(model)
        } else {
            Ok(converter::encode(model))
        }
    }
}

fn resolve_document(target: &DocumentTarget) -> StoreResult<&DocumentPath> {
    match target {
        DocumentTarget::Document(path) if path.is_valid() => Ok(path),
        _ => Err(StoreError::DocumentNotFound),
    }
}

fn resolve_query(target: &DocumentTarget) -> StoreResult<&DocumentQuery> {
    match target {
        DocumentTarget::Query(query) if query.collection().is_valid() => {
            if query.has_valid_clauses() {
                Ok(query)
            } else {
                Err(StoreError::InvalidQuery)
            }
        }
        _ => Err(StoreError::CollectionNotFound),
    }
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "document_service_test.rs"]
mod document_service_test;
