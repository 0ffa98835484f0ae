//! TreeService - Typed Facade over a TreeBackend
//!
//! Reads, writes and observes locations in a hierarchical key-value store.
//!
//! # Write Semantics
//!
//! - `Create` replaces the whole subtree at the path
//! - `Update` merges only the model's top-level keys (shallow merge)
//! - `Delete` removes the subtree
//!
//! These differ from [`DocumentService`](super::DocumentService), where an
//! update replaces the document by default.
//!
//! # Subscriptions
//!
//! [`TreeService::subscribe`] spawns one task per subscription on the current
//! tokio runtime. Events are decoded and handed to the callback one at a
//! time, in arrival order.

use crate::config::ServiceConfig;
use crate::db::{EventKind, TreeBackend, TreeQuery};
use crate::endpoints::{Operation, TreeEndpoint, TreeTarget};
use crate::models::{converter, Mapping, Model};
use crate::services::{StoreError, StoreResult, Subscription};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// Tree-store facade
pub struct TreeService<B: TreeBackend + ?Sized> {
    backend: Arc<B>,
    config: ServiceConfig,
}

impl<B: TreeBackend + ?Sized> Clone for TreeService<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            config: self.config.clone(),
        }
    }
}

impl<B: TreeBackend + ?Sized> TreeService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_config(backend, ServiceConfig::default())
    }

    pub fn with_config(backend: Arc<B>, config: ServiceConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Read the mapping at the target and decode it into `M`
    ///
    /// # Errors
    ///
    /// - `InvalidPath` / `InvalidQuery` if the target does not resolve
    /// - `InvalidRequest` for non-`Read` operations, or when the stored value
    ///   is not a mapping
    /// - `ParseError` if the mapping does not decode
    pub async fn fetch<M, E>(&self, endpoint: &E) -> StoreResult<M>
    where
        M: Model,
        E: TreeEndpoint<M> + ?Sized,
    {
        let query = resolve_query(endpoint.target())?;
        let operation = endpoint.operation();
        debug!("Tree {} at {}", operation.name(), query.path());

        if !operation.is_read() {
            return Err(StoreError::InvalidRequest);
        }

        match self.read(&query).await? {
            Value::Object(map) => converter::decode_mapping(map),
            _ => Err(StoreError::InvalidRequest),
        }
    }

    /// Read the children of the target and decode each into `M`
    ///
    /// An empty location yields an empty vector. One undecodable child fails
    /// the whole call.
    pub async fn fetch_all<M, E>(&self, endpoint: &E) -> StoreResult<Vec<M>>
    where
        M: Model,
        E: TreeEndpoint<M> + ?Sized,
    {
        let query = resolve_query(endpoint.target())?;
        let operation = endpoint.operation();
        debug!("Tree children {} at {}", operation.name(), query.path());

        if !operation.is_read() {
            return Err(StoreError::InvalidRequest);
        }

        match self.read(&query).await? {
            Value::Null => Ok(Vec::new()),
            Value::Object(children) => children
                .into_iter()
                .map(|(_, child)| converter::decode(&child))
                .collect(),
            _ => Err(StoreError::InvalidRequest),
        }
    }

    /// Create, update or delete the value at a path
    ///
    /// `Create` stamps the model's id with the path's key (when the path is
    /// not the root) and replaces the subtree. `Update` merges the model's
    /// top-level keys into the stored value.
    ///
    /// # Errors
    ///
    /// - `InvalidPath` unless the target is a valid path (queries are
    ///   read-only)
    /// - `InvalidRequest` for `Read` (nothing is written)
    /// - `ParseError` if the model cannot be encoded (strict encoding)
    /// - backend failures, mapped
    pub async fn execute<M, E>(&self, endpoint: &E) -> StoreResult<()>
    where
        M: Model,
        E: TreeEndpoint<M> + ?Sized,
    {
        let path = match endpoint.target() {
            TreeTarget::Path(path) if path.is_valid() => path,
            _ => return Err(StoreError::InvalidPath),
        };
        let operation = endpoint.operation();
        debug!("Tree {} at {}", operation.name(), path);

        let result = match operation {
            Operation::Read => return Err(StoreError::InvalidRequest),
            Operation::Create(mut model) => {
                if let Some(key) = path.key() {
                    model.set_id(key.to_string());
                }
                let data = self.encode(&model)?;
                self.backend.set_value(&path, Value::Object(data)).await
            }
            Operation::Update(model) => {
                let data = self.encode(&model)?;
                self.backend.update_children(&path, data).await
            }
            Operation::Delete => self.backend.remove_value(&path).await,
        };

        result.map_err(|e| {
            warn!("Writing {} failed: {}", path, e);
            StoreError::from(e)
        })
    }

    /// Deliver every `kind` event at the target to `handler`
    ///
    /// Each event payload is decoded as `T`; payloads that do not decode are
    /// delivered as `Err(InvalidType)` and the subscription continues.
    ///
    /// If the target does not resolve, `handler` is called once with
    /// `InvalidPath` (or `InvalidQuery`) and an inactive handle is returned.
    /// A non-`Read` operation is reported once as `InvalidRequest`, and a
    /// backend that refuses the registration once through the uniform
    /// backend error mapping.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe<T, E, F>(&self, endpoint: &E, kind: EventKind, mut handler: F) -> Subscription
    where
        T: DeserializeOwned + Send + 'static,
        E: TreeEndpoint<T> + ?Sized,
        F: FnMut(StoreResult<T>) + Send + 'static,
    {
        let query = match resolve_query(endpoint.target()) {
            Ok(query) => query,
            Err(err) => {
                debug!("Subscription target rejected: {}", err);
                handler(Err(err));
                return Subscription::inactive();
            }
        };

        if !endpoint.operation().is_read() {
            handler(Err(StoreError::InvalidRequest));
            return Subscription::inactive();
        }

        let receiver = match self.backend.observe(&query, kind) {
            Ok(receiver) => receiver,
            Err(e) => {
                warn!("Observing {} failed: {}", query.path(), e);
                handler(Err(StoreError::from(e)));
                return Subscription::inactive();
            }
        };

        let location = query.path().clone();
        info!("Subscribed to {} events at {}", kind.as_str(), location);

        let task = tokio::spawn(async move {
            let mut events = BroadcastStream::new(receiver);
            while let Some(item) = events.next().await {
                match item {
                    Ok(event) => {
                        let decoded =
                            converter::decode::<T>(&event.value).map_err(|_| StoreError::InvalidType);
                        handler(decoded);
                    }
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(
                            "Subscription at {} lagged, {} events skipped",
                            location, skipped
                        );
                    }
                }
            }
            debug!("Event feed at {} closed", location);
        });

        Subscription::running(task)
    }

    async fn read(&self, query: &TreeQuery) -> StoreResult<Value> {
        self.backend.get_value(query).await.map_err(|e| {
            warn!("Reading {} failed: {}", query.path(), e);
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

fn resolve_query(target: TreeTarget) -> StoreResult<TreeQuery> {
    let query = match target {
        TreeTarget::Path(path) => TreeQuery::new(path),
        TreeTarget::Query(query) => query,
    };

    if !query.path().is_valid() {
        return Err(StoreError::InvalidPath);
    }
    if !query.has_valid_clauses() {
        return Err(StoreError::InvalidQuery);
    }
    Ok(query)
}

// Comprehensive tests in separate module
#[cfg(test)]
#[path = "tree_service_test.rs"]
mod tree_service_test;
