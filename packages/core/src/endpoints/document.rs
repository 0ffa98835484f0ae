//! Document-Store Endpoints
//!
//! A document endpoint pairs a [`DocumentTarget`] with an [`Operation`].
//! Applications either build [`DocumentRequest`]s directly or implement
//! [`DocumentEndpoint`] on their own enum of calls.
//!
//! # Examples
//!
//! ```rust
//! use basekit_core::db::{CollectionPath, DocumentPath};
//! use basekit_core::endpoints::{DocumentEndpoint, DocumentTarget, Operation};
//! # use basekit_core::models::Model;
//! # use serde::{Deserialize, Serialize};
//! # #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
//! # struct User { id: String, name: String }
//! # impl Model for User {
//! #     fn id(&self) -> &str { &self.id }
//! #     fn set_id(&mut self, id: String) { self.id = id; }
//! # }
//!
//! enum UserEndpoint {
//!     Profile(String),
//!     All,
//!     Register(User),
//! }
//!
//! impl DocumentEndpoint<User> for UserEndpoint {
//!     fn target(&self) -> DocumentTarget {
//!         let users = CollectionPath::new("users");
//!         match self {
//!             UserEndpoint::Profile(id) => users.doc(id).into(),
//!             UserEndpoint::All => users.into(),
//!             UserEndpoint::Register(_) => users.new_document().into(),
//!         }
//!     }
//!
//!     fn operation(&self) -> Operation<User> {
//!         match self {
//!             UserEndpoint::Register(user) => Operation::Create(user.clone()),
//!             _ => Operation::Read,
//!         }
//!     }
//! }
//! ```

use crate::db::{CollectionPath, DocumentPath, DocumentQuery};
use crate::endpoints::Operation;
use std::fmt;

/// What a document request addresses
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentTarget {
    /// One document
    Document(DocumentPath),
    /// A filtered set of documents
    Query(DocumentQuery),
}

impl From<DocumentPath> for DocumentTarget {
    fn from(path: DocumentPath) -> Self {
        DocumentTarget::Document(path)
    }
}

impl From<DocumentQuery> for DocumentTarget {
    fn from(query: DocumentQuery) -> Self {
        DocumentTarget::Query(query)
    }
}

/// A bare collection targets all of its documents
impl From<CollectionPath> for DocumentTarget {
    fn from(collection: CollectionPath) -> Self {
        DocumentTarget::Query(DocumentQuery::new(collection))
    }
}

impl fmt::Display for DocumentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentTarget::Document(path) => write!(f, "{}", path),
            DocumentTarget::Query(query) => write!(f, "query({})", query.collection()),
        }
    }
}

/// Describes one document-store call
pub trait DocumentEndpoint<M> {
    fn target(&self) -> DocumentTarget;

    fn operation(&self) -> Operation<M>;
}

/// Ready-made [`DocumentEndpoint`]
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequest<M> {
    target: DocumentTarget,
    operation: Operation<M>,
}

impl<M> DocumentRequest<M> {
    pub fn new(target: impl Into<DocumentTarget>, operation: Operation<M>) -> Self {
        Self {
            target: target.into(),
            operation,
        }
    }

    /// Read a document, or every document matched by a query
    pub fn get(target: impl Into<DocumentTarget>) -> Self {
        Self::new(target, Operation::Read)
    }

    /// Create `model` at `path`; the model's id becomes the path's key
    pub fn create(path: DocumentPath, model: M) -> Self {
        Self::new(path, Operation::Create(model))
    }

    pub fn update(path: DocumentPath, model: M) -> Self {
        Self::new(path, Operation::Update(model))
    }

    pub fn delete(path: DocumentPath) -> Self {
        Self::new(path, Operation::Delete)
    }
}

impl<M: Clone> DocumentEndpoint<M> for DocumentRequest<M> {
    fn target(&self) -> DocumentTarget {
        self.target.clone()
    }

    fn operation(&self) -> Operation<M> {
        self.operation.clone()
    }
}
