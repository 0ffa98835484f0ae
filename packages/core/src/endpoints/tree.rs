//! Tree-Store Endpoints
//!
//! Same shape as the document endpoints, addressed by [`TreeTarget`].

use crate::db::{TreePath, TreeQuery};
use crate::endpoints::Operation;
use std::fmt;

/// What a tree request addresses
#[derive(Debug, Clone, PartialEq)]
pub enum TreeTarget {
    /// A writable location
    Path(TreePath),
    /// An ordered or limited view of a location (read-only)
    Query(TreeQuery),
}

impl TreeTarget {
    /// Location addressed by the target
    pub fn path(&self) -> &TreePath {
        match self {
            TreeTarget::Path(path) => path,
            TreeTarget::Query(query) => query.path(),
        }
    }
}

impl From<TreePath> for TreeTarget {
    fn from(path: TreePath) -> Self {
        TreeTarget::Path(path)
    }
}

impl From<TreeQuery> for TreeTarget {
    fn from(query: TreeQuery) -> Self {
        TreeTarget::Query(query)
    }
}

impl fmt::Display for TreeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeTarget::Path(path) => write!(f, "{}", path),
            TreeTarget::Query(query) => write!(f, "query({})", query.path()),
        }
    }
}

/// Describes one tree-store call
pub trait TreeEndpoint<M> {
    fn target(&self) -> TreeTarget;

    fn operation(&self) -> Operation<M>;
}

/// Ready-made [`TreeEndpoint`]
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRequest<M> {
    target: TreeTarget,
    operation: Operation<M>,
}

impl<M> TreeRequest<M> {
    pub fn new(target: impl Into<TreeTarget>, operation: Operation<M>) -> Self {
        Self {
            target: target.into(),
            operation,
        }
    }

    pub fn get(target: impl Into<TreeTarget>) -> Self {
        Self::new(target, Operation::Read)
    }

    /// Replace the subtree at `path` with `model`
    pub fn create(path: TreePath, model: M) -> Self {
        Self::new(path, Operation::Create(model))
    }

    /// Merge the fields of `model` into `path`
    pub fn update(path: TreePath, model: M) -> Self {
        Self::new(path, Operation::Update(model))
    }

    pub fn delete(path: TreePath) -> Self {
        Self::new(path, Operation::Delete)
    }
}

impl<M: Clone> TreeEndpoint<M> for TreeRequest<M> {
    fn target(&self) -> TreeTarget {
        self.target.clone()
    }

    fn operation(&self) -> Operation<M> {
        self.operation.clone()
    }
}
