//! Endpoint Descriptors
//!
//! An endpoint bundles a target and an [`Operation`] and describes exactly one
//! facade call. Targets are sum types, so which store shape a request
//! addresses is decided by pattern match rather than a runtime downcast.

mod document;
mod operation;
mod tree;

pub use document::{DocumentEndpoint, DocumentRequest, DocumentTarget};
pub use operation::Operation;
pub use tree::{TreeEndpoint, TreeRequest, TreeTarget};
