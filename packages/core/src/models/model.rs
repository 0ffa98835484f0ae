//! Model Contract
//!
//! Defines the [`Model`] trait every record type must satisfy to be written to
//! or read from a store, and the [`Mapping`] interchange shape.
//!
//! # Examples
//!
//! ```rust
//! use basekit_core::models::Model;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
//! struct User {
//!     id: String,
//!     name: String,
//! }
//!
//! impl Model for User {
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//!
//!     fn set_id(&mut self, id: String) {
//!         self.id = id;
//!     }
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

/// String-keyed map of JSON-compatible values.
///
/// Insertion order is preserved, so child order reported by a store survives
/// conversion.
pub type Mapping = serde_json::Map<String, serde_json::Value>;

/// A record that can be stored in a document or tree store.
///
/// The identity field is owned by the store on create: the facade overwrites
/// it with the resolved key before the payload is written.
pub trait Model:
    Serialize + DeserializeOwned + Clone + Debug + PartialEq + Eq + Hash + Send + Sync + 'static
{
    /// Store key of this record
    fn id(&self) -> &str;

    /// Replace the store key of this record
    fn set_id(&mut self, id: String);
}
