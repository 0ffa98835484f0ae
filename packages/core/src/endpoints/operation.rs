//! Request operations shared by both stores

use serde::{Deserialize, Serialize};

/// What a request does at its target
///
/// `Create` and `Update` carry the model to write; `Read` and `Delete` carry
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "model", rename_all = "camelCase")]
pub enum Operation<M> {
    Read,
    Create(M),
    Update(M),
    Delete,
}

impl<M> Operation<M> {
    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Create(_) => "create",
            Operation::Update(_) => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, Operation::Read)
    }

    /// Payload of a write, if any
    pub fn payload(&self) -> Option<&M> {
        match self {
            Operation::Create(model) | Operation::Update(model) => Some(model),
            Operation::Read | Operation::Delete => None,
        }
    }
}
