//! Store Paths
//!
//! Slash-separated locations in the document store and the tree store.
//! Paths are constructed unchecked; validity is checked when a facade resolves
//! a target, so a malformed path surfaces as a taxonomy error instead of a
//! panic at construction.
//!
//! - [`DocumentPath`] - even number of segments (`users/u1`)
//! - [`CollectionPath`] - odd number of segments (`users`, `users/u1/posts`)
//! - [`TreePath`] - any number of segments; the empty path is the tree root

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Characters the tree store refuses in keys
const FORBIDDEN_TREE_KEY_CHARS: [char; 5] = ['.', '#', '$', '[', ']'];

/// Leading and trailing slashes carry no meaning
fn canonical(raw: String) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.len() == raw.len() {
        raw
    } else {
        trimmed.to_string()
    }
}

fn split(raw: &str) -> Vec<&str> {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn is_valid_document_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".."
}

fn auto_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Location of a single document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct DocumentPath(String);

impl DocumentPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(canonical(path.into()))
    }

    pub fn segments(&self) -> Vec<&str> {
        split(&self.0)
    }

    /// True when the path names a document (even, non-zero segment count)
    pub fn is_valid(&self) -> bool {
        let segments = self.segments();
        !segments.is_empty()
            && segments.len() % 2 == 0
            && segments.iter().all(|s| is_valid_document_segment(s))
    }

    /// Document key (last segment)
    pub fn key(&self) -> &str {
        self.segments().last().copied().unwrap_or("")
    }

    /// Collection containing this document
    pub fn parent(&self) -> CollectionPath {
        let segments = self.segments();
        let end = segments.len().saturating_sub(1);
        CollectionPath::new(segments[..end].join("/"))
    }

    /// Sub-collection under this document
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath::new(format!("{}/{}", self.as_str(), name))
    }

    /// Canonical form without leading or trailing slashes
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DocumentPath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.as_str())
    }
}

/// Location of a collection of documents
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(canonical(path.into()))
    }

    pub fn segments(&self) -> Vec<&str> {
        split(&self.0)
    }

    /// True when the path names a collection (odd segment count)
    pub fn is_valid(&self) -> bool {
        let segments = self.segments();
        segments.len() % 2 == 1 && segments.iter().all(|s| is_valid_document_segment(s))
    }

    /// Document with the given key in this collection
    pub fn doc(&self, key: &str) -> DocumentPath {
        DocumentPath::new(format!("{}/{}", self.as_str(), key))
    }

    /// Document with a freshly generated key in this collection
    pub fn new_document(&self) -> DocumentPath {
        self.doc(&auto_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CollectionPath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.as_str())
    }
}

/// Location in the tree store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct TreePath(String);

impl TreePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(canonical(path.into()))
    }

    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn segments(&self) -> Vec<&str> {
        split(&self.0)
    }

    pub fn is_root(&self) -> bool {
        self.segments().is_empty()
    }

    /// True when every segment is a legal tree key
    pub fn is_valid(&self) -> bool {
        let trimmed = self.as_str();
        trimmed.is_empty() || trimmed.split('/').all(is_valid_tree_key)
    }

    /// Last segment, `None` for the root
    pub fn key(&self) -> Option<&str> {
        self.segments().last().copied()
    }

    /// Parent location, `None` for the root
    pub fn parent(&self) -> Option<TreePath> {
        let segments = self.segments();
        if segments.is_empty() {
            return None;
        }
        Some(TreePath::new(segments[..segments.len() - 1].join("/")))
    }

    pub fn child(&self, key: &str) -> TreePath {
        if self.is_root() {
            TreePath::new(key)
        } else {
            TreePath::new(format!("{}/{}", self.as_str(), key))
        }
    }

    /// Child with a generated key; keys sort by creation millisecond.
    pub fn child_by_auto_id(&self) -> TreePath {
        let millis = Utc::now().timestamp_millis().max(0);
        let suffix = auto_id();
        self.child(&format!("{:012x}{}", millis, &suffix[..8]))
    }

    /// True when `self` is `other` or lies below it
    pub fn starts_with(&self, other: &TreePath) -> bool {
        let mine = self.segments();
        let theirs = other.segments();
        mine.len() >= theirs.len() && mine.iter().zip(theirs.iter()).all(|(a, b)| a == b)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TreePath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.as_str())
    }
}

/// True when `key` is usable as a tree-store key
pub fn is_valid_tree_key(key: &str) -> bool {
    !key.is_empty()
        && !key
            .chars()
            .any(|c| FORBIDDEN_TREE_KEY_CHARS.contains(&c) || c.is_ascii_control())
}
