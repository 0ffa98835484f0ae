//! Query Definitions
//!
//! Filtered and ordered views over a document collection ([`DocumentQuery`])
//! or a tree location ([`TreeQuery`]). Queries are plain data built with
//! chained builder calls; backends evaluate them.
//!
//! Both query types expose `has_valid_clauses()` so the facades can tell a
//! malformed clause (`InvalidQuery`) apart from an unresolvable location.
//!
//! # Examples
//!
//! ```rust
//! use basekit_core::db::{CollectionPath, DocumentQuery, FilterOperator, OrderDirection};
//! use serde_json::json;
//!
//! let adults = DocumentQuery::new(CollectionPath::new("users"))
//!     .filter("age", FilterOperator::GreaterThanOrEqual, json!(18))
//!     .order_by("age", OrderDirection::Descending)
//!     .limit(10);
//! assert!(adults.has_valid_clauses());
//! ```

use crate::db::paths::{CollectionPath, TreePath};
use crate::db::DocumentSnapshot;
use crate::models::Mapping;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Comparison applied by a document filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayContains,
    In,
}

/// Single `field <op> value` clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOperator,
    pub value: Value,
}

impl Filter {
    fn is_valid(&self) -> bool {
        if !is_valid_field_path(&self.field) {
            return false;
        }
        match self.op {
            FilterOperator::In => matches!(&self.value, Value::Array(items) if !items.is_empty()),
            _ => true,
        }
    }

    /// Documents lacking the field never match.
    fn matches(&self, data: &Mapping) -> bool {
        let Some(actual) = lookup_field(data, &self.field) else {
            return false;
        };

        match self.op {
            FilterOperator::Equal => compare_values(actual, &self.value) == Ordering::Equal,
            FilterOperator::NotEqual => {
                !actual.is_null() && compare_values(actual, &self.value) != Ordering::Equal
            }
            FilterOperator::LessThan => {
                same_type_class(actual, &self.value)
                    && compare_values(actual, &self.value) == Ordering::Less
            }
            FilterOperator::LessThanOrEqual => {
                same_type_class(actual, &self.value)
                    && compare_values(actual, &self.value) != Ordering::Greater
            }
            FilterOperator::GreaterThan => {
                same_type_class(actual, &self.value)
                    && compare_values(actual, &self.value) == Ordering::Greater
            }
            FilterOperator::GreaterThanOrEqual => {
                same_type_class(actual, &self.value)
                    && compare_values(actual, &self.value) != Ordering::Less
            }
            FilterOperator::ArrayContains => match actual {
                Value::Array(items) => items
                    .iter()
                    .any(|item| compare_values(item, &self.value) == Ordering::Equal),
                _ => false,
            },
            FilterOperator::In => match &self.value {
                Value::Array(candidates) => candidates
                    .iter()
                    .any(|c| compare_values(actual, c) == Ordering::Equal),
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderClause {
    pub field: String,
    pub direction: OrderDirection,
}

/// Filtered, ordered view over one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentQuery {
    collection: CollectionPath,
    filters: Vec<Filter>,
    order_by: Vec<OrderClause>,
    limit: Option<usize>,
}

impl DocumentQuery {
    /// Every document of `collection`, ordered by key
    pub fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOperator, value: Value) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value,
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by.push(OrderClause {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> &[OrderClause] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    /// True when filters, ordering and limit are well formed
    pub fn has_valid_clauses(&self) -> bool {
        self.filters.iter().all(Filter::is_valid)
            && self.order_by.iter().all(|o| is_valid_field_path(&o.field))
            && self.limit != Some(0)
    }

    /// Evaluate against the documents of the collection.
    ///
    /// Documents missing an `order_by` field are excluded; ties fall back to
    /// document key order.
    pub fn apply(&self, documents: Vec<DocumentSnapshot>) -> Vec<DocumentSnapshot> {
        let mut matched: Vec<DocumentSnapshot> = documents
            .into_iter()
            .filter(|doc| {
                let Some(data) = doc.data.as_ref() else {
                    return false;
                };
                self.filters.iter().all(|f| f.matches(data))
                    && self
                        .order_by
                        .iter()
                        .all(|o| lookup_field(data, &o.field).is_some())
            })
            .collect();

        matched.sort_by(|a, b| {
            for clause in &self.order_by {
                let left = a.data.as_ref().and_then(|d| lookup_field(d, &clause.field));
                let right = b.data.as_ref().and_then(|d| lookup_field(d, &clause.field));
                let ordering = match (left, right) {
                    (Some(l), Some(r)) => compare_values(l, r),
                    _ => Ordering::Equal,
                };
                let ordering = match clause.direction {
                    OrderDirection::Ascending => ordering,
                    OrderDirection::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            a.id.cmp(&b.id)
        });

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

/// Ordering applied to the children of a tree location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreeOrder {
    Key,
    Value,
    Child(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreeLimit {
    First(usize),
    Last(usize),
}

/// Ordered, limited view over the children of a tree location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeQuery {
    path: TreePath,
    order: Option<TreeOrder>,
    limit: Option<TreeLimit>,
    equal_to: Option<Value>,
    conflicting_limits: bool,
}

impl TreeQuery {
    pub fn new(path: TreePath) -> Self {
        Self {
            path,
            order: None,
            limit: None,
            equal_to: None,
            conflicting_limits: false,
        }
    }

    pub fn order_by_key(self) -> Self {
        self.with_order(TreeOrder::Key)
    }

    pub fn order_by_value(self) -> Self {
        self.with_order(TreeOrder::Value)
    }

    pub fn order_by_child(self, child: impl Into<String>) -> Self {
        self.with_order(TreeOrder::Child(child.into()))
    }

    pub fn limit_to_first(self, n: usize) -> Self {
        self.with_limit(TreeLimit::First(n))
    }

    pub fn limit_to_last(self, n: usize) -> Self {
        self.with_limit(TreeLimit::Last(n))
    }

    /// Keep only children whose ordering value equals `value`
    pub fn equal_to(mut self, value: Value) -> Self {
        self.equal_to = Some(value);
        self
    }

    fn with_order(mut self, order: TreeOrder) -> Self {
        self.order = Some(order);
        self
    }

    fn with_limit(mut self, limit: TreeLimit) -> Self {
        if self.limit.is_some() {
            self.conflicting_limits = true;
        }
        self.limit = Some(limit);
        self
    }

    pub fn path(&self) -> &TreePath {
        &self.path
    }

    pub fn order(&self) -> Option<&TreeOrder> {
        self.order.as_ref()
    }

    pub fn limit(&self) -> Option<TreeLimit> {
        self.limit
    }

    /// True when the query adds nothing beyond its path
    pub fn is_plain(&self) -> bool {
        self.order.is_none() && self.limit.is_none() && self.equal_to.is_none()
    }

    pub fn has_valid_clauses(&self) -> bool {
        if self.conflicting_limits {
            return false;
        }
        if matches!(self.limit, Some(TreeLimit::First(0)) | Some(TreeLimit::Last(0))) {
            return false;
        }
        if self.equal_to.is_some() && self.order.is_none() {
            return false;
        }
        match &self.order {
            Some(TreeOrder::Child(child)) => TreePath::new(child.as_str()).is_valid()
                && !child.trim_matches('/').is_empty(),
            _ => true,
        }
    }

    /// Evaluate against the value stored at the query's path.
    ///
    /// Non-object values and plain queries are returned unchanged.
    pub fn apply(&self, value: Value) -> Value {
        if self.is_plain() {
            return value;
        }
        let Value::Object(children) = value else {
            return value;
        };

        let order = self.order.clone().unwrap_or(TreeOrder::Key);
        let mut entries: Vec<(String, Value)> = children.into_iter().collect();

        if let Some(expected) = &self.equal_to {
            entries.retain(|(key, child)| {
                compare_values(&order_value(&order, key, child), expected) == Ordering::Equal
            });
        }

        entries.sort_by(|(ka, va), (kb, vb)| {
            let primary = match &order {
                TreeOrder::Key => Ordering::Equal,
                _ => compare_values(&order_value(&order, ka, va), &order_value(&order, kb, vb)),
            };
            primary.then_with(|| compare_tree_keys(ka, kb))
        });

        match self.limit {
            Some(TreeLimit::First(n)) => entries.truncate(n),
            Some(TreeLimit::Last(n)) => {
                let skip = entries.len().saturating_sub(n);
                entries = entries.split_off(skip);
            }
            None => {}
        }

        Value::Object(entries.into_iter().collect())
    }
}

impl From<TreePath> for TreeQuery {
    fn from(path: TreePath) -> Self {
        TreeQuery::new(path)
    }
}

fn order_value(order: &TreeOrder, key: &str, child: &Value) -> Value {
    match order {
        TreeOrder::Key => Value::String(key.to_string()),
        TreeOrder::Value => child.clone(),
        TreeOrder::Child(name) => {
            let mut current = child;
            for segment in TreePath::new(name.as_str()).segments() {
                match current.get(segment) {
                    Some(next) => current = next,
                    None => return Value::Null,
                }
            }
            current.clone()
        }
    }
}

/// Integer-like keys sort numerically before all other keys
fn compare_tree_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn is_valid_field_path(field: &str) -> bool {
    !field.is_empty() && field.split('.').all(|part| !part.is_empty())
}

/// Resolve a dotted field path (`address.city`) inside a document
pub(crate) fn lookup_field<'a>(data: &'a Mapping, field: &str) -> Option<&'a Value> {
    let mut parts = field.split('.');
    let mut current = data.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn same_type_class(a: &Value, b: &Value) -> bool {
    type_rank(a) == type_rank(b)
}

/// Total order over JSON values: null < bool < number < string < array < object
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i.cmp(&j),
            _ => {
                let fx = x.as_f64().unwrap_or(f64::NAN);
                let fy = y.as_f64().unwrap_or(f64::NAN);
                fx.partial_cmp(&fy).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ordering = compare_values(l, r);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            let mut left: Vec<_> = x.iter().collect();
            let mut right: Vec<_> = y.iter().collect();
            left.sort_by(|p, q| p.0.cmp(q.0));
            right.sort_by(|p, q| p.0.cmp(q.0));
            for ((lk, lv), (rk, rv)) in left.iter().zip(right.iter()) {
                let ordering = lk.cmp(rk).then_with(|| compare_values(lv, rv));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            left.len().cmp(&right.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(id: &str, data: Value) -> DocumentSnapshot {
        DocumentSnapshot::new(
            CollectionPath::new("users").doc(id),
            data.as_object().cloned(),
        )
    }

    fn users() -> Vec<DocumentSnapshot> {
        vec![
            snapshot("c", json!({ "name": "Cleo", "age": 41, "tags": ["ops"] })),
            snapshot("a", json!({ "name": "Alice", "age": 30, "tags": ["admin", "ops"] })),
            snapshot("b", json!({ "name": "Bob", "age": 17.0 })),
            snapshot("d", json!({ "name": "Dan", "address": { "city": "Oslo" } })),
        ]
    }

    fn ids(docs: &[DocumentSnapshot]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_plain_query_orders_by_key() {
        let query = DocumentQuery::new(CollectionPath::new("users"));
        assert_eq!(ids(&query.apply(users())), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_range_filter_and_descending_order() {
        let query = DocumentQuery::new(CollectionPath::new("users"))
            .filter("age", FilterOperator::GreaterThanOrEqual, json!(18))
            .order_by("age", OrderDirection::Descending);
        assert_eq!(ids(&query.apply(users())), vec!["c", "a"]);
    }

    #[test]
    fn test_integer_and_float_compare_numerically() {
        let query = DocumentQuery::new(CollectionPath::new("users"))
            .filter("age", FilterOperator::Equal, json!(17));
        assert_eq!(ids(&query.apply(users())), vec!["b"]);
    }

    #[test]
    fn test_array_contains_and_in() {
        let contains = DocumentQuery::new(CollectionPath::new("users"))
            .filter("tags", FilterOperator::ArrayContains, json!("ops"));
        assert_eq!(ids(&contains.apply(users())), vec!["a", "c"]);

        let within = DocumentQuery::new(CollectionPath::new("users"))
            .filter("name", FilterOperator::In, json!(["Bob", "Dan"]));
        assert_eq!(ids(&within.apply(users())), vec!["b", "d"]);
    }

    #[test]
    fn test_nested_field_filter() {
        let query = DocumentQuery::new(CollectionPath::new("users"))
            .filter("address.city", FilterOperator::Equal, json!("Oslo"));
        assert_eq!(ids(&query.apply(users())), vec!["d"]);
    }

    #[test]
    fn test_not_equal_skips_missing_fields() {
        let query = DocumentQuery::new(CollectionPath::new("users"))
            .filter("age", FilterOperator::NotEqual, json!(30));
        assert_eq!(ids(&query.apply(users())), vec!["b", "c"]);
    }

    #[test]
    fn test_limit_truncates() {
        let query = DocumentQuery::new(CollectionPath::new("users")).limit(2);
        assert_eq!(ids(&query.apply(users())), vec!["a", "b"]);
    }

    #[test]
    fn test_document_query_clause_validation() {
        let base = || DocumentQuery::new(CollectionPath::new("users"));
        assert!(base().has_valid_clauses());
        assert!(!base().limit(0).has_valid_clauses());
        assert!(!base()
            .filter("", FilterOperator::Equal, json!(1))
            .has_valid_clauses());
        assert!(!base()
            .filter("name", FilterOperator::In, json!("Bob"))
            .has_valid_clauses());
        assert!(!base()
            .order_by("a..b", OrderDirection::Ascending)
            .has_valid_clauses());
    }

    #[test]
    fn test_tree_query_order_by_child_with_limit() {
        let scores = json!({
            "u1": { "score": 10 },
            "u2": { "score": 30 },
            "u3": { "score": 20 },
            "u4": {}
        });

        let top = TreeQuery::new(TreePath::new("scores"))
            .order_by_child("score")
            .limit_to_last(2)
            .apply(scores.clone());
        let keys: Vec<_> = top.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["u3", "u2"]);

        let first = TreeQuery::new(TreePath::new("scores"))
            .order_by_child("score")
            .limit_to_first(1)
            .apply(scores);
        let keys: Vec<_> = first.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["u4"]);
    }

    #[test]
    fn test_tree_query_key_order_puts_integers_first() {
        let value = json!({ "b": 1, "10": 2, "a": 3, "2": 4 });
        let ordered = TreeQuery::new(TreePath::root()).order_by_key().apply(value);
        let keys: Vec<_> = ordered.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["2", "10", "a", "b"]);
    }

    #[test]
    fn test_tree_query_equal_to() {
        let value = json!({ "u1": "online", "u2": "away", "u3": "online" });
        let online = TreeQuery::new(TreePath::new("presence"))
            .order_by_value()
            .equal_to(json!("online"))
            .apply(value);
        let keys: Vec<_> = online.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["u1", "u3"]);
    }

    #[test]
    fn test_tree_query_clause_validation() {
        let base = || TreeQuery::new(TreePath::new("scores"));
        assert!(base().has_valid_clauses());
        assert!(base().order_by_child("stats/score").has_valid_clauses());
        assert!(!base().limit_to_first(0).has_valid_clauses());
        assert!(!base().limit_to_first(1).limit_to_last(1).has_valid_clauses());
        assert!(!base().equal_to(json!(1)).has_valid_clauses());
        assert!(!base().order_by_child("bad.key").has_valid_clauses());
        assert!(!base().order_by_child("").has_valid_clauses());
    }

    #[test]
    fn test_plain_tree_query_leaves_value_untouched() {
        let value = json!({ "z": 1, "a": 2 });
        let out = TreeQuery::new(TreePath::root()).apply(value.clone());
        assert_eq!(out, value);
    }
}
