//! Typed model for the compiled aggregation tree
//!
//! Metrics and buckets are modeled as tagged variants rather than untyped
//! JSON maps, and only converted to JSON at the serialization boundary.

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Parameters of one bucket aggregation, typed per bucket kind.
#[derive(Debug, Clone, PartialEq)]
pub enum BucketParams {
    /// `terms` bucket over a field; size 0 means "return all buckets"
    Terms { field: String, size: u64 },
    /// `date_histogram` bucket
    DateHistogram {
        field: String,
        interval: String,
        format: String,
    },
    /// `range` bucket with explicit boundary pairs
    Range {
        field: String,
        ranges: Vec<RangeBound>,
    },
}

/// One from/to pair of a `range` bucket.
///
/// Boundaries hold JSON values so numeric literals stay numbers on the wire
/// while anything else stays a string.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBound {
    pub from: Value,
    pub to: Value,
}

impl BucketParams {
    /// Wire name of the bucket type (the key inside the node body)
    pub fn kind(&self) -> &'static str {
        match self {
            BucketParams::Terms { .. } => "terms",
            BucketParams::DateHistogram { .. } => "date_histogram",
            BucketParams::Range { .. } => "range",
        }
    }

    fn to_value(&self) -> Value {
        match self {
            BucketParams::Terms { field, size } => json!({ "field": field, "size": size }),
            BucketParams::DateHistogram {
                field,
                interval,
                format,
            } => json!({ "field": field, "interval": interval, "format": format }),
            BucketParams::Range { field, ranges } => {
                let ranges: Vec<Value> = ranges
                    .iter()
                    .map(|r| json!({ "from": r.from.clone(), "to": r.to.clone() }))
                    .collect();
                json!({ "field": field, "ranges": ranges })
            }
        }
    }
}

/// Body of one named aggregation node.
#[derive(Debug, Clone, PartialEq)]
pub enum AggNode {
    /// Leaf metric: one operator applied to one field
    Metric { operator: String, field: String },
    /// Bucket with parameters and an optional nested subtree
    Bucket {
        params: BucketParams,
        child: Option<AggTree>,
    },
}

impl AggNode {
    fn to_value(&self) -> Value {
        match self {
            AggNode::Metric { operator, field } => {
                let mut body = Map::new();
                body.insert(operator.clone(), json!({ "field": field }));
                Value::Object(body)
            }
            AggNode::Bucket { params, child } => {
                let mut body = Map::new();
                body.insert(params.kind().to_string(), params.to_value());
                if let Some(child) = child {
                    if !child.is_empty() {
                        body.insert("aggregations".to_string(), child.to_value());
                    }
                }
                Value::Object(body)
            }
        }
    }
}

/// The compiled aggregation tree: aggregation nodes keyed by display label.
///
/// Keys serialize in lexicographic order (`BTreeMap` iteration order), so
/// re-serializing the same tree is byte-identical. Inserting a duplicate key
/// overwrites the earlier node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggTree {
    nodes: BTreeMap<String, AggNode>,
}

impl AggTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn insert(&mut self, key: impl Into<String>, node: AggNode) {
        self.nodes.insert(key.into(), node);
    }

    pub fn get(&self, key: &str) -> Option<&AggNode> {
        self.nodes.get(key)
    }

    /// Render the tree as the `aggregations` JSON document value.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (key, node) in &self.nodes {
            map.insert(key.clone(), node.to_value());
        }
        Value::Object(map)
    }

    /// Serialize the tree to its JSON string form.
    ///
    /// Encoding a tree of strings, numbers and maps cannot fail; an error
    /// here is a bug, not a recoverable condition.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.to_value()).expect("aggregation tree serializes to JSON")
    }
}
