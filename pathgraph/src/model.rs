// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph data model
//!
//! Graphs are named containers of typed, attributed nodes and directed
//! edges. All identifiers are opaque UTF-8 strings; attribute values are
//! dynamically typed scalars that round-trip through JSON.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a graph
pub type GraphId = String;
/// Unique identifier for a node within a graph
pub type NodeId = String;
/// Unique identifier for an edge within a graph
pub type EdgeId = String;
/// The type tag of a node
pub type NodeType = String;
/// The type tag of an edge
pub type EdgeType = String;

/// Dynamically typed attribute value
///
/// Serialized untagged so that attribute maps read and write as plain JSON.
/// Equality is structural; `Integer` and `Float` are distinct variants, so
/// `5` and `5.0` do not compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<AttrValue>),
    Object(HashMap<String, AttrValue>),
}

impl AttrValue {
    /// Extract as string if possible
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract as integer if possible
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract as float if possible (integers widen)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(n) => Some(*n),
            AttrValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Extract as boolean if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Integer(n)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Float(n)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// Key-value attribute map carried by nodes and edges
pub type Attributes = HashMap<String, AttrValue>;

/// A named container of nodes and edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub id: GraphId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Graph {
    /// Create a new graph with timestamps set to now
    pub fn new(
        id: impl Into<GraphId>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A vertex in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub attributes: Attributes,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Node {
    /// Create a new node with empty attributes and timestamps set to now
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<NodeType>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            node_type: node_type.into(),
            attributes: Attributes::new(),
            created_at: now,
            updated_at: now,
            expires_at: None,
        }
    }

    /// Set an attribute value, touching the update timestamp
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(key.into(), value.into());
        self.updated_at = Utc::now();
    }

    /// Get an attribute value
    pub fn get_attribute(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// Check if the node has a specific attribute
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }
}

/// A directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    #[serde(default)]
    pub attributes: Attributes,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Edge {
    /// Create a new edge with empty attributes and timestamps set to now
    pub fn new(
        id: impl Into<EdgeId>,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        edge_type: impl Into<EdgeType>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            edge_type: edge_type.into(),
            from_node_id: from.into(),
            to_node_id: to.into(),
            attributes: Attributes::new(),
            created_at: now,
            updated_at: now,
            expires_at: None,
        }
    }

    /// Set an attribute value, touching the update timestamp
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(key.into(), value.into());
        self.updated_at = Utc::now();
    }

    /// Get an attribute value
    pub fn get_attribute(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// Check if the edge has a specific attribute
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }
}
