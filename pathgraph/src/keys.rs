// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Key schema for the ordered key-value substrate
//!
//! All keys are ASCII-printable concatenations separated by `:`.
//!
//! | purpose            | key form                                    |
//! |--------------------|---------------------------------------------|
//! | graph record       | `g:<graph>`                                 |
//! | node record        | `n:<graph>:<node>`                          |
//! | edge record        | `e:<graph>:<edge>`                          |
//! | node type index    | `ti:n:<graph>:<type>:<node>`                |
//! | edge type index    | `ti:e:<graph>:<type>:<edge>`                |
//! | outgoing adjacency | `ni:out:<graph>:<node>:<edge>`              |
//! | incoming adjacency | `ni:in:<graph>:<node>:<edge>`               |
//! | expiry index       | `xi:<rfc3339-utc>:<graph>:<node>`           |
//!
//! The expiry key puts the timestamp first so lexicographic order equals
//! chronological order, which lets the TTL sweeper stop at the first
//! not-yet-expired key.
//!
//! Known limitation: identifiers may legally contain `:`, so keys cannot be
//! reverse-parsed by free splitting. Index *values* carry the authoritative
//! entity ID and lookups must prefer them; where a key must be decoded, a
//! known-prefix-length split is used (record keys) or the historical
//! last-colon split is kept (expiry keys).

use chrono::{DateTime, SecondsFormat, Utc};

use crate::model::{GraphId, NodeId};

pub const GRAPH_PREFIX: &str = "g:";
pub const NODE_PREFIX: &str = "n:";
pub const EDGE_PREFIX: &str = "e:";
pub const NODE_INDEX_PREFIX: &str = "ni:";
pub const TYPE_INDEX_PREFIX: &str = "ti:";
pub const EXPIRY_INDEX_PREFIX: &str = "xi:";

/// Width of the fixed `YYYY-MM-DDTHH:MM:SSZ` timestamp in expiry keys.
pub const EXPIRY_TS_LEN: usize = 20;

/// Key for a graph record
pub fn graph_key(graph_id: &str) -> Vec<u8> {
    format!("{GRAPH_PREFIX}{graph_id}").into_bytes()
}

/// Key for a node record
pub fn node_key(graph_id: &str, node_id: &str) -> Vec<u8> {
    format!("{NODE_PREFIX}{graph_id}:{node_id}").into_bytes()
}

/// Key for an edge record
pub fn edge_key(graph_id: &str, edge_id: &str) -> Vec<u8> {
    format!("{EDGE_PREFIX}{graph_id}:{edge_id}").into_bytes()
}

/// Key indexing a node by type; the value is the node ID
pub fn node_type_index_key(graph_id: &str, node_type: &str, node_id: &str) -> Vec<u8> {
    format!("{TYPE_INDEX_PREFIX}n:{graph_id}:{node_type}:{node_id}").into_bytes()
}

/// Key indexing an edge by type; the value is the edge ID
pub fn edge_type_index_key(graph_id: &str, edge_type: &str, edge_id: &str) -> Vec<u8> {
    format!("{TYPE_INDEX_PREFIX}e:{graph_id}:{edge_type}:{edge_id}").into_bytes()
}

/// Key indexing an outgoing edge of a node; the value is the edge ID
pub fn out_edge_index_key(graph_id: &str, node_id: &str, edge_id: &str) -> Vec<u8> {
    format!("{NODE_INDEX_PREFIX}out:{graph_id}:{node_id}:{edge_id}").into_bytes()
}

/// Key indexing an incoming edge of a node; the value is the edge ID
pub fn in_edge_index_key(graph_id: &str, node_id: &str, edge_id: &str) -> Vec<u8> {
    format!("{NODE_INDEX_PREFIX}in:{graph_id}:{node_id}:{edge_id}").into_bytes()
}

/// Format an expiry timestamp as fixed-width RFC3339 UTC
pub fn expiry_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Key for the node expiration index; the value is the node ID
pub fn expiry_index_key(graph_id: &str, node_id: &str, expires_at: DateTime<Utc>) -> Vec<u8> {
    format!(
        "{EXPIRY_INDEX_PREFIX}{}:{graph_id}:{node_id}",
        expiry_timestamp(expires_at)
    )
    .into_bytes()
}

/// Prefix iterating all graph records
pub fn graph_iter_prefix() -> Vec<u8> {
    GRAPH_PREFIX.as_bytes().to_vec()
}

/// Prefix iterating all node records in a graph
pub fn node_iter_prefix(graph_id: &str) -> Vec<u8> {
    format!("{NODE_PREFIX}{graph_id}:").into_bytes()
}

/// Prefix iterating all edge records in a graph
pub fn edge_iter_prefix(graph_id: &str) -> Vec<u8> {
    format!("{EDGE_PREFIX}{graph_id}:").into_bytes()
}

/// Prefix iterating all nodes of one type in a graph
pub fn node_type_iter_prefix(graph_id: &str, node_type: &str) -> Vec<u8> {
    format!("{TYPE_INDEX_PREFIX}n:{graph_id}:{node_type}:").into_bytes()
}

/// Prefix iterating all edges of one type in a graph
pub fn edge_type_iter_prefix(graph_id: &str, edge_type: &str) -> Vec<u8> {
    format!("{TYPE_INDEX_PREFIX}e:{graph_id}:{edge_type}:").into_bytes()
}

/// Prefix iterating the outgoing adjacency of a node
pub fn out_edge_iter_prefix(graph_id: &str, node_id: &str) -> Vec<u8> {
    format!("{NODE_INDEX_PREFIX}out:{graph_id}:{node_id}:").into_bytes()
}

/// Prefix iterating the incoming adjacency of a node
pub fn in_edge_iter_prefix(graph_id: &str, node_id: &str) -> Vec<u8> {
    format!("{NODE_INDEX_PREFIX}in:{graph_id}:{node_id}:").into_bytes()
}

/// Prefix iterating the expiry index in chronological order
pub fn expiry_iter_prefix() -> Vec<u8> {
    EXPIRY_INDEX_PREFIX.as_bytes().to_vec()
}

/// Extract the graph ID from a graph record key
pub fn graph_id_from_key(key: &[u8]) -> Option<GraphId> {
    let key = std::str::from_utf8(key).ok()?;
    key.strip_prefix(GRAPH_PREFIX).map(str::to_string)
}

/// Extract the node ID from a node record key, given the known graph ID.
///
/// Uses a known-prefix-length split, so node IDs containing `:` decode
/// correctly.
pub fn node_id_from_key<'a>(graph_id: &str, key: &'a [u8]) -> Option<&'a str> {
    let key = std::str::from_utf8(key).ok()?;
    key.strip_prefix(NODE_PREFIX)?
        .strip_prefix(graph_id)?
        .strip_prefix(':')
}

/// Extract the edge ID from an edge record key, given the known graph ID.
pub fn edge_id_from_key<'a>(graph_id: &str, key: &'a [u8]) -> Option<&'a str> {
    let key = std::str::from_utf8(key).ok()?;
    key.strip_prefix(EDGE_PREFIX)?
        .strip_prefix(graph_id)?
        .strip_prefix(':')
}

/// Extract the timestamp portion of an expiry index key.
pub fn expiry_timestamp_from_key(key: &[u8]) -> Option<&str> {
    let key = std::str::from_utf8(key).ok()?;
    let rest = key.strip_prefix(EXPIRY_INDEX_PREFIX)?;
    if rest.len() < EXPIRY_TS_LEN {
        return None;
    }
    Some(&rest[..EXPIRY_TS_LEN])
}

/// Decode `(graph, node)` from an expiry index key.
///
/// Historical last-colon split: a node ID containing `:` decodes wrong here,
/// which is why callers resolve the node ID from the stored value first and
/// only fall back to this decoding.
pub fn decode_expiry_index_key(key: &[u8]) -> Option<(GraphId, NodeId)> {
    let key = std::str::from_utf8(key).ok()?;
    let rest = key.strip_prefix(EXPIRY_INDEX_PREFIX)?;
    let last = rest.rfind(':')?;
    let node_id = &rest[last + 1..];
    let remaining = &rest[..last];
    let second_last = remaining.rfind(':')?;
    let graph_id = &remaining[second_last + 1..];
    Some((graph_id.to_string(), node_id.to_string()))
}

/// Resolve `(graph, node)` for an expiry entry, preferring the stored node
/// ID over the key decoding.
pub fn resolve_expiry_entry(key: &[u8], value: &[u8]) -> Option<(GraphId, NodeId)> {
    let node_id = String::from_utf8(value.to_vec()).ok()?;
    if !node_id.is_empty() {
        let key_str = std::str::from_utf8(key).ok()?;
        let rest = key_str.strip_prefix(EXPIRY_INDEX_PREFIX)?;
        if rest.len() < EXPIRY_TS_LEN + 1 {
            return None;
        }
        let scoped = &rest[EXPIRY_TS_LEN + 1..];
        let graph_id = scoped.strip_suffix(node_id.as_str())?.strip_suffix(':')?;
        return Some((graph_id.to_string(), node_id));
    }
    decode_expiry_index_key(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn record_keys_round_trip() {
        let key = node_key("g", "auth");
        assert_eq!(key, b"n:g:auth");
        assert_eq!(node_id_from_key("g", &key), Some("auth"));

        let key = edge_key("g", "a-b");
        assert_eq!(edge_id_from_key("g", &key), Some("a-b"));

        assert_eq!(graph_id_from_key(b"g:prod"), Some("prod".to_string()));
    }

    #[test]
    fn colon_bearing_ids_decode_with_prefix_length_split() {
        let key = node_key("g", "user:1");
        assert_eq!(node_id_from_key("g", &key), Some("user:1"));

        let key = edge_key("g", "user:1-buys-product:123");
        assert_eq!(edge_id_from_key("g", &key), Some("user:1-buys-product:123"));
    }

    #[test]
    fn expiry_keys_sort_chronologically() {
        let early = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();
        let k1 = expiry_index_key("g", "a", early);
        let k2 = expiry_index_key("g", "a", late);
        assert!(k1 < k2);
        assert_eq!(expiry_timestamp_from_key(&k1), Some("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn expiry_entry_resolves_through_value() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let key = expiry_index_key("shop", "user:1", at);

        // Last-colon decoding mis-parses the colon-bearing node ID.
        let (g, n) = decode_expiry_index_key(&key).unwrap();
        assert_eq!((g.as_str(), n.as_str()), ("user", "1"));

        // Value-first resolution recovers both identifiers.
        let (g, n) = resolve_expiry_entry(&key, b"user:1").unwrap();
        assert_eq!((g.as_str(), n.as_str()), ("shop", "user:1"));
    }
}
