// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! NODE.LIST / EDGE.LIST / EDGE.NEIGHBORS output-format contracts

use tempfile::TempDir;

use pathgraph::redis::{CommandHandler, Reply};
use pathgraph::{Edge, Graph, GraphStore, Node};

const GRAPH_ID: &str = "list-test-graph";

fn setup() -> (TempDir, GraphStore, CommandHandler) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = GraphStore::open(dir.path().join("db")).expect("failed to open store");
    store
        .create_graph(&Graph::new(GRAPH_ID, "List Test Graph", "Graph for list commands"))
        .unwrap();
    let handler = CommandHandler::new(store.clone());
    (dir, store, handler)
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn expect_array(reply: Reply) -> Vec<String> {
    match reply {
        Reply::Array(values) => values,
        other => panic!("expected array reply, got {other:?}"),
    }
}

fn populate(store: &GraphStore) {
    for (id, node_type) in [
        ("service-a", "service"),
        ("service-b", "service"),
        ("database-1", "database"),
    ] {
        store.create_node(GRAPH_ID, &Node::new(id, node_type)).unwrap();
    }
    store
        .create_edge(
            GRAPH_ID,
            &Edge::new("edge-ab", "service-a", "service-b", "depends_on"),
        )
        .unwrap();
    store
        .create_edge(
            GRAPH_ID,
            &Edge::new("edge-a-db", "service-a", "database-1", "connects_to"),
        )
        .unwrap();
}

#[test]
fn node_list_renders_id_type_pairs() {
    let (_dir, store, handler) = setup();
    populate(&store);

    let items = expect_array(handler.handle("NODE.LIST", &args(&[GRAPH_ID])).unwrap());
    assert_eq!(items.len(), 3);

    for expected in ["service-a:service", "service-b:service", "database-1:database"] {
        assert!(
            items.contains(&expected.to_string()),
            "expected {expected} in {items:?}"
        );
    }
    for item in &items {
        assert!(item.contains(':'), "item {item} should be id:type");
    }
}

#[test]
fn edge_list_keeps_the_flat_quad_layout() {
    let (_dir, store, handler) = setup();
    populate(&store);

    let items = expect_array(handler.handle("EDGE.LIST", &args(&[GRAPH_ID])).unwrap());
    // Two edges, four entries each: id, from, to, type.
    assert_eq!(items.len(), 8);

    let quads: Vec<&[String]> = items.chunks(4).collect();
    assert!(quads
        .iter()
        .any(|q| *q == ["edge-ab", "service-a", "service-b", "depends_on"]));
    assert!(quads
        .iter()
        .any(|q| *q == ["edge-a-db", "service-a", "database-1", "connects_to"]));
}

#[test]
fn empty_graph_lists_are_empty_arrays() {
    let (_dir, _store, handler) = setup();
    assert_eq!(
        handler.handle("NODE.LIST", &args(&[GRAPH_ID])).unwrap(),
        Reply::Array(vec![])
    );
    assert_eq!(
        handler.handle("EDGE.LIST", &args(&[GRAPH_ID])).unwrap(),
        Reply::Array(vec![])
    );
}

/// node-a -> node-b, node-a -> node-c, node-b -> node-a
fn populate_neighbors(store: &GraphStore) {
    for (id, node_type) in [
        ("node-a", "service"),
        ("node-b", "service"),
        ("node-c", "database"),
    ] {
        store.create_node(GRAPH_ID, &Node::new(id, node_type)).unwrap();
    }
    store
        .create_edge(GRAPH_ID, &Edge::new("edge-ab", "node-a", "node-b", "depends_on"))
        .unwrap();
    store
        .create_edge(GRAPH_ID, &Edge::new("edge-ac", "node-a", "node-c", "connects_to"))
        .unwrap();
    store
        .create_edge(GRAPH_ID, &Edge::new("edge-ba", "node-b", "node-a", "notifies"))
        .unwrap();
}

#[test]
fn neighbors_outgoing_use_forward_arrows() {
    let (_dir, store, handler) = setup();
    populate_neighbors(&store);

    let items = expect_array(
        handler
            .handle("EDGE.NEIGHBORS", &args(&[GRAPH_ID, "node-a", "out"]))
            .unwrap(),
    );
    assert_eq!(items[0], "2");

    let neighbors = &items[1..];
    assert!(neighbors.contains(&"node-b:service->edge-ab:depends_on->out".to_string()));
    assert!(neighbors.contains(&"node-c:database->edge-ac:connects_to->out".to_string()));
    for item in neighbors {
        assert!(!item.contains("<-"), "outgoing {item} must not use <-");
    }
}

#[test]
fn neighbors_incoming_use_reversed_arrows() {
    let (_dir, store, handler) = setup();
    populate_neighbors(&store);

    let items = expect_array(
        handler
            .handle("EDGE.NEIGHBORS", &args(&[GRAPH_ID, "node-a", "in"]))
            .unwrap(),
    );
    assert_eq!(items[0], "1");
    assert_eq!(items[1], "node-b:service<-edge-ba:notifies<-in");
}

#[test]
fn neighbors_both_mixes_directions_with_count() {
    let (_dir, store, handler) = setup();
    populate_neighbors(&store);

    let items = expect_array(
        handler
            .handle("EDGE.NEIGHBORS", &args(&[GRAPH_ID, "node-a", "both"]))
            .unwrap(),
    );
    assert_eq!(items[0], "3");

    let neighbors = &items[1..];
    let outgoing = neighbors
        .iter()
        .filter(|i| i.contains("->") && !i.contains("<-"))
        .count();
    let incoming = neighbors.iter().filter(|i| i.contains("<-")).count();
    assert_eq!(outgoing, 2);
    assert_eq!(incoming, 1);
}

#[test]
fn neighbors_simple_format_lists_nodes() {
    let (_dir, store, handler) = setup();
    populate_neighbors(&store);

    let mut items = expect_array(
        handler
            .handle(
                "EDGE.NEIGHBORS",
                &args(&[GRAPH_ID, "node-a", "both", "FORMAT", "simple"]),
            )
            .unwrap(),
    );
    items.sort();
    assert_eq!(
        items,
        vec!["node-b:service", "node-b:service", "node-c:database"]
    );
}

#[test]
fn neighbors_rejects_unknown_arguments() {
    let (_dir, store, handler) = setup();
    populate_neighbors(&store);

    assert!(handler
        .handle("EDGE.NEIGHBORS", &args(&[GRAPH_ID, "node-a", "sideways"]))
        .is_err());
    assert!(handler
        .handle(
            "EDGE.NEIGHBORS",
            &args(&[GRAPH_ID, "node-a", "FORMAT", "verbose"]),
        )
        .is_err());
}
