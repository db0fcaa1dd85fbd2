// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Analysis engine integration tests: traversal, paths, cycles, metrics

use std::collections::HashSet;

use tempfile::TempDir;

use pathgraph::{
    AttrValue, Direction, Edge, Graph, GraphAnalyzer, GraphStore, Node, TraversalOptions,
};

const GRAPH_ID: &str = "test-graph";

fn setup() -> (TempDir, GraphStore, GraphAnalyzer) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = GraphStore::open(dir.path().join("db")).expect("failed to open store");
    store
        .create_graph(&Graph::new(GRAPH_ID, "Test Dependency Graph", "Test graph for analysis"))
        .expect("failed to create graph");
    let analyzer = GraphAnalyzer::new(store.clone());
    (dir, store, analyzer)
}

fn node_with_name(id: &str, node_type: &str, name: &str) -> Node {
    let mut node = Node::new(id, node_type);
    node.set_attribute("name", name);
    node
}

/// app -> auth -> {db, cache, logger}; app -> logger; queue -> logger
fn create_sample_graph(store: &GraphStore) {
    let nodes = [
        node_with_name("app", "application", "Main App"),
        node_with_name("auth", "service", "Auth Service"),
        node_with_name("db", "database", "Database"),
        node_with_name("cache", "cache", "Cache"),
        node_with_name("logger", "library", "Logger"),
        node_with_name("queue", "service", "Queue"),
    ];
    for node in &nodes {
        store.create_node(GRAPH_ID, node).unwrap();
    }

    let edges = [
        Edge::new("app-auth", "app", "auth", "depends_on"),
        Edge::new("app-logger", "app", "logger", "depends_on"),
        Edge::new("auth-db", "auth", "db", "depends_on"),
        Edge::new("auth-cache", "auth", "cache", "depends_on"),
        Edge::new("auth-logger", "auth", "logger", "depends_on"),
        Edge::new("queue-logger", "queue", "logger", "depends_on"),
    ];
    for edge in &edges {
        store.create_edge(GRAPH_ID, edge).unwrap();
    }
}

/// a -> b -> c -> a
fn create_cyclic_graph(store: &GraphStore) {
    for id in ["a", "b", "c"] {
        store.create_node(GRAPH_ID, &Node::new(id, "service")).unwrap();
    }
    for (id, from, to) in [("a-b", "a", "b"), ("b-c", "b", "c"), ("c-a", "c", "a")] {
        store
            .create_edge(GRAPH_ID, &Edge::new(id, from, to, "depends_on"))
            .unwrap();
    }
}

fn opts(direction: Direction) -> TraversalOptions {
    TraversalOptions {
        direction,
        ..TraversalOptions::default()
    }
}

#[test]
fn basic_dfs_visits_reachable_nodes() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);

    let result = analyzer
        .depth_first_search(GRAPH_ID, "app", Some(&opts(Direction::Forward)))
        .expect("dfs failed");

    // app, auth, db, cache, logger; queue is unreachable.
    assert_eq!(result.nodes.len(), 5);
    assert!(!result.edges.is_empty());
    assert!(!result.path.is_empty());
    assert_eq!(result.path[0], "app");
    assert!(!result.path.contains(&"queue".to_string()));
}

#[test]
fn dfs_honors_depth_limit() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);

    let options = TraversalOptions {
        max_depth: 1,
        ..TraversalOptions::default()
    };
    let result = analyzer
        .depth_first_search(GRAPH_ID, "app", Some(&options))
        .expect("dfs failed");

    // app plus its direct dependencies auth and logger.
    assert_eq!(result.nodes.len(), 3);
}

#[test]
fn dfs_node_type_filter_excludes_but_still_expands() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);

    let options = TraversalOptions {
        node_types: vec!["service".to_string()],
        ..TraversalOptions::default()
    };
    let result = analyzer
        .depth_first_search(GRAPH_ID, "app", Some(&options))
        .expect("dfs failed");

    for node in &result.nodes {
        assert_eq!(node.node_type, "service");
    }
    // app itself is filtered out, yet traversal expanded through it.
    assert!(result.nodes.iter().any(|n| n.id == "auth"));
}

#[test]
fn dfs_edge_type_filter() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);
    store
        .create_edge(GRAPH_ID, &Edge::new("app-queue", "app", "queue", "notifies"))
        .unwrap();

    let options = TraversalOptions {
        edge_types: vec!["depends_on".to_string()],
        ..TraversalOptions::default()
    };
    let result = analyzer
        .depth_first_search(GRAPH_ID, "app", Some(&options))
        .expect("dfs failed");

    for edge in &result.edges {
        assert_eq!(edge.edge_type, "depends_on");
    }
    assert!(!result.path.contains(&"queue".to_string()));
}

#[test]
fn dfs_backward_finds_dependents() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);

    let result = analyzer
        .depth_first_search(GRAPH_ID, "logger", Some(&opts(Direction::Backward)))
        .expect("dfs failed");

    // logger plus app, auth, queue.
    assert_eq!(result.nodes.len(), 4);
}

#[test]
fn dfs_from_missing_node_fails() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);
    assert!(analyzer
        .depth_first_search(GRAPH_ID, "non-existent", None)
        .is_err());
}

#[test]
fn dfs_stop_condition_reports_but_does_not_expand() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);

    let options = TraversalOptions {
        stop_condition: Some(Box::new(|node: &Node| node.id == "auth")),
        ..TraversalOptions::default()
    };
    let result = analyzer
        .depth_first_search(GRAPH_ID, "app", Some(&options))
        .expect("dfs failed");

    // auth is reported but its dependencies are not reached through it.
    assert!(result.path.contains(&"auth".to_string()));
    assert!(!result.path.contains(&"db".to_string()));
    assert!(!result.path.contains(&"cache".to_string()));
}

#[test]
fn transitive_dependencies_exclude_start() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);

    let deps = analyzer
        .all_dependencies(GRAPH_ID, "app", Some(&opts(Direction::Forward)))
        .expect("dependencies failed");
    assert_eq!(deps.len(), 4);
    assert!(!deps.iter().any(|n| n.id == "app"));

    let dependents = analyzer
        .all_dependents(GRAPH_ID, "logger", None)
        .expect("dependents failed");
    assert_eq!(dependents.len(), 3);
    assert!(!dependents.iter().any(|n| n.id == "logger"));
}

#[test]
fn filtered_dependencies_only_return_matching_types() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);

    let options = TraversalOptions {
        node_types: vec!["service".to_string()],
        ..TraversalOptions::default()
    };
    let deps = analyzer
        .all_dependencies(GRAPH_ID, "app", Some(&options))
        .expect("dependencies failed");
    for dep in &deps {
        assert_eq!(dep.node_type, "service");
    }
}

#[test]
fn shortest_path_basics() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);

    let result = analyzer
        .shortest_path(GRAPH_ID, "app", "db", None)
        .expect("shortest path failed");
    assert_eq!(result.path, vec!["app", "auth", "db"]);
    assert_eq!(result.length, 2);
    assert_eq!(result.edges, vec!["app-auth", "auth-db"]);

    // No forward path from db back to app.
    assert!(analyzer.shortest_path(GRAPH_ID, "db", "app", None).is_err());

    // Source equal to target is a zero-length path.
    let same = analyzer
        .shortest_path(GRAPH_ID, "app", "app", None)
        .expect("same-node path failed");
    assert_eq!(same.path, vec!["app"]);
    assert_eq!(same.length, 0);

    assert!(analyzer.shortest_path(GRAPH_ID, "non-existent", "app", None).is_err());
    assert!(analyzer.shortest_path(GRAPH_ID, "app", "non-existent", None).is_err());
}

#[test]
fn all_shortest_paths_returns_every_minimal_path() {
    let (_dir, store, analyzer) = setup();
    for (id, node_type) in [
        ("start", "service"),
        ("mid1", "service"),
        ("mid2", "service"),
        ("end", "database"),
    ] {
        store.create_node(GRAPH_ID, &Node::new(id, node_type)).unwrap();
    }
    for (id, from, to, edge_type) in [
        ("e1", "start", "mid1", "calls"),
        ("e2", "start", "mid2", "calls"),
        ("e3", "mid1", "end", "writes_to"),
        ("e4", "mid2", "end", "writes_to"),
    ] {
        store
            .create_edge(GRAPH_ID, &Edge::new(id, from, to, edge_type))
            .unwrap();
    }

    let all_paths = analyzer
        .all_shortest_paths(GRAPH_ID, "start", "end")
        .expect("all shortest paths failed");
    assert_eq!(all_paths.len(), 2);
    for path in &all_paths {
        assert_eq!(path.length, 2);
        assert_eq!(path.path[0], "start");
        assert_eq!(path.path[2], "end");
    }
}

#[test]
fn acyclic_graph_has_no_cycles() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);
    assert!(!analyzer.has_cycles(GRAPH_ID, None).unwrap());
}

#[test]
fn cyclic_graph_has_cycles() {
    let (_dir, store, analyzer) = setup();
    create_cyclic_graph(&store);
    assert!(analyzer.has_cycles(GRAPH_ID, None).unwrap());
}

#[test]
fn self_loop_is_a_cycle() {
    let (_dir, store, analyzer) = setup();
    store.create_node(GRAPH_ID, &Node::new("self", "service")).unwrap();
    store
        .create_edge(GRAPH_ID, &Edge::new("self-loop", "self", "self", "depends_on"))
        .unwrap();
    assert!(analyzer.has_cycles(GRAPH_ID, None).unwrap());
}

#[test]
fn cycles_deduplicate_under_rotation_and_honor_edge_filters() {
    let (_dir, store, analyzer) = setup();
    for (id, node_type) in [("a", "service"), ("b", "service"), ("c", "database")] {
        store.create_node(GRAPH_ID, &Node::new(id, node_type)).unwrap();
    }
    for (id, from, to, edge_type) in [
        ("ab", "a", "b", "calls"),
        ("ba", "b", "a", "calls"),
        ("bc", "b", "c", "writes_to"),
    ] {
        store
            .create_edge(GRAPH_ID, &Edge::new(id, from, to, edge_type))
            .unwrap();
    }

    // One unique cycle, rotated to start at its smallest node.
    let cycles = analyzer.find_all_cycles(GRAPH_ID, None).unwrap();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0], vec!["a", "b", "a"]);

    let with_cycle = TraversalOptions {
        edge_types: vec!["calls".to_string()],
        ..TraversalOptions::default()
    };
    assert!(!analyzer.find_all_cycles(GRAPH_ID, Some(&with_cycle)).unwrap().is_empty());

    let without_cycle = TraversalOptions {
        edge_types: vec!["writes_to".to_string()],
        ..TraversalOptions::default()
    };
    assert!(analyzer.find_all_cycles(GRAPH_ID, Some(&without_cycle)).unwrap().is_empty());
}

#[test]
fn graph_stats_aggregate() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);

    let stats = analyzer.graph_stats(GRAPH_ID, None).expect("stats failed");
    assert_eq!(stats.node_count, 6);
    assert_eq!(stats.edge_count, 6);
    assert_eq!(stats.root_node_count, 2); // app and queue
    assert_eq!(stats.leaf_node_count, 3); // db, cache, logger
    assert_eq!(stats.orphan_node_count, 0);
    assert!(!stats.has_cycles);
    assert_eq!(stats.max_depth, 2);
    assert_eq!(stats.connected_components, 1);

    assert_eq!(stats.node_type_count["application"], 1);
    assert_eq!(stats.node_type_count["service"], 2);
    assert_eq!(stats.node_type_count["database"], 1);
    assert_eq!(stats.node_type_count["cache"], 1);
    assert_eq!(stats.node_type_count["library"], 1);
    assert_eq!(stats.edge_type_count["depends_on"], 6);
}

#[test]
fn node_classification() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);

    let roots = analyzer.root_nodes(GRAPH_ID, None).unwrap();
    let root_ids: HashSet<&str> = roots.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(root_ids, HashSet::from(["app", "queue"]));

    let leaves = analyzer.leaf_nodes(GRAPH_ID, None).unwrap();
    let leaf_ids: HashSet<&str> = leaves.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(leaf_ids, HashSet::from(["db", "cache", "logger"]));

    assert!(analyzer.orphan_nodes(GRAPH_ID, None).unwrap().is_empty());

    let mut orphan = Node::new("orphan", "service");
    orphan.set_attribute("name", "Orphan");
    store.create_node(GRAPH_ID, &orphan).unwrap();

    let orphans = analyzer.orphan_nodes(GRAPH_ID, None).unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id, "orphan");
}

#[test]
fn root_node_type_filter_is_accepted_but_ignored() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);
    store.create_node(GRAPH_ID, &Node::new("orphan", "service")).unwrap();

    let options = TraversalOptions {
        node_types: vec!["application".to_string()],
        ..TraversalOptions::default()
    };
    // Only the edge-type filter applies to root classification; all three
    // roots come back despite the node-type filter.
    let roots = analyzer.root_nodes(GRAPH_ID, Some(&options)).unwrap();
    assert_eq!(roots.len(), 3);
    assert_eq!(roots[0].id, "app");
}

#[test]
fn orphan_edge_type_filter_is_accepted_but_ignored() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);

    // Every edge is depends_on; filtering by a type that matches nothing
    // would make every node an orphan if the filter applied. It does not.
    let options = TraversalOptions {
        edge_types: vec!["no_such_type".to_string()],
        ..TraversalOptions::default()
    };
    assert!(analyzer.orphan_nodes(GRAPH_ID, Some(&options)).unwrap().is_empty());
}

#[test]
fn max_depth_over_simple_paths() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);
    assert_eq!(analyzer.max_depth(GRAPH_ID, None).unwrap(), 2);
}

#[test]
fn connected_components_counts_weak_components() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);
    // logger links the queue into the app component.
    assert_eq!(analyzer.connected_component_count(GRAPH_ID, None).unwrap(), 1);

    store.create_node(GRAPH_ID, &Node::new("island", "service")).unwrap();
    assert_eq!(analyzer.connected_component_count(GRAPH_ID, None).unwrap(), 2);
}

#[test]
fn degree_centrality_by_direction() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);

    let both = analyzer
        .degree_centrality(GRAPH_ID, None, Direction::Both)
        .unwrap();
    assert_eq!(both["app"], 2);
    assert_eq!(both["auth"], 4); // 1 in, 3 out
    assert_eq!(both["logger"], 3); // 3 in

    let incoming = analyzer
        .degree_centrality(GRAPH_ID, Some("logger"), Direction::Backward)
        .unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming["logger"], 3);

    let outgoing = analyzer
        .degree_centrality(GRAPH_ID, Some("logger"), Direction::Forward)
        .unwrap();
    assert_eq!(outgoing["logger"], 0);

    assert!(analyzer
        .degree_centrality(GRAPH_ID, Some("missing"), Direction::Both)
        .is_err());
}

#[test]
fn empty_graph_edge_cases() {
    let (_dir, _store, analyzer) = setup();

    assert!(analyzer.depth_first_search(GRAPH_ID, "non-existent", None).is_err());

    let stats = analyzer.graph_stats(GRAPH_ID, None).expect("stats on empty graph");
    assert_eq!(stats.node_count, 0);
    assert_eq!(stats.edge_count, 0);
    assert!(!stats.has_cycles);

    assert!(analyzer
        .depth_first_search("non-existent-graph", "node", None)
        .is_err());
}

#[test]
fn nil_options_use_defaults() {
    let (_dir, store, analyzer) = setup();
    create_sample_graph(&store);

    let result = analyzer
        .depth_first_search(GRAPH_ID, "app", None)
        .expect("dfs with default options failed");
    assert!(!result.nodes.is_empty());
}

#[test]
fn attribute_scan_matches_structurally() {
    let (_dir, store, _analyzer) = setup();
    create_sample_graph(&store);

    let named = store
        .find_nodes_by_attribute(GRAPH_ID, "name", &AttrValue::from("Auth Service"))
        .unwrap();
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].id, "auth");
}
