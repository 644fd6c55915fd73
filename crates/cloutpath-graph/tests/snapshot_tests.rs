//! Snapshot loading and graph mutation tests

use cloutpath_graph::*;
use proptest::prelude::*;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

fn sample_clout() -> serde_json::Value {
    json!({
        "version": "1.0",
        "metadata": {
            "history": [
                { "timestamp": "2024-03-01T10:00:00Z", "description": "compile" }
            ]
        },
        "properties": {
            "tosca": {
                "outputs": {
                    "port": { "$type": { "type": { "name": "integer" } } }
                }
            }
        },
        "vertexes": {
            "0001": {
                "metadata": { "puccini": { "version": "1.0", "kind": "NodeTemplate" } },
                "properties": { "name": "web" },
                "edgesOut": [
                    {
                        "metadata": { "puccini": { "version": "1.0", "kind": "Relationship" } },
                        "properties": { "name": "host" },
                        "targetID": "0002"
                    }
                ]
            },
            "0002": {
                "metadata": { "puccini": { "version": "1.0", "kind": "NodeTemplate" } },
                "properties": { "name": "server" }
            }
        }
    })
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clout.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(sample_clout().to_string().as_bytes())
        .unwrap();
    drop(file);

    let graph = Graph::from_path(&path).unwrap();
    assert_eq!(graph.vertex_count(), 2);
    assert_eq!(graph.edge_count(), 1);

    let web = graph.vertex_by_key("0001").unwrap();
    assert_eq!(web.name(), Some("web"));
    assert_eq!(web.edges_out().len(), 1);

    let edge = graph.edges_out(web).next().unwrap();
    assert_eq!(edge.origin(), web.id());
    assert_eq!(graph.target_of(edge).unwrap().key(), "0002");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Graph::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, GraphError::Io(_)));
}

#[test]
fn test_invalid_json_is_reported() {
    let err = Graph::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, GraphError::Json(_)));
}

#[test]
fn test_output_and_history_mutations() {
    let mut graph = Graph::from_json_value(sample_clout()).unwrap();

    let loaded = graph.history();
    assert!(graph.set_output_value("port", "8080"));
    graph.append_history("set output port");

    assert_eq!(graph.output("port").unwrap()["$value"], json!(8080));
    assert_eq!(loaded.len(), 1);
    assert_eq!(graph.history().len(), 2);
    assert!(!Arc::ptr_eq(&loaded, &graph.history()));
}

proptest! {
    #[test]
    fn prop_history_snapshots_are_frozen(descriptions in prop::collection::vec("[a-z]{1,8}", 1..12)) {
        let mut graph = Graph::new();
        let mut snapshots = Vec::new();
        for description in &descriptions {
            snapshots.push(graph.history());
            graph.append_history(description.clone());
        }

        for (i, snapshot) in snapshots.iter().enumerate() {
            prop_assert_eq!(snapshot.len(), i);
        }
        let finished = graph.history();
        let recorded: Vec<_> = finished.iter().map(|e| e.description.clone()).collect();
        prop_assert_eq!(recorded, descriptions);
    }

    #[test]
    fn prop_vertex_order_is_sorted_by_key(keys in prop::collection::btree_set("[a-z0-9]{1,6}", 0..20)) {
        let vertexes: serde_json::Map<String, serde_json::Value> = keys
            .iter()
            .map(|k| (k.clone(), json!({ "properties": { "name": k } })))
            .collect();
        let graph = Graph::from_json_value(json!({ "vertexes": vertexes })).unwrap();

        let loaded: Vec<String> = graph.vertices().map(|v| v.key().to_string()).collect();
        let expected: Vec<String> = keys.into_iter().collect();
        prop_assert_eq!(loaded, expected);
    }
}
