//! Loading compiled clout snapshots.
//!
//! The compiler emits clouts as JSON (or YAML converted to JSON upstream):
//!
//! ```text
//! { "version": "1.0",
//!   "metadata": { "history": [...] },
//!   "properties": { "tosca": {...} },
//!   "vertexes": { "<key>": { "metadata", "properties", "edgesOut": [ {..., "targetID"} ] } } }
//! ```
//!
//! Vertices are inserted in sorted key order so that name scans over the
//! loaded graph are stable.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::{Graph, GraphError, HistoryEntry, Payload, VertexId, CLOUT_VERSION};

#[derive(Debug, Deserialize)]
struct CloutDocument {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    metadata: Payload,
    #[serde(default)]
    properties: Payload,
    #[serde(default)]
    vertexes: BTreeMap<String, VertexDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VertexDocument {
    #[serde(default)]
    metadata: Payload,
    #[serde(default)]
    properties: Payload,
    #[serde(default)]
    edges_out: Vec<EdgeDocument>,
}

#[derive(Debug, Deserialize)]
struct EdgeDocument {
    #[serde(default)]
    metadata: Payload,
    #[serde(default)]
    properties: Payload,
    #[serde(rename = "targetID")]
    target_id: String,
}

fn default_version() -> String {
    CLOUT_VERSION.to_string()
}

impl Graph {
    /// Parse a clout from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, GraphError> {
        let document: CloutDocument = serde_json::from_str(text)?;
        Self::from_document(document)
    }

    /// Parse a clout from an already-decoded JSON value.
    pub fn from_json_value(value: Value) -> Result<Self, GraphError> {
        let document: CloutDocument = serde_json::from_value(value)?;
        Self::from_document(document)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GraphError> {
        let document: CloutDocument = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    fn from_document(document: CloutDocument) -> Result<Self, GraphError> {
        let CloutDocument {
            version,
            mut metadata,
            properties,
            vertexes,
        } = document;

        let mut graph = Graph::with_version(version);

        if let Some(history) = metadata.remove("history") {
            let entries: Vec<HistoryEntry> = serde_json::from_value(history)?;
            graph.history = std::sync::Arc::new(entries);
        }
        graph.metadata = metadata;
        graph.properties = properties;

        // Pass 1: vertices, so that every edge target can be resolved.
        let mut pending: Vec<(VertexId, String, Vec<EdgeDocument>)> =
            Vec::with_capacity(vertexes.len());
        for (key, vertex) in vertexes {
            let id = graph.add_vertex(key.clone(), vertex.metadata, vertex.properties)?;
            pending.push((id, key, vertex.edges_out));
        }

        // Pass 2: edges, in emission order per vertex.
        for (origin, key, edges) in pending {
            for edge in edges {
                let target = graph
                    .vertex_by_key(&edge.target_id)
                    .map(|v| v.id())
                    .ok_or_else(|| GraphError::DanglingTarget {
                        vertex: key.clone(),
                        target: edge.target_id.clone(),
                    })?;
                graph.add_edge(origin, target, edge.metadata, edge.properties)?;
            }
        }

        tracing::debug!(
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            version = %graph.version,
            "loaded clout snapshot"
        );
        Ok(graph)
    }
}
