//! Clout graph: arena storage for compiled orchestration templates
//!
//! A *clout* is the compiled form of a TOSCA service template: vertices for
//! node templates, groups, policies and workflows, joined by typed edges
//! (relationships, group members, policy targets).
//!
//! Storage layout:
//! 1. **Arena ids**: vertices and edges live in flat vectors, addressed by
//!    `VertexId` / `EdgeId` (4 bytes each)
//! 2. **Non-owning edges**: an edge stores its target id; a vertex owns the
//!    ordered list of its outgoing edge ids
//! 3. **JSON payloads**: `metadata` and `properties` are kept as
//!    `serde_json` maps, exactly as the compiler emitted them
//!
//! The graph is read-mostly. The only mutations after loading are
//! [`Graph::set_output_value`] and [`Graph::append_history`].

mod error;
pub mod history;
pub mod outputs;
pub mod snapshot;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub use error::GraphError;
pub use history::HistoryEntry;

/// A `metadata` or `properties` payload.
pub type Payload = serde_json::Map<String, Value>;

// ============================================================================
// Identifiers
// ============================================================================

/// Arena index of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct VertexId(u32);

impl VertexId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Arena index of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct EdgeId(u32);

impl EdgeId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

// ============================================================================
// Vertices and Edges
// ============================================================================

/// A vertex in the clout graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    id: VertexId,
    key: String,
    pub metadata: Payload,
    pub properties: Payload,
    edges_out: Vec<EdgeId>,
}

impl Vertex {
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// The key the compiler assigned to this vertex in the snapshot.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Outgoing edges, in emission order.
    pub fn edges_out(&self) -> &[EdgeId] {
        &self.edges_out
    }

    /// `properties.name`, when it is a string.
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }
}

/// A directed edge. The edge does not own its target; it only names it.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    id: EdgeId,
    origin: VertexId,
    target: VertexId,
    pub metadata: Payload,
    pub properties: Payload,
}

impl Edge {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn origin(&self) -> VertexId {
        self.origin
    }

    pub fn target(&self) -> VertexId {
        self.target
    }

    /// `properties.name`, when it is a string.
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }
}

// ============================================================================
// Graph
// ============================================================================

/// Default clout format version written by the compiler.
pub const CLOUT_VERSION: &str = "1.0";

/// The compiled clout graph.
#[derive(Debug, Clone)]
pub struct Graph {
    version: String,
    /// Graph-level metadata (without `history`, which is held separately).
    pub metadata: Payload,
    /// Graph-level properties; the `tosca` namespace carries inputs/outputs.
    pub properties: Payload,
    history: Arc<Vec<HistoryEntry>>,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    keys: AHashMap<String, VertexId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::with_version(CLOUT_VERSION)
    }

    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            metadata: Payload::new(),
            properties: Payload::new(),
            history: Arc::new(Vec::new()),
            vertices: Vec::new(),
            edges: Vec::new(),
            keys: AHashMap::new(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of vertices stored.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges stored.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Add a vertex under a unique key.
    pub fn add_vertex(
        &mut self,
        key: impl Into<String>,
        metadata: Payload,
        properties: Payload,
    ) -> Result<VertexId, GraphError> {
        let key = key.into();
        if self.keys.contains_key(&key) {
            return Err(GraphError::DuplicateVertex(key));
        }

        let id = VertexId(self.vertices.len() as u32);
        self.keys.insert(key.clone(), id);
        self.vertices.push(Vertex {
            id,
            key,
            metadata,
            properties,
            edges_out: Vec::new(),
        });
        Ok(id)
    }

    /// Add an edge; it is appended to the end of `origin`'s outgoing list.
    pub fn add_edge(
        &mut self,
        origin: VertexId,
        target: VertexId,
        metadata: Payload,
        properties: Payload,
    ) -> Result<EdgeId, GraphError> {
        if target.index() >= self.vertices.len() {
            return Err(GraphError::UnknownVertex(target));
        }
        let id = EdgeId(self.edges.len() as u32);
        let vertex = self
            .vertices
            .get_mut(origin.index())
            .ok_or(GraphError::UnknownVertex(origin))?;
        vertex.edges_out.push(id);

        self.edges.push(Edge {
            id,
            origin,
            target,
            metadata,
            properties,
        });
        Ok(id)
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    /// Look up a vertex by its snapshot key.
    pub fn vertex_by_key(&self, key: &str) -> Option<&Vertex> {
        self.keys.get(key).and_then(|id| self.vertex(*id))
    }

    /// All vertices, in insertion order.
    ///
    /// Snapshots are loaded in sorted key order, so for a fixed snapshot this
    /// order never changes between calls.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    /// Outgoing edges of `vertex`, in emission order.
    pub fn edges_out<'g>(&'g self, vertex: &'g Vertex) -> impl Iterator<Item = &'g Edge> + 'g {
        vertex
            .edges_out
            .iter()
            .filter_map(move |id| self.edges.get(id.index()))
    }

    /// Target vertex of `edge`.
    pub fn target_of(&self, edge: &Edge) -> Option<&Vertex> {
        self.vertex(edge.target)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
