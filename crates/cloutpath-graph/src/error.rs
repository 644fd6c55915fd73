use crate::VertexId;

/// Errors raised while building or loading a clout graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("invalid clout JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read clout: {0}")]
    Io(#[from] std::io::Error),

    #[error("duplicate vertex key {0:?}")]
    DuplicateVertex(String),

    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),

    #[error("edge of vertex {vertex:?} targets unknown vertex {target:?}")]
    DanglingTarget { vertex: String, target: String },
}
