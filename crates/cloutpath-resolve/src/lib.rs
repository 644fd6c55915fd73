//! Model resolution engine for compiled clout graphs
//!
//! Given a [`Graph`] and a symbolic reference, the engine resolves a concrete
//! vertex, set of vertices, or value:
//!
//! - **Entity classification** ([`classify`]): which vertices and edges are
//!   model elements, and of which kind
//! - **Relation navigation** ([`navigate`]): `SELF`, `SOURCE`, `TARGET`,
//!   `HOST`, policy targets and group members
//! - **Path resolution** ([`path`]): `entity.capability-or-relationship.key...`
//!   lookups behind `get_property` / `get_attribute`
//! - **Value utilities** ([`values`]): comparable projection, length,
//!   ordering and structural equality over tagged values
//!
//! The graph is borrowed, never owned. Delegated comparison and value
//! coercion go through a [`ScriptHost`].
//!
//! ```no_run
//! use cloutpath_graph::Graph;
//! use cloutpath_resolve::{CallContext, PassthroughHost, PathSegment, Resolver};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = Graph::from_path("clout.json")?;
//! let resolver = Resolver::new(&graph, &PassthroughHost);
//! let path = [PathSegment::from("web"), PathSegment::from("port")];
//! let port = resolver.get_property(&CallContext::empty(), &path)?;
//! println!("{port}");
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod context;
mod error;
pub mod host;
pub mod navigate;
pub mod path;
pub mod values;

use std::cmp::Ordering;

use cloutpath_graph::Graph;
use serde_json::Value;

pub use classify::{
    element_kind, is_model_element, is_node_template, Classifier, ElementKind, ModelElement,
};
pub use config::ResolverConfig;
pub use context::{CallContext, EntityRef};
pub use error::{HostError, ResolveError, Result};
pub use host::{ComparerRegistry, PassthroughHost, ScriptHost, ToscaVersion};
pub use path::PathSegment;
pub use values::{comparable, deep_equal, in_range, length, Scalar, TaggedValue};

/// Resolution over one borrowed graph and script host.
pub struct Resolver<'g, H: ScriptHost + ?Sized = PassthroughHost> {
    graph: &'g Graph,
    host: &'g H,
    config: ResolverConfig,
}

impl<'g, H: ScriptHost + ?Sized> Resolver<'g, H> {
    pub fn new(graph: &'g Graph, host: &'g H) -> Self {
        Self {
            graph,
            host,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn host(&self) -> &'g H {
        self.host
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn classifier(&self) -> Classifier<'_> {
        self.config.classifier()
    }

    /// [`values::compare`] with this resolver's host.
    pub fn compare(&self, left: &Value, right: &Value) -> Result<Ordering> {
        values::compare(self.host, left, right)
    }

    /// Equality for constraint evaluation: delegated values are equal when
    /// their comparer says so, everything else uses [`deep_equal`].
    pub fn equal(&self, left: &Value, right: &Value) -> Result<bool> {
        let delegated = TaggedValue::classify(left).comparer().is_some()
            || TaggedValue::classify(right).comparer().is_some();
        if delegated {
            return Ok(self.compare(left, right)? == Ordering::Equal);
        }
        Ok(deep_equal(left, right))
    }

    /// [`values::in_range`] with this resolver's host.
    pub fn in_range(&self, value: &Value, lower: &Value, upper: &Value) -> Result<bool> {
        values::in_range(self.host, value, lower, upper)
    }
}
