//! Calling context and entity references.

use std::fmt;

use cloutpath_graph::VertexId;

/// Per-evaluation scope for `SELF`, `SOURCE`, `TARGET` and `HOST`.
///
/// Created by the expression evaluator for one call and dropped afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    pub site: Option<VertexId>,
    pub source: Option<VertexId>,
    pub target: Option<VertexId>,
}

impl CallContext {
    /// A context with no references; only named entities resolve in it.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn at_site(site: VertexId) -> Self {
        Self {
            site: Some(site),
            ..Self::default()
        }
    }

    pub fn with_site(mut self, site: VertexId) -> Self {
        self.site = Some(site);
        self
    }

    pub fn with_source(mut self, source: VertexId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_target(mut self, target: VertexId) -> Self {
        self.target = Some(target);
        self
    }
}

/// A reference to a modelable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef<'a> {
    /// `SELF`
    Site,
    /// `SOURCE`
    Source,
    /// `TARGET`
    Target,
    /// `HOST`
    Host,
    /// A node template name.
    Named(&'a str),
}

impl<'a> EntityRef<'a> {
    pub fn parse(name: &'a str) -> Self {
        match name {
            "SELF" => EntityRef::Site,
            "SOURCE" => EntityRef::Source,
            "TARGET" => EntityRef::Target,
            "HOST" => EntityRef::Host,
            other => EntityRef::Named(other),
        }
    }

    /// The name as written in an expression.
    pub fn as_str(&self) -> &'a str {
        match self {
            EntityRef::Site => "SELF",
            EntityRef::Source => "SOURCE",
            EntityRef::Target => "TARGET",
            EntityRef::Host => "HOST",
            EntityRef::Named(name) => name,
        }
    }
}

impl<'a> From<&'a str> for EntityRef<'a> {
    fn from(name: &'a str) -> Self {
        EntityRef::parse(name)
    }
}

impl fmt::Display for EntityRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
