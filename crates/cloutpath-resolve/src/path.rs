//! Nested value resolution: `entity [capability | relationship index] key ...`
//!
//! The second segment is a selector when it names a capability of the node
//! template, or a relationship followed by its occurrence index among the
//! node's relationships of that name. Otherwise it is already the first key.
//!
//! ```text
//! [SELF, port]                         -> node.properties.port
//! [SELF, endpoint, port]               -> node.capabilities.endpoint.properties.port
//! [SELF, db, 1, timeout]               -> second "db" relationship .properties.timeout
//! [SELF, settings, limits, cpu]        -> node.properties.settings.limits.cpu
//! ```

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

use crate::classify::ElementKind;
use crate::context::CallContext;
use crate::error::{ResolveError, Result};
use crate::host::ScriptHost;
use crate::Resolver;

/// One segment of a nested value path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    /// A relationship occurrence index, or a sequence index while descending.
    Index(usize),
}

impl PathSegment {
    /// Parse a textual segment; all-digit text becomes an index.
    pub fn parse(text: &str) -> Self {
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = text.parse() {
                return PathSegment::Index(index);
            }
        }
        PathSegment::Key(text.to_string())
    }

    /// Parse a dotted path such as `web.endpoint.port`.
    pub fn parse_dotted(path: &str) -> Vec<Self> {
        path.split('.').map(Self::parse).collect()
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) => Some(key),
            PathSegment::Index(_) => None,
        }
    }

    fn key_text(&self) -> Cow<'_, str> {
        match self {
            PathSegment::Key(key) => Cow::Borrowed(key),
            PathSegment::Index(index) => Cow::Owned(index.to_string()),
        }
    }

    /// Step into `value`: objects by key, sequences by index.
    fn descend<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        match (value, self) {
            (Value::Object(map), segment) => map.get(segment.key_text().as_ref()),
            (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
            (Value::Array(items), PathSegment::Key(key)) => {
                key.parse::<usize>().ok().and_then(|index| items.get(index))
            }
            _ => None,
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

fn join(segments: &[PathSegment]) -> String {
    segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

impl<'g, H: ScriptHost + ?Sized> Resolver<'g, H> {
    /// `get_property`: nested lookup through `properties`.
    pub fn get_property(&self, context: &CallContext, args: &[PathSegment]) -> Result<Value> {
        self.resolve_nested_value(context, "property", "properties", args)
    }

    /// `get_attribute`: nested lookup through `attributes`.
    pub fn get_attribute(&self, context: &CallContext, args: &[PathSegment]) -> Result<Value> {
        self.resolve_nested_value(context, "attribute", "attributes", args)
    }

    /// Resolve `args` to a value.
    ///
    /// `singular` names the looked-up thing in error messages; `plural` is the
    /// mapping read from the node template, capability or relationship. The
    /// first found value passes through the host's `coerce` before the
    /// remaining segments are followed.
    pub fn resolve_nested_value(
        &self,
        context: &CallContext,
        singular: &str,
        plural: &str,
        args: &[PathSegment],
    ) -> Result<Value> {
        if args.len() < 2 {
            return Err(ResolveError::Argument(
                "must have at least 2 arguments".to_string(),
            ));
        }

        let vertex = self.resolve_named_entity(context, &args[0].key_text())?;
        let node = &vertex.properties;
        let node_name = vertex.name().unwrap_or_default();

        let mut value = node.get(plural);
        let mut noun = Cow::Borrowed(singular);
        let mut a = 1;

        let selector = args[1].as_key();
        let capability = selector.and_then(|name| {
            node.get("capabilities")
                .and_then(Value::as_object)
                .and_then(|capabilities| capabilities.get(name))
                .map(|capability| (name, capability))
        });

        if let Some((name, capability)) = capability {
            value = capability.get(plural);
            noun = Cow::Owned(format!("capability {name:?} {singular}"));
            a += 1;
        } else if let (Some(name), Some(PathSegment::Index(occurrence))) = (selector, args.get(2)) {
            let classifier = self.classifier();
            let relationship = self
                .graph
                .edges_out(vertex)
                .filter(|edge| classifier.is_model_element(*edge, Some(ElementKind::Relationship)))
                .filter(|edge| edge.name() == Some(name))
                .nth(*occurrence);
            if let Some(relationship) = relationship {
                value = relationship.properties.get(plural);
                noun = Cow::Owned(format!("relationship {name:?} {singular}"));
                a += 2;
            }
        }

        let Some(key) = args.get(a) else {
            return Err(ResolveError::not_found(format!(
                "{noun} name not found in {node_name:?} for {:?}",
                join(args)
            )));
        };
        tracing::trace!(node = node_name, %key, "resolving {noun}");

        let found = value.and_then(|value| key.descend(value)).ok_or_else(|| {
            ResolveError::not_found(format!(
                "{noun} {:?} not found in {node_name:?}",
                key.to_string()
            ))
        })?;

        let coerced = self.host.coerce(found)?;
        let mut current = &coerced;
        for i in a + 1..args.len() {
            current = args[i].descend(current).ok_or_else(|| {
                ResolveError::not_found(format!(
                    "nested {noun} {:?} not found in {node_name:?}",
                    join(&args[a..=i])
                ))
            })?;
        }
        Ok(current.clone())
    }
}
