//! Entity classification: which vertices and edges are model elements.
//!
//! The compiler stamps every element it emits with a marker object in its
//! metadata:
//!
//! ```text
//! metadata: { puccini: { version: "1.0", kind: "NodeTemplate" } }
//! ```
//!
//! Elements without the marker (or with a different version) are not model
//! elements. That is never an error; they are simply invisible to resolution.

use std::fmt;
use std::str::FromStr;

use cloutpath_graph::{Edge, Payload, Vertex};
use serde_json::Value;

/// Metadata key of the element marker.
pub const ELEMENT_MARKER: &str = "puccini";

/// Marker version understood by this engine.
pub const ELEMENT_VERSION: &str = "1.0";

/// Kinds the compiler writes into the element marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    NodeTemplate,
    Relationship,
    Group,
    Member,
    Policy,
    NodeTemplateTarget,
    GroupTarget,
    Workflow,
    WorkflowStep,
    WorkflowActivity,
    OnSuccess,
    OnFailure,
    Substitution,
    CapabilityMapping,
    RequirementMapping,
    PropertyMapping,
    InterfaceMapping,
}

impl ElementKind {
    pub const ALL: [ElementKind; 17] = [
        ElementKind::NodeTemplate,
        ElementKind::Relationship,
        ElementKind::Group,
        ElementKind::Member,
        ElementKind::Policy,
        ElementKind::NodeTemplateTarget,
        ElementKind::GroupTarget,
        ElementKind::Workflow,
        ElementKind::WorkflowStep,
        ElementKind::WorkflowActivity,
        ElementKind::OnSuccess,
        ElementKind::OnFailure,
        ElementKind::Substitution,
        ElementKind::CapabilityMapping,
        ElementKind::RequirementMapping,
        ElementKind::PropertyMapping,
        ElementKind::InterfaceMapping,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::NodeTemplate => "NodeTemplate",
            ElementKind::Relationship => "Relationship",
            ElementKind::Group => "Group",
            ElementKind::Member => "Member",
            ElementKind::Policy => "Policy",
            ElementKind::NodeTemplateTarget => "NodeTemplateTarget",
            ElementKind::GroupTarget => "GroupTarget",
            ElementKind::Workflow => "Workflow",
            ElementKind::WorkflowStep => "WorkflowStep",
            ElementKind::WorkflowActivity => "WorkflowActivity",
            ElementKind::OnSuccess => "OnSuccess",
            ElementKind::OnFailure => "OnFailure",
            ElementKind::Substitution => "Substitution",
            ElementKind::CapabilityMapping => "CapabilityMapping",
            ElementKind::RequirementMapping => "RequirementMapping",
            ElementKind::PropertyMapping => "PropertyMapping",
            ElementKind::InterfaceMapping => "InterfaceMapping",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown element kind {s:?}"))
    }
}

/// Anything that carries element metadata.
pub trait ModelElement {
    fn metadata(&self) -> &Payload;
}

impl ModelElement for Vertex {
    fn metadata(&self) -> &Payload {
        &self.metadata
    }
}

impl ModelElement for Edge {
    fn metadata(&self) -> &Payload {
        &self.metadata
    }
}

/// Marker-aware classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier<'a> {
    marker: &'a str,
    version: &'a str,
}

impl Classifier<'static> {
    /// The `puccini`/`1.0` marker.
    pub const STANDARD: Classifier<'static> = Classifier {
        marker: ELEMENT_MARKER,
        version: ELEMENT_VERSION,
    };
}

impl<'a> Classifier<'a> {
    pub fn new(marker: &'a str, version: &'a str) -> Self {
        Self { marker, version }
    }

    /// The raw kind string of a marked element of the supported version.
    fn marked_kind<'e>(&self, element: &'e (impl ModelElement + ?Sized)) -> Option<&'e str> {
        let marker = element.metadata().get(self.marker)?.as_object()?;
        if marker.get("version").and_then(Value::as_str) != Some(self.version) {
            return None;
        }
        Some(marker.get("kind").and_then(Value::as_str).unwrap_or_default())
    }

    pub fn is_model_element(
        &self,
        element: &(impl ModelElement + ?Sized),
        kind: Option<ElementKind>,
    ) -> bool {
        match (self.marked_kind(element), kind) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(found), Some(kind)) => found == kind.as_str(),
        }
    }

    /// Kind of a marked element, when it is one this engine knows.
    pub fn element_kind(&self, element: &(impl ModelElement + ?Sized)) -> Option<ElementKind> {
        self.marked_kind(element)?.parse().ok()
    }

    pub fn is_node_template(&self, vertex: &Vertex, type_name: Option<&str>) -> bool {
        if !self.is_model_element(vertex, Some(ElementKind::NodeTemplate)) {
            return false;
        }
        match type_name {
            None => true,
            Some(type_name) => vertex
                .properties
                .get("types")
                .and_then(Value::as_object)
                .is_some_and(|types| types.contains_key(type_name)),
        }
    }
}

/// [`Classifier::is_model_element`] with the standard marker.
pub fn is_model_element(element: &(impl ModelElement + ?Sized), kind: Option<ElementKind>) -> bool {
    Classifier::STANDARD.is_model_element(element, kind)
}

/// [`Classifier::is_node_template`] with the standard marker.
pub fn is_node_template(vertex: &Vertex, type_name: Option<&str>) -> bool {
    Classifier::STANDARD.is_node_template(vertex, type_name)
}

/// [`Classifier::element_kind`] with the standard marker.
pub fn element_kind(element: &(impl ModelElement + ?Sized)) -> Option<ElementKind> {
    Classifier::STANDARD.element_kind(element)
}
