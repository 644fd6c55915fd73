//! Relation navigation: context entities, hosts, policy targets, group members.

use cloutpath_graph::{Edge, Payload, Vertex, VertexId};
use serde_json::Value;

use crate::classify::ElementKind;
use crate::context::{CallContext, EntityRef};
use crate::error::{ResolveError, Result};
use crate::host::ScriptHost;
use crate::Resolver;

impl<'g, H: ScriptHost + ?Sized> Resolver<'g, H> {
    /// Resolve an entity name (`SELF`, `SOURCE`, `TARGET`, `HOST` or a node
    /// template name) to a node template vertex.
    pub fn resolve_named_entity(&self, context: &CallContext, name: &str) -> Result<&'g Vertex> {
        self.resolve_entity(context, EntityRef::parse(name))
    }

    /// Resolve an entity reference to a node template vertex.
    ///
    /// Named lookups return the first node template, in graph order, whose
    /// `properties.name` matches.
    pub fn resolve_entity(&self, context: &CallContext, entity: EntityRef<'_>) -> Result<&'g Vertex> {
        let classifier = self.classifier();
        let candidate = match entity {
            EntityRef::Site => self.context_vertex(context.site, entity)?,
            EntityRef::Source => self.context_vertex(context.source, entity)?,
            EntityRef::Target => self.context_vertex(context.target, entity)?,
            EntityRef::Host => match self.context_vertex(context.site, entity)? {
                Some(site) => Some(self.host_of(site)?),
                None => None,
            },
            EntityRef::Named(name) => self
                .graph
                .vertices()
                .find(|v| classifier.is_node_template(v, None) && v.name() == Some(name)),
        };

        match candidate {
            Some(vertex) if classifier.is_node_template(vertex, None) => {
                tracing::debug!(entity = %entity, vertex = %vertex.id(), "resolved entity");
                Ok(vertex)
            }
            _ => Err(ResolveError::not_found(format!(
                "{:?} node template not found",
                entity.as_str()
            ))),
        }
    }

    /// The vertex a context slot points at; a missing slot is a context error,
    /// a dangling one resolves to nothing.
    fn context_vertex(
        &self,
        slot: Option<VertexId>,
        entity: EntityRef<'_>,
    ) -> Result<Option<&'g Vertex>> {
        let id = slot.ok_or_else(|| ResolveError::context(entity.as_str()))?;
        Ok(self.graph.vertex(id))
    }

    fn vertex(&self, id: VertexId) -> Result<&'g Vertex> {
        self.graph
            .vertex(id)
            .ok_or_else(|| ResolveError::not_found(format!("vertex {id} not found")))
    }

    /// The host of `vertex`: the target of its first outgoing relationship
    /// having a type whose `metadata.role` is the host role.
    ///
    /// One hop only; the host's own host is not consulted.
    pub fn resolve_host(&self, vertex: VertexId) -> Result<&'g Vertex> {
        self.host_of(self.vertex(vertex)?)
    }

    fn host_of(&self, vertex: &'g Vertex) -> Result<&'g Vertex> {
        let classifier = self.classifier();
        for edge in self.graph.edges_out(vertex) {
            if !classifier.is_model_element(edge, Some(ElementKind::Relationship)) {
                continue;
            }
            if self.has_host_role(edge) {
                if let Some(host) = self.graph.target_of(edge) {
                    tracing::debug!(vertex = %vertex.id(), host = %host.id(), "resolved host");
                    return Ok(host);
                }
            }
        }

        if classifier.is_node_template(vertex, None) {
            Err(ResolveError::not_found(format!(
                "\"HOST\" not found for node template {:?}",
                vertex.name().unwrap_or_default()
            )))
        } else {
            Err(ResolveError::not_found("\"HOST\" not found"))
        }
    }

    fn has_host_role(&self, edge: &Edge) -> bool {
        let role = self.config.host_role.as_str();
        edge.properties
            .get("types")
            .and_then(Value::as_object)
            .is_some_and(|types| {
                types.values().any(|definition| {
                    definition
                        .get("metadata")
                        .and_then(|metadata| metadata.get("role"))
                        .and_then(Value::as_str)
                        == Some(role)
                })
            })
    }

    /// Node templates a policy applies to, in discovery order.
    ///
    /// Direct `NodeTemplateTarget` edges contribute their target; each
    /// `GroupTarget` edge contributes the group's members, skipping members
    /// whose `name` is already present.
    pub fn resolve_policy_targets(&self, policy: VertexId) -> Vec<&'g Payload> {
        let Some(policy) = self.graph.vertex(policy) else {
            return Vec::new();
        };
        let classifier = self.classifier();

        let mut targets: Vec<&'g Payload> = Vec::new();
        for edge in self.graph.edges_out(policy) {
            let Some(target) = self.graph.target_of(edge) else {
                continue;
            };
            if classifier.is_model_element(edge, Some(ElementKind::NodeTemplateTarget)) {
                targets.push(&target.properties);
            } else if classifier.is_model_element(edge, Some(ElementKind::GroupTarget)) {
                for member in self.members_of(target) {
                    let name = member.get("name");
                    if !targets.iter().any(|t| t.get("name") == name) {
                        targets.push(member);
                    }
                }
            }
        }
        targets
    }

    /// Properties of the targets of every `Member` edge of `group`, in edge
    /// order.
    ///
    /// Members are not expanded further, so nested or cyclic group graphs
    /// cannot make this recurse.
    pub fn resolve_group_members(&self, group: VertexId) -> Vec<&'g Payload> {
        match self.graph.vertex(group) {
            Some(group) => self.members_of(group),
            None => Vec::new(),
        }
    }

    fn members_of(&self, group: &'g Vertex) -> Vec<&'g Payload> {
        let classifier = self.classifier();
        self.graph
            .edges_out(group)
            .filter(|edge| classifier.is_model_element(*edge, Some(ElementKind::Member)))
            .filter_map(|edge| self.graph.target_of(edge))
            .map(|member| &member.properties)
            .collect()
    }
}
