//! Resolution E2E Tests

use cloutpath_graph::{Graph, VertexId};
use cloutpath_resolve::*;
use serde_json::{json, Value};

fn node(name: &str, types: &[&str], extra: Value) -> Value {
    let types: serde_json::Map<String, Value> =
        types.iter().map(|t| (t.to_string(), json!({}))).collect();
    let mut properties = json!({ "name": name, "types": types });
    if let (Some(target), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        target.extend(extra);
    }
    json!({
        "metadata": { "puccini": { "version": "1.0", "kind": "NodeTemplate" } },
        "properties": properties,
    })
}

fn edge(kind: &str, target: &str, properties: Value) -> Value {
    json!({
        "metadata": { "puccini": { "version": "1.0", "kind": kind } },
        "properties": properties,
        "targetID": target,
    })
}

fn with_edges(mut vertex: Value, edges: Vec<Value>) -> Value {
    vertex["edgesOut"] = Value::Array(edges);
    vertex
}

fn vertex_of(kind: &str, name: &str, edges: Vec<Value>) -> Value {
    json!({
        "metadata": { "puccini": { "version": "1.0", "kind": kind } },
        "properties": { "name": name },
        "edgesOut": edges,
    })
}

fn hosted_on() -> Value {
    json!({ "tosca::HostedOn": { "metadata": { "role": "host" } } })
}

fn connects_to() -> Value {
    json!({ "tosca::ConnectsTo": { "metadata": {} } })
}

/// web -host-> server; web -database(0)-> primary; web -database(1)-> replica;
/// web -db-> primary.
/// Groups: front {web, server}, data {server, primary}.
fn sample_graph() -> Graph {
    let web = with_edges(
        node(
            "web",
            &["tosca::WebServer", "tosca::Root"],
            json!({
                "properties": {
                    "port": 8080,
                    "settings": { "limits": { "cpu": 2, "memory": "1 GiB" } },
                    "tags": ["a", "b"]
                },
                "attributes": { "state": "started" },
                "capabilities": {
                    "endpoint": { "properties": { "port": 443, "protocol": "https" } },
                    "db": { "properties": { "shadow": true } }
                }
            }),
        ),
        vec![
            edge(
                "Relationship",
                "primary",
                json!({ "name": "database", "types": connects_to(), "properties": { "timeout": 5 } }),
            ),
            // Not a model element: must be skipped by every relationship scan.
            json!({ "properties": { "name": "database", "properties": { "timeout": 99 } }, "targetID": "replica" }),
            edge(
                "Relationship",
                "replica",
                json!({ "name": "database", "types": connects_to(), "properties": { "timeout": 10 } }),
            ),
            edge(
                "Relationship",
                "server",
                json!({ "name": "host", "types": hosted_on(), "attributes": { "ip": "10.0.0.1" } }),
            ),
            edge(
                "Relationship",
                "primary",
                json!({ "name": "db", "types": connects_to(), "properties": { "shadow": false } }),
            ),
        ],
    );

    Graph::from_json_value(json!({
        "vertexes": {
            "web": web,
            "server": node("server", &["tosca::Compute"], json!({ "properties": { "cores": 4 } })),
            "primary": node("primary", &["tosca::Database"], json!({})),
            "replica": node("replica", &["tosca::Database"], json!({})),
            "front": vertex_of("Group", "front", vec![
                edge("Member", "web", json!({})),
                edge("Member", "server", json!({})),
            ]),
            "data": vertex_of("Group", "data", vec![
                edge("Member", "server", json!({})),
                edge("Member", "primary", json!({})),
            ]),
            "scaling": vertex_of("Policy", "scaling", vec![
                edge("GroupTarget", "front", json!({})),
                edge("GroupTarget", "data", json!({})),
            ]),
            "placement": vertex_of("Policy", "placement", vec![
                edge("NodeTemplateTarget", "web", json!({})),
                edge("GroupTarget", "front", json!({})),
            ]),
        }
    }))
    .unwrap()
}

fn id(graph: &Graph, key: &str) -> VertexId {
    graph.vertex_by_key(key).unwrap().id()
}

fn path(dotted: &str) -> Vec<PathSegment> {
    PathSegment::parse_dotted(dotted)
}

fn names(targets: &[&cloutpath_graph::Payload]) -> Vec<String> {
    targets
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Relation Navigation
// ============================================================================

#[test]
fn test_named_entities_resolve_node_templates_only() {
    let graph = sample_graph();
    let resolver = Resolver::new(&graph, &PassthroughHost);
    let ctx = CallContext::empty();

    assert_eq!(resolver.resolve_named_entity(&ctx, "server").unwrap().id(), id(&graph, "server"));

    let err = resolver.resolve_named_entity(&ctx, "front").unwrap_err();
    assert_eq!(err.to_string(), "\"front\" node template not found");

    let err = resolver.resolve_named_entity(&ctx, "nothing").unwrap_err();
    assert!(matches!(err, ResolveError::NotFound(_)));
}

#[test]
fn test_self_site_must_be_node_template() {
    let graph = sample_graph();
    let resolver = Resolver::new(&graph, &PassthroughHost);

    let ctx = CallContext::at_site(id(&graph, "web"));
    assert_eq!(resolver.resolve_named_entity(&ctx, "SELF").unwrap().id(), id(&graph, "web"));

    let ctx = CallContext::at_site(id(&graph, "scaling"));
    let err = resolver.resolve_named_entity(&ctx, "SELF").unwrap_err();
    assert_eq!(err.to_string(), "\"SELF\" node template not found");
}

#[test]
fn test_source_and_target_use_their_slots() {
    let graph = sample_graph();
    let resolver = Resolver::new(&graph, &PassthroughHost);
    let ctx = CallContext::empty()
        .with_source(id(&graph, "web"))
        .with_target(id(&graph, "primary"));

    assert_eq!(resolver.resolve_named_entity(&ctx, "SOURCE").unwrap().id(), id(&graph, "web"));
    assert_eq!(resolver.resolve_named_entity(&ctx, "TARGET").unwrap().id(), id(&graph, "primary"));

    for reserved in ["SELF", "HOST"] {
        let err = resolver.resolve_named_entity(&ctx, reserved).unwrap_err();
        assert!(matches!(err, ResolveError::Context { .. }), "{reserved}");
    }
    let err = resolver
        .resolve_named_entity(&CallContext::empty(), "TARGET")
        .unwrap_err();
    assert_eq!(err.to_string(), "\"TARGET\" cannot be used in this context");
}

#[test]
fn test_host_is_one_hop_over_host_role() {
    let graph = sample_graph();
    let resolver = Resolver::new(&graph, &PassthroughHost);

    let host = resolver.resolve_host(id(&graph, "web")).unwrap();
    assert_eq!(host.name(), Some("server"));

    // server has no relationships at all
    let err = resolver.resolve_host(id(&graph, "server")).unwrap_err();
    assert_eq!(err.to_string(), "\"HOST\" not found for node template \"server\"");

    let err = resolver.resolve_host(id(&graph, "front")).unwrap_err();
    assert_eq!(err.to_string(), "\"HOST\" not found");
}

#[test]
fn test_host_role_is_configurable() {
    let graph = sample_graph();
    let config = ResolverConfig {
        host_role: "runs-on".to_string(),
        ..ResolverConfig::default()
    };
    let resolver = Resolver::new(&graph, &PassthroughHost).with_config(config);
    assert!(resolver.resolve_host(id(&graph, "web")).is_err());
}

#[test]
fn test_policy_targets_deduplicate_group_members() {
    let graph = sample_graph();
    let resolver = Resolver::new(&graph, &PassthroughHost);

    let targets = resolver.resolve_policy_targets(id(&graph, "scaling"));
    assert_eq!(names(&targets), vec!["web", "server", "primary"]);

    let targets = resolver.resolve_policy_targets(id(&graph, "placement"));
    assert_eq!(names(&targets), vec!["web", "server"]);

    assert!(resolver.resolve_policy_targets(id(&graph, "web")).is_empty());
}

#[test]
fn test_group_members_in_edge_order() {
    let graph = sample_graph();
    let resolver = Resolver::new(&graph, &PassthroughHost);
    let members = resolver.resolve_group_members(id(&graph, "data"));
    assert_eq!(names(&members), vec!["server", "primary"]);
    assert!(resolver.resolve_group_members(VertexId::new(999)).is_empty());
}

#[test]
fn test_duplicate_names_resolve_deterministically() {
    let graph = Graph::from_json_value(json!({
        "vertexes": {
            "b": node("dup", &[], json!({ "properties": { "which": "b" } })),
            "a": node("dup", &[], json!({ "properties": { "which": "a" } })),
        }
    }))
    .unwrap();
    let resolver = Resolver::new(&graph, &PassthroughHost);
    for _ in 0..3 {
        let found = resolver
            .resolve_named_entity(&CallContext::empty(), "dup")
            .unwrap();
        assert_eq!(found.key(), "a");
    }
}

// ============================================================================
// Path Resolution
// ============================================================================

#[test]
fn test_property_paths() {
    let graph = sample_graph();
    let resolver = Resolver::new(&graph, &PassthroughHost);
    let ctx = CallContext::at_site(id(&graph, "web"));

    assert_eq!(resolver.get_property(&ctx, &path("SELF.port")).unwrap(), json!(8080));
    assert_eq!(resolver.get_property(&ctx, &path("web.settings.limits.cpu")).unwrap(), json!(2));
    assert_eq!(resolver.get_property(&ctx, &path("SELF.tags.1")).unwrap(), json!("b"));
    assert_eq!(resolver.get_property(&ctx, &path("HOST.cores")).unwrap(), json!(4));
    assert_eq!(resolver.get_attribute(&ctx, &path("SELF.state")).unwrap(), json!("started"));
}

#[test]
fn test_capability_selector_wins() {
    let graph = sample_graph();
    let resolver = Resolver::new(&graph, &PassthroughHost);
    let ctx = CallContext::at_site(id(&graph, "web"));

    assert_eq!(resolver.get_property(&ctx, &path("SELF.endpoint.port")).unwrap(), json!(443));

    // "db" names both a capability and a relationship; the capability wins.
    assert_eq!(resolver.get_property(&ctx, &path("SELF.db.shadow")).unwrap(), json!(true));
    let err = resolver.get_property(&ctx, &path("SELF.db.0.shadow")).unwrap_err();
    assert_eq!(err.to_string(), "capability \"db\" property \"0\" not found in \"web\"");

    let err = resolver.get_property(&ctx, &path("SELF.endpoint.missing")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "capability \"endpoint\" property \"missing\" not found in \"web\""
    );
}

#[test]
fn test_relationship_occurrence_index() {
    let graph = sample_graph();
    let resolver = Resolver::new(&graph, &PassthroughHost);
    let ctx = CallContext::at_site(id(&graph, "web"));

    assert_eq!(resolver.get_property(&ctx, &path("SELF.database.0.timeout")).unwrap(), json!(5));
    // The unmarked edge between them does not count as an occurrence.
    assert_eq!(resolver.get_property(&ctx, &path("SELF.database.1.timeout")).unwrap(), json!(10));
    assert_eq!(resolver.get_attribute(&ctx, &path("SELF.host.0.ip")).unwrap(), json!("10.0.0.1"));

    let err = resolver.get_property(&ctx, &path("SELF.database.1.retries")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "relationship \"database\" property \"retries\" not found in \"web\""
    );

    // No third occurrence: "database" falls back to a plain property key.
    let err = resolver.get_property(&ctx, &path("SELF.database.2.timeout")).unwrap_err();
    assert_eq!(err.to_string(), "property \"database\" not found in \"web\"");
}

#[test]
fn test_nested_errors_name_the_consumed_path() {
    let graph = sample_graph();
    let resolver = Resolver::new(&graph, &PassthroughHost);
    let ctx = CallContext::at_site(id(&graph, "web"));

    let err = resolver.get_property(&ctx, &path("SELF.settings.limits.gpu")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "nested property \"settings.limits.gpu\" not found in \"web\""
    );

    let err = resolver.get_property(&ctx, &path("SELF.port.value")).unwrap_err();
    assert_eq!(err.to_string(), "nested property \"port.value\" not found in \"web\"");
}

#[test]
fn test_short_paths_are_argument_errors() {
    let graph = sample_graph();
    let resolver = Resolver::new(&graph, &PassthroughHost);
    let ctx = CallContext::at_site(id(&graph, "web"));

    let err = resolver.get_property(&ctx, &path("SELF")).unwrap_err();
    assert!(matches!(err, ResolveError::Argument(_)));
    assert_eq!(err.to_string(), "must have at least 2 arguments");
}

#[test]
fn test_path_ending_at_selector_is_not_found() {
    let graph = sample_graph();
    let resolver = Resolver::new(&graph, &PassthroughHost);
    let ctx = CallContext::at_site(id(&graph, "web"));

    let err = resolver.get_property(&ctx, &path("SELF.endpoint")).unwrap_err();
    assert!(matches!(err, ResolveError::NotFound(_)));
    assert_eq!(
        err.to_string(),
        "capability \"endpoint\" property name not found in \"web\" for \"SELF.endpoint\""
    );

    let err = resolver.get_attribute(&ctx, &path("SELF.database.0")).unwrap_err();
    assert!(matches!(err, ResolveError::NotFound(_)));
    assert!(err.to_string().starts_with("relationship \"database\" attribute name not found"));
}

#[test]
fn test_resolution_is_idempotent() {
    let graph = sample_graph();
    let resolver = Resolver::new(&graph, &PassthroughHost);
    let ctx = CallContext::at_site(id(&graph, "web"));
    let segments = path("SELF.settings.limits");

    let first = resolver.get_property(&ctx, &segments).unwrap();
    let second = resolver.get_property(&ctx, &segments).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, json!({ "cpu": 2, "memory": "1 GiB" }));
}

/// Expands `{"$lazy": name}` placeholders, as a runtime would evaluate a
/// deferred function call.
struct LazyHost;

impl ScriptHost for LazyHost {
    fn call(&self, target: &str, method: &str, _args: &[Value]) -> Result<Value, HostError> {
        Err(HostError::UnknownMethod {
            target: target.to_string(),
            method: method.to_string(),
        })
    }

    fn coerce(&self, value: &Value) -> Result<Value, HostError> {
        match value.get("$lazy").and_then(Value::as_str) {
            Some("limits") => Ok(json!({ "cpu": { "$number": 4, "$string": "4 cores" } })),
            Some(other) => Err(HostError::Coerce(format!("unknown placeholder {other}"))),
            None => Ok(value.clone()),
        }
    }
}

#[test]
fn test_coercion_applies_before_nested_descent() {
    let graph = Graph::from_json_value(json!({
        "vertexes": {
            "n": node("n", &[], json!({ "properties": {
                "deferred": { "$lazy": "limits" },
                "broken": { "$lazy": "nope" }
            } }))
        }
    }))
    .unwrap();
    let resolver = Resolver::new(&graph, &LazyHost);
    let ctx = CallContext::empty();

    let cpu = resolver.get_property(&ctx, &path("n.deferred.cpu")).unwrap();
    assert_eq!(length(&cpu), 7);
    assert_eq!(comparable(&cpu), comparable(&json!(4)));

    let err = resolver.get_property(&ctx, &path("n.broken")).unwrap_err();
    assert!(matches!(err, ResolveError::Host(HostError::Coerce(_))));
}

// ============================================================================
// Values through the resolver
// ============================================================================

#[test]
fn test_resolver_equality_and_ranges() {
    let graph = Graph::new();
    let host = ComparerRegistry::with_builtins();
    let resolver = Resolver::new(&graph, &host);

    let version = json!({ "$string": "1.2", "$comparer": "tosca.comparer.version" });
    assert!(resolver.equal(&version, &json!("1.2.0")).unwrap());
    assert!(resolver
        .in_range(&version, &json!("1.0"), &json!("1.10"))
        .unwrap());

    assert!(resolver.equal(&json!({ "a": [1] }), &json!({ "a": [1.0] })).unwrap());
    assert!(!resolver.equal(&json!({ "a": 1 }), &json!({ "a": 1, "b": 2 })).unwrap());
}
