//! cloutpath CLI
//!
//! Query a compiled clout snapshot:
//! - Resolve entities (`SELF`/`SOURCE`/`TARGET`/`HOST` or node template names)
//! - Follow hosts, policy targets and group members
//! - Read nested properties/attributes (`web.endpoint.port`, `SELF.db.1.timeout`)
//! - Compare tagged values and try output assignments

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cloutpath_graph::{Graph, Payload, Vertex, VertexId};
use cloutpath_resolve::{CallContext, ComparerRegistry, PathSegment, Resolver, ResolverConfig};
use colored::Colorize;
use serde_json::{json, Value};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "cloutpath")]
#[command(author, version, about = "Resolve entities and values in compiled clout graphs")]
struct Cli {
    /// Clout snapshot (JSON)
    clout: PathBuf,

    /// Resolver configuration (JSON); defaults to CLOUTPATH_* environment variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Vertex keys that fill the calling context.
#[derive(Args, Debug, Default)]
struct ContextArgs {
    /// Vertex key bound to SELF (and used for HOST)
    #[arg(long)]
    site: Option<String>,
    /// Vertex key bound to SOURCE
    #[arg(long)]
    source: Option<String>,
    /// Vertex key bound to TARGET
    #[arg(long)]
    target: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an entity name to its node template
    Entity {
        name: String,
        #[command(flatten)]
        context: ContextArgs,
    },

    /// Show the host of a vertex
    Host { vertex: String },

    /// List the node templates a policy applies to
    PolicyTargets { policy: String },

    /// List the members of a group
    Members { group: String },

    /// Read a nested property, e.g. `SELF.endpoint.port`
    GetProperty {
        path: String,
        #[command(flatten)]
        context: ContextArgs,
    },

    /// Read a nested attribute, e.g. `web.host.0.ip`
    GetAttribute {
        path: String,
        #[command(flatten)]
        context: ContextArgs,
    },

    /// Classify a vertex (model element kind, node template types)
    Classify {
        vertex: String,
        /// Also test membership of this node type
        #[arg(long = "type")]
        type_name: Option<String>,
    },

    /// Compare two JSON values (-1, 0 or 1)
    Compare { left: String, right: String },

    /// Assign an output from text and show the coerced value (not saved)
    SetOutput { name: String, value: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<ResolverConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))
        }
        None => Ok(ResolverConfig::from_env()),
    }
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let mut graph = Graph::from_path(&cli.clout)
        .with_context(|| format!("failed to load clout {}", cli.clout.display()))?;
    tracing::debug!(
        clout = %cli.clout.display(),
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "loaded clout"
    );
    let host = ComparerRegistry::with_builtins();
    let format = cli.format;

    if let Commands::SetOutput { name, value } = &cli.command {
        if !graph.set_output_value(name, value) {
            return Err(anyhow!("output {name:?} cannot be set"));
        }
        graph.append_history(format!("set output {name}"));
        let output = graph
            .output(name)
            .and_then(|output| output.get("$value"))
            .cloned()
            .unwrap_or(Value::Null);
        return emit(out, format, &output, |out| writeln!(out, "{}", output));
    }

    let resolver = Resolver::new(&graph, &host).with_config(config);

    match &cli.command {
        Commands::Entity { name, context } => {
            let context = call_context(&graph, context)?;
            let vertex = resolver.resolve_named_entity(&context, name)?;
            emit_vertex(out, format, vertex)
        }
        Commands::Host { vertex } => {
            let vertex = vertex_id(&graph, vertex)?;
            let host = resolver.resolve_host(vertex)?;
            emit_vertex(out, format, host)
        }
        Commands::PolicyTargets { policy } => {
            let targets = resolver.resolve_policy_targets(vertex_id(&graph, policy)?);
            emit_templates(out, format, &targets)
        }
        Commands::Members { group } => {
            let members = resolver.resolve_group_members(vertex_id(&graph, group)?);
            emit_templates(out, format, &members)
        }
        Commands::GetProperty { path, context } => {
            let context = call_context(&graph, context)?;
            let value = resolver.get_property(&context, &PathSegment::parse_dotted(path))?;
            emit(out, format, &value, |out| writeln!(out, "{value}"))
        }
        Commands::GetAttribute { path, context } => {
            let context = call_context(&graph, context)?;
            let value = resolver.get_attribute(&context, &PathSegment::parse_dotted(path))?;
            emit(out, format, &value, |out| writeln!(out, "{value}"))
        }
        Commands::Classify { vertex, type_name } => {
            let vertex = vertex_by_key(&graph, vertex)?;
            let classifier = resolver.classifier();
            let report = json!({
                "key": vertex.key(),
                "model_element": classifier.is_model_element(vertex, None),
                "kind": classifier.element_kind(vertex).map(|kind| kind.as_str()),
                "node_template": classifier.is_node_template(vertex, type_name.as_deref()),
            });
            emit(out, format, &report, |out| {
                writeln!(
                    out,
                    "{} kind={} node_template={}",
                    vertex.key().bold(),
                    report["kind"].as_str().unwrap_or("-"),
                    report["node_template"]
                )
            })
        }
        Commands::Compare { left, right } => {
            let left: Value = serde_json::from_str(left).context("left is not JSON")?;
            let right: Value = serde_json::from_str(right).context("right is not JSON")?;
            let ordering = resolver.compare(&left, &right)? as i8;
            emit(out, format, &json!(ordering), |out| writeln!(out, "{ordering}"))
        }
        Commands::SetOutput { .. } => Ok(()),
    }
}

fn vertex_by_key<'g>(graph: &'g Graph, key: &str) -> Result<&'g Vertex> {
    graph
        .vertex_by_key(key)
        .ok_or_else(|| anyhow!("no vertex with key {key:?}"))
}

fn vertex_id(graph: &Graph, key: &str) -> Result<VertexId> {
    vertex_by_key(graph, key).map(Vertex::id)
}

fn call_context(graph: &Graph, args: &ContextArgs) -> Result<CallContext> {
    let slot = |key: &Option<String>| key.as_deref().map(|k| vertex_id(graph, k)).transpose();
    Ok(CallContext {
        site: slot(&args.site)?,
        source: slot(&args.source)?,
        target: slot(&args.target)?,
    })
}

fn emit(
    out: &mut impl Write,
    format: Format,
    value: &Value,
    text: impl FnOnce(&mut dyn Write) -> io::Result<()>,
) -> Result<()> {
    match format {
        Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(value)?)?,
        Format::Text => text(out)?,
    }
    Ok(())
}

fn emit_vertex(out: &mut impl Write, format: Format, vertex: &Vertex) -> Result<()> {
    let summary = json!({ "key": vertex.key(), "name": vertex.name() });
    emit(out, format, &summary, |out| {
        writeln!(
            out,
            "{} {}",
            vertex.name().unwrap_or("-").green().bold(),
            format!("({})", vertex.key()).dimmed()
        )
    })
}

fn emit_templates(out: &mut impl Write, format: Format, templates: &[&Payload]) -> Result<()> {
    let names: Vec<Value> = templates
        .iter()
        .map(|t| t.get("name").cloned().unwrap_or(Value::Null))
        .collect();
    let listing = Value::Array(names);
    emit(out, format, &listing, |out| {
        for name in listing.as_array().into_iter().flatten() {
            writeln!(out, "{} {}", "-".dimmed(), name.as_str().unwrap_or("?"))?;
        }
        Ok(())
    })
}
