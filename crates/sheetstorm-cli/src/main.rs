use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sheetstorm_app::{AttackGraphEditor, ClickOutcome, GraphExporter, JsonExporter};
use sheetstorm_client::{AttackGraphApi, ClientConfig, HttpAttackGraphClient};
use sheetstorm_core::{EdgeId, EdgeKind, EventId, GraphNode, LocalId, NodeId, NodeKind, Position};
use sheetstorm_events::{Event, EventListener, Severity};
use sheetstorm_graph::{HubSatelliteLayouter, Jitter, inspect_node};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Attack graph editor for SheetStorm incidents", long_about = None)]
struct Args {
    /// Incident whose attack graph is edited
    #[arg(short, long, env = "SHEETSTORM_INCIDENT")]
    incident: String,

    /// Backend base URL, e.g. http://localhost:5000/api/v1
    #[arg(long)]
    api_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Extra attempts for transport errors and 5xx responses
    #[arg(long)]
    retries: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print nodes and edges
    Show {
        /// Also print the inspection panel of every node
        #[arg(long)]
        details: bool,
    },
    /// Rebuild the graph from incident data
    Regenerate {
        /// Drop existing nodes and edges first
        #[arg(long)]
        clear: bool,
    },
    /// Run the hub/satellite layout and save positions
    Layout {
        /// Reproducible jitter
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Association edge between two nodes
    Connect { source: String, target: String },
    /// Typed edge, optionally linked to a timeline event
    Link {
        source: String,
        target: String,
        #[arg(long, default_value = "associated_with")]
        kind: EdgeKind,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Timeline event id; its activity becomes the label when none is given
        #[arg(long)]
        event: Option<String>,
    },
    AddNode {
        #[arg(long)]
        kind: NodeKind,
        #[arg(long)]
        label: String,
        #[arg(long, default_value_t = 0.0)]
        x: f64,
        #[arg(long, default_value_t = 0.0)]
        y: f64,
    },
    DeleteNode {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    DeleteEdge {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Node and edge types known to the backend
    Types,
    /// Write the graph as JSON
    Export {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Prints user-facing notifications to stderr.
struct NotificationPrinter;

impl EventListener for NotificationPrinter {
    fn handle_event(&mut self, event: &Event) {
        if let Event::Notify { severity, message } = event {
            let tag = match severity {
                Severity::Info => "info",
                Severity::Success => "ok",
                Severity::Warning => "warn",
                Severity::Error => "error",
            };
            eprintln!("[{tag}] {message}");
        }
    }
}

fn client_config(args: &Args) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(url) = &args.api_url {
        config.base_url = url.clone();
    }
    if let Some(token) = &args.token {
        config.token = Some(token.clone());
    }
    if let Some(secs) = args.timeout {
        config.timeout = std::time::Duration::from_secs(secs);
    }
    if let Some(retries) = args.retries {
        config.max_retries = retries;
    }
    config
}

fn local_id(editor: &AttackGraphEditor, id: &str) -> Result<LocalId> {
    editor
        .node_by_id(&NodeId::new(id))
        .map(|n| n.local_id)
        .with_context(|| format!("No node with id {id}"))
}

fn print_node(node: &GraphNode, details: bool) {
    let mut flags = String::new();
    if node.is_initial_access {
        flags.push_str(" [initial access]");
    }
    if node.is_objective {
        flags.push_str(" [objective]");
    }
    println!(
        "{:<12} {:<18} {:<32} ({:.0}, {:.0}){flags}",
        node.display_id(),
        node.role.label(),
        node.label,
        node.position.x,
        node.position.y,
    );
    if details {
        for field in inspect_node(node).fields {
            println!("{:>14}  {}: {}", "", field.label, field.value);
        }
    }
}

async fn run(editor: &AttackGraphEditor, command: Command) -> Result<()> {
    match command {
        Command::Show { details } => {
            editor.load().await?;
            let nodes = editor.nodes();
            let edges = editor.edges();
            println!("{} nodes, {} edges", nodes.len(), edges.len());
            for node in &nodes {
                print_node(node, details);
            }
            for edge in &edges {
                println!(
                    "{:<12} {} -> {}  {}",
                    edge.display_id(),
                    edge.source,
                    edge.target,
                    edge.display_label()
                );
            }
        }
        Command::Regenerate { clear } => {
            editor.regenerate(clear).await?;
        }
        Command::Layout { seed } => {
            editor.load().await?;
            let jitter = match seed {
                Some(seed) => Jitter::Seeded {
                    seed,
                    amplitude: HubSatelliteLayouter::DEFAULT_JITTER,
                },
                None => Jitter::default(),
            };
            let handles = editor.auto_layout(jitter);
            let count = handles.len();
            for handle in handles {
                handle.await.context("Position update task panicked")?;
            }
            println!("Laid out {} nodes, saved {count} positions", editor.nodes().len());
        }
        Command::Connect { source, target } => {
            editor.load().await?;
            let id = editor
                .connect(&NodeId::new(source), &NodeId::new(target))
                .await?;
            println!("{id}");
        }
        Command::Link {
            source,
            target,
            kind,
            label,
            description,
            event,
        } => {
            editor.load().await?;
            let id = link(editor, &source, &target, kind, label, description, event).await?;
            println!("{id}");
        }
        Command::AddNode { kind, label, x, y } => {
            editor.load().await?;
            let local = editor
                .create_node_optimistic(kind, label, Position::new(x, y))
                .await?;
            let node = editor
                .nodes()
                .into_iter()
                .find(|n| n.local_id == local)
                .context("Created node vanished from the graph")?;
            println!("{}", node.display_id());
        }
        Command::DeleteNode { ids } => {
            editor.load().await?;
            let locals = ids
                .iter()
                .map(|id| local_id(editor, id))
                .collect::<Result<Vec<_>>>()?;
            let report = editor.delete_nodes(&locals).await;
            println!(
                "Removed {} nodes and {} edges",
                report.removed_nodes, report.removed_edges
            );
            if !report.is_clean() {
                bail!("{} server deletes failed", report.failures.len());
            }
        }
        Command::DeleteEdge { ids } => {
            editor.load().await?;
            let edges = editor.edges();
            let locals = ids
                .iter()
                .map(|id| {
                    let id = EdgeId::new(id.as_str());
                    edges
                        .iter()
                        .find(|e| e.id.as_ref() == Some(&id))
                        .map(|e| e.local_id)
                        .with_context(|| format!("No edge with id {id}"))
                })
                .collect::<Result<Vec<_>>>()?;
            let report = editor.delete_edges(&locals).await;
            println!("Removed {} edges", report.removed_edges);
            if !report.is_clean() {
                bail!("{} server deletes failed", report.failures.len());
            }
        }
        Command::Types => {
            println!("node types: {}", editor.node_types().await?.join(", "));
            println!("edge types: {}", editor.edge_types().await?.join(", "));
        }
        Command::Export { out } => {
            editor.load().await?;
            let exporter = JsonExporter;
            let Some(bytes) = editor.export(Some(&exporter as &dyn GraphExporter)) else {
                bail!("Export failed");
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, bytes)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", String::from_utf8_lossy(&bytes)),
            }
        }
    }
    Ok(())
}

/// Drives the same click-to-connect flow the canvas uses.
async fn link(
    editor: &AttackGraphEditor,
    source: &str,
    target: &str,
    kind: EdgeKind,
    label: Option<String>,
    description: Option<String>,
    event: Option<String>,
) -> Result<EdgeId> {
    let (source_local, target_local) = (local_id(editor, source)?, local_id(editor, target)?);
    editor.enable_draw();
    if !matches!(
        editor.click_node(source_local).await,
        ClickOutcome::SourceSelected(_)
    ) {
        bail!("Node {source} cannot be used as a source");
    }
    if !matches!(
        editor.click_node(target_local).await,
        ClickOutcome::TargetSelected { .. }
    ) {
        bail!("Node {target} cannot be used as a target");
    }

    editor.set_draft_kind(kind);
    if let Some(label) = label {
        editor.set_draft_label(label);
    }
    if let Some(description) = description {
        editor.set_draft_description(description);
    }
    if let Some(event) = event {
        if !editor.select_draft_event(&EventId(event.clone())) {
            bail!("Timeline event {event} not found");
        }
    }
    Ok(editor.commit_edge().await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let config = client_config(&args);
    tracing::debug!(url = %config.base_url, incident = %args.incident, "Connecting");
    let client = HttpAttackGraphClient::new(config, args.incident.clone())
        .context("Failed to set up the API client")?;
    let editor = AttackGraphEditor::new(Arc::new(client) as Arc<dyn AttackGraphApi>);

    let result = run(&editor, args.command).await;
    editor.events().dispatch_to(&mut NotificationPrinter);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_link_with_kind() {
        let args = Args::try_parse_from([
            "sheetstorm",
            "--incident",
            "inc-1",
            "link",
            "h1",
            "a1",
            "--kind",
            "lateral_movement",
        ])
        .unwrap();
        match args.command {
            Command::Link { kind, event, .. } => {
                assert_eq!(kind, EdgeKind::LateralMovement);
                assert!(event.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_node_kind() {
        let parsed = Args::try_parse_from([
            "sheetstorm",
            "--incident",
            "inc-1",
            "add-node",
            "--kind",
            "toaster",
            "--label",
            "x",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn flags_override_environment_config() {
        let args = Args::try_parse_from([
            "sheetstorm",
            "--incident",
            "inc-1",
            "--api-url",
            "http://backend:8080/api/v1",
            "--retries",
            "0",
            "types",
        ])
        .unwrap();
        let config = client_config(&args);
        assert_eq!(config.base_url, "http://backend:8080/api/v1");
        assert_eq!(config.max_retries, 0);
    }
}
