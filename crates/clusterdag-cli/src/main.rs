//! Cluster dependency graph CLI.
//!
//! Provides the `clusterdag` binary for inspecting and editing the stored
//! dependency graph of a cluster. Mutating subcommands load the graph,
//! apply one engine operation, and save the result back, so a failed
//! operation never touches the stored document.
//!
//! Results are printed as JSON on stdout; diagnostics go to stderr.

mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use clusterdag_core::{CoreError, Graph, LinkOutcome, LoadPolicy, NodeId};
use clusterdag_storage::sample::sample_document;
use clusterdag_storage::{ClusterId, FileStore, GraphStore, StorageError};

use crate::config::Config;

/// Inspect and edit cluster dependency graphs.
#[derive(Parser)]
#[command(name = "clusterdag", about = "Inspect and edit cluster dependency graphs")]
struct Cli {
    /// Directory holding cluster documents (overrides CLUSTERDAG_STORE).
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Cluster to operate on (overrides CLUSTERDAG_CLUSTER).
    #[arg(short, long, global = true)]
    cluster: Option<u32>,

    /// Drop redundant edges on load instead of rejecting the document.
    #[arg(long, global = true)]
    reduce_on_load: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Commands {
    /// Store the stub project cluster as the selected cluster.
    InitSample,
    /// Print node, closed and edge counts.
    Stats,
    /// Print every direct edge.
    Edges,
    /// Check every graph invariant.
    Validate,
    /// List every cluster with a stored graph.
    List,
    /// Add a dependency edge and drop the edges it makes redundant.
    Link { up: u32, down: u32 },
    /// Remove a dependency edge.
    Unlink { up: u32, down: u32 },
    /// Remove a node, reconnecting its neighbours around it.
    DeleteNode { id: u32 },
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(3);
        }
    };
    init_logging(&config.log_filter);

    let store_root = cli.store.clone().unwrap_or(config.store);
    let cluster = cli.cluster.map(ClusterId).unwrap_or(config.cluster);
    let policy = if cli.reduce_on_load {
        LoadPolicy::Reduce
    } else {
        LoadPolicy::Strict
    };

    let mut store = FileStore::new(store_root);
    let exit_code = match execute(&mut store, cluster, policy, &cli.command) {
        Ok(result) => {
            let json = serde_json::to_string_pretty(&result).unwrap_or_else(|e| {
                format!("{{\"error\": \"failed to serialize result: {}\"}}", e)
            });
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_code_for(&e)
        }
    };
    process::exit(exit_code);
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Exit code: 0 = success, 1 = rejected edit, 2 = integrity failure,
/// 3 = I/O or storage error.
fn exit_code_for(err: &StorageError) -> i32 {
    match err {
        StorageError::Graph(CoreError::GraphIntegrity(_)) => 2,
        StorageError::Graph(_) => 1,
        _ => 3,
    }
}

/// Runs one subcommand against `store`, returning the JSON to print.
fn execute(
    store: &mut impl GraphStore,
    cluster: ClusterId,
    policy: LoadPolicy,
    command: &Commands,
) -> Result<Value, StorageError> {
    tracing::debug!(%cluster, ?command, "running command");

    let result = match *command {
        Commands::InitSample => {
            let graph = store.import(cluster, &sample_document(), policy)?;
            json!({ "cluster": cluster, "stats": stats(&graph) })
        }
        Commands::Stats => stats(&store.load(cluster, policy)?),
        Commands::Edges => {
            let graph = store.load(cluster, policy)?;
            let edges: Vec<[NodeId; 2]> = graph.edges().map(|(up, down)| [up, down]).collect();
            json!({ "edges": edges })
        }
        Commands::Validate => {
            store.load(cluster, policy)?.validate()?;
            json!({ "valid": true })
        }
        Commands::List => json!({ "clusters": store.list()? }),
        Commands::Link { up, down } => {
            let mut graph = store.load(cluster, policy)?;
            let outcome = graph.link_nodes(NodeId(up), NodeId(down))?;
            store.save(cluster, &graph)?;
            link_json(&outcome)
        }
        Commands::Unlink { up, down } => {
            let mut graph = store.load(cluster, policy)?;
            let removed = graph.unlink_nodes(NodeId(up), NodeId(down))?;
            if removed {
                store.save(cluster, &graph)?;
            }
            json!({ "removed": removed })
        }
        Commands::DeleteNode { id } => {
            let mut graph = store.load(cluster, policy)?;
            let bridged = graph.delete_node(NodeId(id))?;
            store.save(cluster, &graph)?;
            let bridged: Vec<[NodeId; 2]> = bridged.into_iter().map(|(u, d)| [u, d]).collect();
            json!({ "deleted": id, "bridged": bridged, "stats": stats(&graph) })
        }
    };

    Ok(result)
}

fn stats(graph: &Graph) -> Value {
    json!({
        "nodes": graph.count_nodes(),
        "closed": graph.count_closed(),
        "edges": graph.edge_count(),
    })
}

fn link_json(outcome: &LinkOutcome) -> Value {
    match outcome {
        LinkOutcome::Linked { purged } => {
            let purged: Vec<[NodeId; 2]> = purged.iter().map(|&(u, d)| [u, d]).collect();
            json!({ "outcome": "linked", "purged": purged })
        }
        LinkOutcome::AlreadyLinked => json!({ "outcome": "already_linked", "purged": [] }),
        LinkOutcome::Implied => json!({ "outcome": "implied", "purged": [] }),
    }
}
