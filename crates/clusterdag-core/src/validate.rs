//! Load-time invariant checks.
//!
//! [`check_structure`] covers everything except transitive reduction and is
//! enough to make the graph safe to traverse; [`check_reduced`] adds the
//! reduction check. Both stop at the first violation.

use indexmap::IndexMap;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graphmap::DiGraphMap;

use crate::error::IntegrityViolation;
use crate::graph::Edge;
use crate::id::NodeId;
use crate::node::{Node, NodeKind};

/// Keys, references, symmetry, duplicates, terminals, cluster progress and
/// acyclicity.
pub(crate) fn check_structure(
    nodes: &IndexMap<NodeId, Node>,
    entry: NodeId,
    exits: &[NodeId],
) -> Result<(), IntegrityViolation> {
    for (&key, node) in nodes {
        if key != node.id {
            return Err(IntegrityViolation::KeyMismatch { key, id: node.id });
        }
        if let NodeKind::Cluster(cluster) = &node.kind {
            if cluster.children_complete > cluster.children_count {
                return Err(IntegrityViolation::ClusterProgress {
                    id: key,
                    complete: cluster.children_complete,
                    count: cluster.children_count,
                });
            }
        }
    }

    for &terminal in std::iter::once(&entry).chain(exits) {
        if !nodes.contains_key(&terminal) {
            return Err(IntegrityViolation::MissingTerminal { id: terminal });
        }
    }

    for node in nodes.values() {
        check_adjacency(nodes, node)?;
    }

    let graph = edge_map(nodes);
    toposort(&graph, None).map_err(|cycle| IntegrityViolation::Cycle {
        node: cycle.node_id(),
    })?;

    Ok(())
}

fn check_adjacency(
    nodes: &IndexMap<NodeId, Node>,
    node: &Node,
) -> Result<(), IntegrityViolation> {
    for (position, &down) in node.downstream.iter().enumerate() {
        let target = nodes.get(&down).ok_or(IntegrityViolation::DanglingReference {
            node: node.id,
            missing: down,
        })?;
        if node.downstream[..position].contains(&down) {
            return Err(IntegrityViolation::DuplicateEdge {
                from: node.id,
                to: down,
            });
        }
        if !target.upstream.contains(&node.id) {
            return Err(IntegrityViolation::AsymmetricEdge {
                from: node.id,
                to: down,
            });
        }
    }

    for (position, &up) in node.upstream.iter().enumerate() {
        let source = nodes.get(&up).ok_or(IntegrityViolation::DanglingReference {
            node: node.id,
            missing: up,
        })?;
        if node.upstream[..position].contains(&up) {
            return Err(IntegrityViolation::DuplicateEdge {
                from: up,
                to: node.id,
            });
        }
        if !source.downstream.contains(&node.id) {
            return Err(IntegrityViolation::AsymmetricEdge {
                from: up,
                to: node.id,
            });
        }
    }

    Ok(())
}

/// Fails on the first direct edge that a longer path already implies.
pub(crate) fn check_reduced(nodes: &IndexMap<NodeId, Node>) -> Result<(), IntegrityViolation> {
    match redundant_edges(nodes).first() {
        Some(&(from, to)) => Err(IntegrityViolation::RedundantEdge { from, to }),
        None => Ok(()),
    }
}

/// Every direct edge `a -> b` for which `b` stays reachable from `a` once
/// that edge is taken away, in node order. Assumes an acyclic graph.
pub(crate) fn redundant_edges(nodes: &IndexMap<NodeId, Node>) -> Vec<Edge> {
    let mut graph = edge_map(nodes);
    let mut redundant = Vec::new();

    for node in nodes.values() {
        for &down in &node.downstream {
            graph.remove_edge(node.id, down);
            if has_path_connecting(&graph, node.id, down, None) {
                redundant.push((node.id, down));
            }
            graph.add_edge(node.id, down, ());
        }
    }

    redundant
}

fn edge_map(nodes: &IndexMap<NodeId, Node>) -> DiGraphMap<NodeId, ()> {
    let mut graph = DiGraphMap::with_capacity(nodes.len(), 0);
    for node in nodes.values() {
        graph.add_node(node.id);
        for &down in &node.downstream {
            graph.add_edge(node.id, down, ());
        }
    }
    graph
}
