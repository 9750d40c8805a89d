//! Graph: the cluster dependency graph and its editing engine.
//!
//! [`Graph`] owns every [`Node`] of one cluster's dependency graph, laid out
//! as a DAG from a single entry node to one or more exit nodes. It is the
//! only mutator of that node set and keeps four invariants across every
//! public call:
//!
//! - **Symmetry**: `b` is downstream of `a` exactly when `a` is upstream of `b`.
//! - **Acyclicity**: following downstream edges never returns to the start.
//! - **Transitive reduction**: no direct edge `u -> v` coexists with a longer
//!   path from `u` to `v`.
//! - **Referential integrity**: every adjacency id names a stored node.
//!
//! Reduction is incremental: [`Graph::link_nodes`] repairs only the
//! redundancy its own edge introduces, so it relies on the graph being
//! reduced beforehand. [`Graph::from_parts`] establishes that starting point
//! according to its [`LoadPolicy`].
//!
//! Bookkeeping that the persisted format stores next to the nodes (entry,
//! exits, the deletion log, the container cluster) lives in separate typed
//! fields, so `count_nodes` is simply the size of the node map.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::NodeId;
use crate::node::{ClusterInfo, Node};
use crate::validate;

/// A direct edge as `(upstream, downstream)`.
pub type Edge = (NodeId, NodeId);

/// How [`Graph::from_parts`] treats edges that a longer path already implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Reject the input with [`IntegrityViolation::RedundantEdge`](crate::IntegrityViolation::RedundantEdge).
    #[default]
    Strict,
    /// Accept the input and run a full transitive reduction once.
    Reduce,
}

/// The cluster whose internal graph this is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentCluster {
    pub id: NodeId,
    pub cluster: ClusterInfo,
}

/// Everything a loader supplies to build a [`Graph`].
#[derive(Debug, Clone, Default)]
pub struct GraphParts {
    pub nodes: IndexMap<NodeId, Node>,
    pub entry: NodeId,
    pub exits: Vec<NodeId>,
    pub deleted: Vec<NodeId>,
    pub parent_cluster: Option<ParentCluster>,
}

/// Result of a successful [`Graph::link_nodes`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The edge was inserted. `purged` lists the direct edges reduction
    /// removed because the new edge made them redundant.
    Linked { purged: Vec<Edge> },
    /// The direct edge already existed.
    AlreadyLinked,
    /// Downstream was already reachable through a longer path, so a direct
    /// edge would be redundant and none was inserted.
    Implied,
}

/// One cluster's dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    nodes: IndexMap<NodeId, Node>,
    entry: NodeId,
    exits: Vec<NodeId>,
    deleted: Vec<NodeId>,
    parent_cluster: Option<ParentCluster>,
}

impl Graph {
    /// Builds a graph from loader-supplied parts, validating every invariant.
    ///
    /// Under [`LoadPolicy::Strict`] a redundant edge is a violation; under
    /// [`LoadPolicy::Reduce`] redundant edges are dropped instead.
    pub fn from_parts(parts: GraphParts, policy: LoadPolicy) -> Result<Self, CoreError> {
        let GraphParts {
            nodes,
            entry,
            exits,
            deleted,
            parent_cluster,
        } = parts;

        validate::check_structure(&nodes, entry, &exits)?;

        let mut graph = Graph {
            nodes,
            entry,
            exits,
            deleted,
            parent_cluster,
        };

        match policy {
            LoadPolicy::Strict => validate::check_reduced(&graph.nodes)?,
            LoadPolicy::Reduce => {
                let removed = graph.reduce_all();
                if !removed.is_empty() {
                    tracing::debug!(removed = removed.len(), "reduced graph on load");
                }
            }
        }

        Ok(graph)
    }

    /// Decomposes the graph back into loader parts, e.g. for persistence.
    pub fn into_parts(self) -> GraphParts {
        GraphParts {
            nodes: self.nodes,
            entry: self.entry,
            exits: self.exits,
            deleted: self.deleted,
            parent_cluster: self.parent_cluster,
        }
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All nodes in load order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn exits(&self) -> &[NodeId] {
        &self.exits
    }

    /// Ids removed by [`delete_node`](Self::delete_node), oldest first,
    /// including those carried over from the loaded log.
    pub fn deleted(&self) -> &[NodeId] {
        &self.deleted
    }

    pub fn parent_cluster(&self) -> Option<&ParentCluster> {
        self.parent_cluster.as_ref()
    }

    /// Every direct edge as `(upstream, downstream)`.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.nodes
            .values()
            .flat_map(|node| node.downstream.iter().map(move |&down| (node.id, down)))
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.downstream.len()).sum()
    }

    /// Returns true if `to` can be reached from `from` over one or more
    /// downstream edges.
    pub fn reaches(&self, from: NodeId, to: NodeId) -> Result<bool, CoreError> {
        self.require(from)?;
        self.require(to)?;

        let mut visited = HashSet::new();
        let mut queue: VecDeque<NodeId> = self.downstream_of(from).collect();
        while let Some(id) = queue.pop_front() {
            if id == to {
                return Ok(true);
            }
            if visited.insert(id) {
                queue.extend(self.downstream_of(id));
            }
        }
        Ok(false)
    }

    /// Re-checks every invariant, including transitive reduction.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::check_structure(&self.nodes, self.entry, &self.exits)?;
        validate::check_reduced(&self.nodes)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Number of graph vertices. Bookkeeping fields are not nodes.
    pub fn count_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of complete clusters plus closed issues.
    pub fn count_closed(&self) -> usize {
        self.nodes.values().filter(|node| node.is_closed()).count()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Adds the edge `up -> down` and restores transitive reduction.
    ///
    /// Fails with [`CoreError::Cycle`] when `down` already reaches `up`
    /// (including `up == down`); the graph is unchanged on every error.
    pub fn link_nodes(&mut self, up: NodeId, down: NodeId) -> Result<LinkOutcome, CoreError> {
        self.require(up)?;
        self.require(down)?;
        if up == down {
            return Err(CoreError::Cycle { up, down });
        }

        // Everything fallible happens before the first mutation. Adding an
        // edge into `down` cannot change the ancestry of `up`.
        let ancestors = self.gather_ancestors(up)?;
        if ancestors.contains(&down) {
            return Err(CoreError::Cycle { up, down });
        }

        if self.has_edge(up, down) {
            let purged = self.reduce_after_link(down, up, ancestors);
            debug_assert!(purged.is_empty(), "re-reducing a reduced graph purged {purged:?}");
            return Ok(LinkOutcome::AlreadyLinked);
        }
        if self.gather_ancestors(down)?.contains(&up) {
            tracing::debug!(%up, %down, "edge already implied by a longer path");
            return Ok(LinkOutcome::Implied);
        }

        self.insert_edge(up, down);
        let purged = self.reduce_after_link(down, up, ancestors);
        tracing::debug!(%up, %down, purged = purged.len(), "linked nodes");

        Ok(LinkOutcome::Linked { purged })
    }

    /// Removes the edge `up -> down` if present.
    ///
    /// Returns whether an edge was removed; unlinking an absent edge is not
    /// an error. No reduction runs, since removal never creates redundancy.
    pub fn unlink_nodes(&mut self, up: NodeId, down: NodeId) -> Result<bool, CoreError> {
        self.require(up)?;
        self.require(down)?;
        Ok(self.remove_edge(up, down))
    }

    /// Deletes a node and bridges its former upstream neighbours to its
    /// former downstream neighbours, so reachability between them survives.
    ///
    /// Each bridge goes through [`link_nodes`](Self::link_nodes) in turn, so
    /// bridges already implied by another path are not inserted. Returns the
    /// bridges that were actually inserted. A deleted exit is dropped from
    /// [`exits`](Self::exits); the entry node cannot be deleted.
    pub fn delete_node(&mut self, id: NodeId) -> Result<Vec<Edge>, CoreError> {
        self.require(id)?;
        if id == self.entry {
            return Err(CoreError::ProtectedNode { id });
        }

        // Work on a copy so a defensive integrity failure mid-bridge leaves
        // the caller's graph untouched.
        let mut next = self.clone();
        let bridged = next.delete_in_place(id)?;
        *self = next;

        tracing::debug!(%id, bridged = bridged.len(), "deleted node");
        Ok(bridged)
    }

    fn delete_in_place(&mut self, id: NodeId) -> Result<Vec<Edge>, CoreError> {
        let node = self.require(id)?;
        let upstream = node.upstream.clone();
        let downstream = node.downstream.clone();

        for &up in &upstream {
            self.remove_edge(up, id);
        }
        for &down in &downstream {
            self.remove_edge(id, down);
        }

        self.nodes.shift_remove(&id);
        self.exits.retain(|exit| *exit != id);
        self.deleted.push(id);

        let mut bridged = Vec::new();
        for &up in &upstream {
            for &down in &downstream {
                if let LinkOutcome::Linked { .. } = self.link_nodes(up, down)? {
                    bridged.push((up, down));
                }
            }
        }
        Ok(bridged)
    }

    // -----------------------------------------------------------------------
    // Edge primitives
    // -----------------------------------------------------------------------

    pub(crate) fn nodes_map(&self) -> &IndexMap<NodeId, Node> {
        &self.nodes
    }

    #[cfg(test)]
    pub(crate) fn nodes_map_mut(&mut self) -> &mut IndexMap<NodeId, Node> {
        &mut self.nodes
    }

    pub(crate) fn require(&self, id: NodeId) -> Result<&Node, CoreError> {
        self.nodes.get(&id).ok_or(CoreError::NotFound { id })
    }

    pub(crate) fn upstream_of(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|node| node.upstream.iter().copied())
    }

    pub(crate) fn downstream_of(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|node| node.downstream.iter().copied())
    }

    fn has_edge(&self, up: NodeId, down: NodeId) -> bool {
        self.nodes
            .get(&up)
            .is_some_and(|node| node.downstream.contains(&down))
    }

    fn insert_edge(&mut self, up: NodeId, down: NodeId) {
        if let Some(node) = self.nodes.get_mut(&up) {
            node.downstream.push(down);
        }
        if let Some(node) = self.nodes.get_mut(&down) {
            node.upstream.push(up);
        }
    }

    /// Drops `up -> down` from both endpoints. Returns whether either side
    /// recorded it.
    pub(crate) fn remove_edge(&mut self, up: NodeId, down: NodeId) -> bool {
        let mut removed = false;
        if let Some(node) = self.nodes.get_mut(&up) {
            let before = node.downstream.len();
            node.downstream.retain(|id| *id != down);
            removed |= node.downstream.len() != before;
        }
        if let Some(node) = self.nodes.get_mut(&down) {
            let before = node.upstream.len();
            node.upstream.retain(|id| *id != up);
            removed |= node.upstream.len() != before;
        }
        removed
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::IntegrityViolation;
    use crate::node::{IssueRef, IssueState, NodeKind};

    fn issue(state: IssueState) -> NodeKind {
        NodeKind::Issue(IssueRef::new(1, state))
    }

    /// Parts for nodes `1..=n` with the given edges recorded on both
    /// endpoints. Node 1 is the entry; there are no declared exits.
    pub(crate) fn parts_of(n: u32, edges: &[(u32, u32)]) -> GraphParts {
        let mut nodes = IndexMap::new();
        for raw in 1..=n {
            let kind = if raw == 1 {
                NodeKind::Entry
            } else {
                issue(IssueState::Open)
            };
            nodes.insert(NodeId(raw), Node::new(NodeId(raw), kind));
        }
        for &(up, down) in edges {
            if let Some(node) = nodes.get_mut(&NodeId(up)) {
                node.downstream.push(NodeId(down));
            }
            if let Some(node) = nodes.get_mut(&NodeId(down)) {
                node.upstream.push(NodeId(up));
            }
        }
        GraphParts {
            nodes,
            entry: NodeId(1),
            ..GraphParts::default()
        }
    }

    /// Strictly validated graph over [`parts_of`].
    pub(crate) fn graph_of(n: u32, edges: &[(u32, u32)]) -> Result<Graph, CoreError> {
        Graph::from_parts(parts_of(n, edges), LoadPolicy::Strict)
    }

    pub(crate) fn sorted_edges(graph: &Graph) -> Vec<(u32, u32)> {
        let mut edges: Vec<(u32, u32)> = graph.edges().map(|(a, b)| (a.0, b.0)).collect();
        edges.sort();
        edges
    }

    #[test]
    fn delete_middle_of_chain_bridges_neighbours() {
        let mut graph = graph_of(3, &[(1, 2), (2, 3)]).unwrap();

        let bridged = graph.delete_node(NodeId(2)).unwrap();

        assert_eq!(bridged, vec![(NodeId(1), NodeId(3))]);
        assert_eq!(sorted_edges(&graph), vec![(1, 3)]);
        assert!(!graph.contains(NodeId(2)));
        assert_eq!(graph.deleted(), &[NodeId(2)]);
        graph.validate().unwrap();
    }

    #[test]
    fn linking_through_a_sibling_purges_the_shortcut() {
        let mut graph = graph_of(3, &[]).unwrap();
        graph.link_nodes(NodeId(1), NodeId(2)).unwrap();
        graph.link_nodes(NodeId(1), NodeId(3)).unwrap();

        let outcome = graph.link_nodes(NodeId(3), NodeId(2)).unwrap();

        assert_eq!(
            outcome,
            LinkOutcome::Linked {
                purged: vec![(NodeId(1), NodeId(2))]
            }
        );
        assert_eq!(sorted_edges(&graph), vec![(1, 3), (3, 2)]);
        graph.validate().unwrap();
    }

    #[test]
    fn linking_purges_redundant_edges_further_downstream() {
        // 1 -> 2, 1 -> 4, 3 -> 4 ; linking 2 -> 3 makes 1 -> 4 redundant
        // (1 -> 2 -> 3 -> 4) even though 4 is not the new edge's target.
        let mut graph = graph_of(4, &[(1, 2), (1, 4), (3, 4)]).unwrap();

        let outcome = graph.link_nodes(NodeId(2), NodeId(3)).unwrap();

        assert_eq!(
            outcome,
            LinkOutcome::Linked {
                purged: vec![(NodeId(1), NodeId(4))]
            }
        );
        assert_eq!(sorted_edges(&graph), vec![(1, 2), (2, 3), (3, 4)]);
        graph.validate().unwrap();
    }

    #[test]
    fn self_edge_is_a_cycle() {
        let mut graph = graph_of(2, &[(1, 2)]).unwrap();
        let before = graph.clone();

        let err = graph.link_nodes(NodeId(2), NodeId(2)).unwrap_err();

        assert_eq!(
            err,
            CoreError::Cycle {
                up: NodeId(2),
                down: NodeId(2)
            }
        );
        assert_eq!(graph, before);
    }

    #[test]
    fn back_edge_is_a_cycle_and_changes_nothing() {
        let mut graph = graph_of(3, &[(1, 2), (2, 3)]).unwrap();
        let before = graph.clone();

        let err = graph.link_nodes(NodeId(3), NodeId(1)).unwrap_err();

        assert!(matches!(err, CoreError::Cycle { .. }));
        assert_eq!(graph, before);
    }

    #[test]
    fn relinking_an_existing_edge_is_a_no_op() {
        let mut graph = graph_of(3, &[(1, 2), (2, 3)]).unwrap();
        let before = graph.clone();

        let outcome = graph.link_nodes(NodeId(1), NodeId(2)).unwrap();

        assert_eq!(outcome, LinkOutcome::AlreadyLinked);
        assert_eq!(graph, before);
    }

    #[test]
    fn implied_edge_is_not_inserted() {
        let mut graph = graph_of(3, &[(1, 2), (2, 3)]).unwrap();

        let outcome = graph.link_nodes(NodeId(1), NodeId(3)).unwrap();

        assert_eq!(outcome, LinkOutcome::Implied);
        assert_eq!(sorted_edges(&graph), vec![(1, 2), (2, 3)]);
    }

    #[test]
    fn unlink_is_idempotent() {
        let mut graph = graph_of(3, &[(1, 2), (2, 3)]).unwrap();

        assert!(graph.unlink_nodes(NodeId(1), NodeId(2)).unwrap());
        let once = graph.clone();
        assert!(!graph.unlink_nodes(NodeId(1), NodeId(2)).unwrap());

        assert_eq!(graph, once);
        assert_eq!(sorted_edges(&graph), vec![(2, 3)]);
    }

    #[test]
    fn missing_ids_are_not_found() {
        let mut graph = graph_of(2, &[(1, 2)]).unwrap();

        assert_eq!(
            graph.link_nodes(NodeId(1), NodeId(9)).unwrap_err(),
            CoreError::NotFound { id: NodeId(9) }
        );
        assert_eq!(
            graph.unlink_nodes(NodeId(9), NodeId(2)).unwrap_err(),
            CoreError::NotFound { id: NodeId(9) }
        );
        assert_eq!(
            graph.delete_node(NodeId(9)).unwrap_err(),
            CoreError::NotFound { id: NodeId(9) }
        );
        assert!(graph.deleted().is_empty());
    }

    #[test]
    fn entry_node_cannot_be_deleted() {
        let mut graph = graph_of(2, &[(1, 2)]).unwrap();

        let err = graph.delete_node(NodeId(1)).unwrap_err();

        assert_eq!(err, CoreError::ProtectedNode { id: NodeId(1) });
        assert_eq!(graph.count_nodes(), 2);
    }

    #[test]
    fn deleting_an_exit_drops_it_from_exits() {
        let mut parts = parts_of(3, &[(1, 2), (2, 3)]);
        parts.exits = vec![NodeId(3)];
        let mut graph = Graph::from_parts(parts, LoadPolicy::Strict).unwrap();

        let bridged = graph.delete_node(NodeId(3)).unwrap();

        assert!(bridged.is_empty());
        assert!(graph.exits().is_empty());
        assert_eq!(sorted_edges(&graph), vec![(1, 2)]);
        assert_eq!(graph.deleted(), &[NodeId(3)]);
        graph.validate().unwrap();
    }

    #[test]
    fn default_parts_have_no_nodes() {
        let parts = GraphParts::default();

        assert_eq!(parts.entry, NodeId::default());
        assert!(parts.nodes.is_empty());
        assert!(parts.exits.is_empty());
        assert!(parts.parent_cluster.is_none());
    }

    #[test]
    fn delete_skips_bridges_implied_by_other_paths() {
        // 1 -> 2 -> 4 and 1 -> 3 -> 4: deleting 2 must not add 1 -> 4.
        let mut graph = graph_of(4, &[(1, 2), (1, 3), (2, 4), (3, 4)]).unwrap();

        let bridged = graph.delete_node(NodeId(2)).unwrap();

        assert!(bridged.is_empty());
        assert_eq!(sorted_edges(&graph), vec![(1, 3), (3, 4)]);
        graph.validate().unwrap();
    }

    #[test]
    fn delete_fans_in_and_out() {
        // 1 -> {2, 3} -> 4 -> {5, 6}: deleting 4 links 2 and 3 to 5 and 6.
        let mut graph =
            graph_of(6, &[(1, 2), (1, 3), (2, 4), (3, 4), (4, 5), (4, 6)]).unwrap();

        let bridged = graph.delete_node(NodeId(4)).unwrap();

        assert_eq!(bridged.len(), 4);
        assert_eq!(
            sorted_edges(&graph),
            vec![(1, 2), (1, 3), (2, 5), (2, 6), (3, 5), (3, 6)]
        );
        graph.validate().unwrap();
    }

    #[test]
    fn counts() {
        let mut graph = graph_of(3, &[(1, 2), (2, 3)]).unwrap();
        assert_eq!(graph.count_nodes(), 3);
        assert_eq!(graph.count_closed(), 0);

        if let Some(node) = graph.nodes.get_mut(&NodeId(3)) {
            node.kind = issue(IssueState::Closed);
        }
        assert_eq!(graph.count_closed(), 1);

        graph.delete_node(NodeId(2)).unwrap();
        assert_eq!(graph.count_nodes(), 2);
    }

    #[test]
    fn strict_load_rejects_redundant_edges() {
        let err = graph_of(3, &[(1, 2), (2, 3), (1, 3)]).unwrap_err();

        assert_eq!(
            err,
            CoreError::GraphIntegrity(IntegrityViolation::RedundantEdge {
                from: NodeId(1),
                to: NodeId(3)
            })
        );
    }

    #[test]
    fn reaches_follows_downstream_edges() {
        let graph = graph_of(4, &[(1, 2), (2, 3)]).unwrap();

        assert!(graph.reaches(NodeId(1), NodeId(3)).unwrap());
        assert!(!graph.reaches(NodeId(3), NodeId(1)).unwrap());
        assert!(!graph.reaches(NodeId(1), NodeId(4)).unwrap());
        assert!(!graph.reaches(NodeId(2), NodeId(2)).unwrap());
    }

    #[test]
    fn parts_round_trip() {
        let graph = graph_of(3, &[(1, 2), (2, 3)]).unwrap();
        let rebuilt = Graph::from_parts(graph.clone().into_parts(), LoadPolicy::Strict).unwrap();
        assert_eq!(rebuilt, graph);
    }
}
