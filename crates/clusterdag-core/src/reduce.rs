//! Incremental transitive reduction.
//!
//! After an edge `new_up -> node` is inserted, the only edges that can have
//! become redundant are those running from `new_up` or one of its ancestors
//! into `node` or one of its descendants. [`Graph::reduce_after_link`] finds
//! exactly those and removes them. Traversals use explicit work-lists with a
//! visited set instead of recursion.

use std::collections::HashSet;

use crate::error::{CoreError, IntegrityViolation};
use crate::graph::{Edge, Graph};
use crate::id::NodeId;
use crate::validate;

impl Graph {
    /// Every node reachable from `id` over upstream edges, excluding `id`.
    ///
    /// The walk is depth-first and tracks the nodes on its current path.
    /// Meeting one of them again means the graph holds a cycle, whether or
    /// not it runs through `id`, which is reported instead of looping.
    pub(crate) fn gather_ancestors(&self, id: NodeId) -> Result<HashSet<NodeId>, CoreError> {
        self.require(id)?;

        let mut finished = HashSet::new();
        let mut on_path = HashSet::from([id]);
        // (node, index of the next upstream neighbour to visit)
        let mut stack: Vec<(NodeId, usize)> = vec![(id, 0)];

        while let Some(&(current, cursor)) = stack.last() {
            let node = self.require(current)?;
            let Some(&up) = node.upstream.get(cursor) else {
                stack.pop();
                on_path.remove(&current);
                finished.insert(current);
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            if on_path.contains(&up) {
                return Err(IntegrityViolation::Cycle { node: up }.into());
            }
            if finished.contains(&up) {
                continue;
            }
            if !self.contains(up) {
                return Err(IntegrityViolation::DanglingReference {
                    node: current,
                    missing: up,
                }
                .into());
            }
            on_path.insert(up);
            stack.push((up, 0));
        }

        finished.remove(&id);
        Ok(finished)
    }

    /// Unlinks every direct upstream neighbour of `id` that is in `ancestors`.
    pub(crate) fn purge_direct_upstream_in(
        &mut self,
        id: NodeId,
        ancestors: &HashSet<NodeId>,
        purged: &mut Vec<Edge>,
    ) {
        let redundant: Vec<NodeId> = self
            .upstream_of(id)
            .filter(|up| ancestors.contains(up))
            .collect();

        for up in redundant {
            if self.remove_edge(up, id) {
                tracing::debug!(from = %up, to = %id, "purged redundant edge");
                purged.push((up, id));
            }
        }
    }

    /// Applies [`purge_direct_upstream_in`](Self::purge_direct_upstream_in)
    /// at every descendant of `id` (but not at `id` itself).
    pub(crate) fn purge_descendant_upstream_in(
        &mut self,
        id: NodeId,
        ancestors: &HashSet<NodeId>,
        purged: &mut Vec<Edge>,
    ) {
        let mut visited = HashSet::new();
        let mut stack: Vec<NodeId> = self.downstream_of(id).collect();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            // Purging only touches upstream lists, so the downstream walk is
            // unaffected by it.
            self.purge_direct_upstream_in(current, ancestors, purged);
            stack.extend(self.downstream_of(current));
        }
    }

    /// Restores transitive reduction after `new_up -> id` was inserted.
    ///
    /// `ancestors` must be the ancestor set of `new_up` gathered before the
    /// insertion; the caller gathers it so that nothing can fail once the
    /// graph has been touched. Returns the purged edges in removal order.
    pub(crate) fn reduce_after_link(
        &mut self,
        id: NodeId,
        new_up: NodeId,
        mut ancestors: HashSet<NodeId>,
    ) -> Vec<Edge> {
        let mut purged = Vec::new();

        self.purge_direct_upstream_in(id, &ancestors, &mut purged);
        ancestors.insert(new_up);
        self.purge_descendant_upstream_in(id, &ancestors, &mut purged);

        purged
    }

    /// Full transitive reduction from scratch, for input that was never
    /// built through [`link_nodes`](Graph::link_nodes). Requires an acyclic
    /// graph. Returns the removed edges.
    pub(crate) fn reduce_all(&mut self) -> Vec<Edge> {
        // In a DAG an edge is redundant against the full edge set exactly
        // when it is redundant against the reduced one, so all of them can be
        // found first and removed together.
        let redundant = validate::redundant_edges(self.nodes_map());
        for &(up, down) in &redundant {
            self.remove_edge(up, down);
        }
        redundant
    }
}
