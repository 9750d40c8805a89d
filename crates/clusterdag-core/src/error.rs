//! Core error types for clusterdag-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Every public
//! graph operation either succeeds with all invariants restored or returns
//! one of these with the graph left untouched.

use thiserror::Error;

use crate::id::NodeId;

/// Core errors produced by the graph engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A node id was not found in the graph.
    #[error("node not found: NodeId({id})")]
    NotFound { id: NodeId },

    /// Linking `up -> down` would close a directed cycle.
    #[error("linking {up} -> {down} would create a cycle")]
    Cycle { up: NodeId, down: NodeId },

    /// The graph violates a structural invariant, either at load time or
    /// when detected defensively during a traversal.
    #[error("graph integrity violation: {0}")]
    GraphIntegrity(IntegrityViolation),

    /// The entry node anchors the graph and cannot be deleted.
    #[error("node {id} is the entry node and cannot be deleted")]
    ProtectedNode { id: NodeId },
}

/// The first invariant violation found while validating a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    /// A node record is stored under a key that differs from its own id.
    #[error("node stored under key {key} carries id {id}")]
    KeyMismatch { key: NodeId, id: NodeId },

    /// An adjacency list references an id with no node record.
    #[error("node {node} references missing node {missing}")]
    DanglingReference { node: NodeId, missing: NodeId },

    /// `from` lists `to` downstream but `to` does not list `from` upstream,
    /// or the reverse.
    #[error("edge {from} -> {to} is not recorded on both endpoints")]
    AsymmetricEdge { from: NodeId, to: NodeId },

    /// The same direct edge appears more than once.
    #[error("edge {from} -> {to} is recorded more than once")]
    DuplicateEdge { from: NodeId, to: NodeId },

    /// The downstream relation contains a directed cycle through `node`.
    #[error("cycle detected through node {node}")]
    Cycle { node: NodeId },

    /// A direct edge duplicates a longer path between the same endpoints.
    #[error("edge {from} -> {to} is implied by a longer path")]
    RedundantEdge { from: NodeId, to: NodeId },

    /// The entry id (or an exit id) has no node record.
    #[error("terminal node {id} is missing")]
    MissingTerminal { id: NodeId },

    /// A cluster reports more completed children than it has.
    #[error("cluster {id} has {complete} completed of {count} children")]
    ClusterProgress { id: NodeId, complete: u32, count: u32 },
}

impl From<IntegrityViolation> for CoreError {
    fn from(violation: IntegrityViolation) -> Self {
        CoreError::GraphIntegrity(violation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_ids() {
        let err = CoreError::Cycle {
            up: NodeId(3),
            down: NodeId(1),
        };
        assert_eq!(err.to_string(), "linking 3 -> 1 would create a cycle");

        let err: CoreError = IntegrityViolation::AsymmetricEdge {
            from: NodeId(1),
            to: NodeId(2),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "graph integrity violation: edge 1 -> 2 is not recorded on both endpoints"
        );
    }
}
