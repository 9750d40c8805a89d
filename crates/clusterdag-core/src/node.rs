//! Graph vertices: work items of a cluster's dependency graph.
//!
//! A [`Node`] is either a sub-[`Cluster`](NodeKind::Cluster) of work, a
//! GitHub [`Issue`](NodeKind::Issue), or one of the cluster's terminals
//! ([`Entry`](NodeKind::Entry) / [`Exit`](NodeKind::Exit)). Adjacency is
//! stored on both endpoints: `upstream` holds the sources of incoming edges,
//! `downstream` the targets of outgoing ones. Their order carries no meaning
//! beyond deterministic iteration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::id::NodeId;

/// Adjacency list of a node. Most work items have a handful of neighbours.
pub type Adjacency = SmallVec<[NodeId; 4]>;

/// Open/closed state of a tracked issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// Progress and identity of a sub-cluster.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusterInfo {
    /// Primary key in the clusters table.
    pub cluster_id: u32,
    /// Short label, at most 32 characters upstream.
    #[serde(default)]
    pub abbrev: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Entry followed by the exits of the sub-cluster's own graph. Empty for
    /// the container cluster, whose terminals are the graph's entry and exits.
    #[serde(default)]
    pub endpoints: Vec<NodeId>,
    pub children_count: u32,
    pub children_complete: u32,
    /// Cluster row fields the engine does not interpret, kept so a rewrite
    /// of the document preserves them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClusterInfo {
    /// A cluster is complete once every child is.
    pub fn is_complete(&self) -> bool {
        self.children_complete == self.children_count
    }
}

/// Reference to the external issue a node tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    /// Issue id on the tracker.
    pub issue_id: u64,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub title: String,
    pub state: IssueState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    /// Remaining tracker fields (labels, assignee, body, timestamps, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IssueRef {
    /// Minimal reference carrying only the fields the engine inspects.
    pub fn new(issue_id: u64, state: IssueState) -> Self {
        IssueRef {
            issue_id,
            number: 0,
            title: String::new(),
            state,
            html_url: None,
            extra: Map::new(),
        }
    }
}

/// What a node represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Cluster(ClusterInfo),
    Entry,
    Exit,
    Issue(IssueRef),
}

/// One vertex of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub upstream: Adjacency,
    #[serde(default)]
    pub downstream: Adjacency,
}

impl Node {
    /// Creates an unlinked node.
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Node {
            id,
            kind,
            upstream: Adjacency::new(),
            downstream: Adjacency::new(),
        }
    }

    /// Builder-style helper for loaders that already know the adjacency.
    pub fn with_edges(
        mut self,
        upstream: impl IntoIterator<Item = NodeId>,
        downstream: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        self.upstream = upstream.into_iter().collect();
        self.downstream = downstream.into_iter().collect();
        self
    }

    /// Closed work: a complete cluster or a closed issue. Terminals never
    /// count as closed.
    pub fn is_closed(&self) -> bool {
        match &self.kind {
            NodeKind::Cluster(cluster) => cluster.is_complete(),
            NodeKind::Issue(issue) => issue.state == IssueState::Closed,
            NodeKind::Entry | NodeKind::Exit => false,
        }
    }
}
