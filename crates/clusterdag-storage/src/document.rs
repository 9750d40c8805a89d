//! Conversion between the flat cluster document and [`Graph`].
//!
//! The service exchanges one JSON object per cluster. Three bookkeeping keys
//! share its namespace with the node records, which are keyed by their
//! decimal id:
//!
//! ```text
//! {
//!   "entry": 2,
//!   "deleted": [],
//!   "parent_cluster": 1,
//!   "1": { "id": 1, "type": "cluster", "cluster": { "endpoints": [2, 3], ... }, ... },
//!   "2": { "id": 2, "type": "entry", "upstream_nodes": null, "downstream_nodes": [4, 6], ... },
//!   ...
//! }
//! ```
//!
//! The record stored under the `parent_cluster` key is the container itself,
//! not a vertex; it becomes [`Graph::parent_cluster`]. A `null` adjacency
//! list means empty.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use clusterdag_core::{
    ClusterInfo, Graph, GraphParts, IssueRef, IssueState, LoadPolicy, Node, NodeId, NodeKind,
    ParentCluster,
};

use crate::error::StorageError;

const ENTRY_KEY: &str = "entry";
const DELETED_KEY: &str = "deleted";
const PARENT_KEY: &str = "parent_cluster";

/// Node type tag of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Cluster,
    Entry,
    Exit,
    Issue,
}

/// Cluster row embedded in a cluster-typed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub id: u32,
    #[serde(default)]
    pub abbrev: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Entry followed by the exits of the cluster's own graph.
    #[serde(default)]
    pub endpoints: Vec<u32>,
    pub children_count: u32,
    pub children_complete: u32,
    /// `creator` and any other column the graph does not read.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The tracker's issue object. Only the named fields are interpreted; the
/// rest travel through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: u64,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub title: String,
    pub state: IssueState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One node row as it appears in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: u32,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    #[serde(default)]
    pub parent_cluster: Option<u32>,
    #[serde(default)]
    pub cluster_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterRecord>,
    #[serde(default)]
    pub issue_id: Option<IssueRecord>,
    #[serde(default)]
    pub upstream_nodes: Option<Vec<u32>>,
    #[serde(default)]
    pub downstream_nodes: Option<Vec<u32>>,
}

/// Parses a cluster document and validates it into a [`Graph`].
pub fn parse_document(json: &str, policy: LoadPolicy) -> Result<Graph, StorageError> {
    let map: Map<String, Value> = serde_json::from_str(json)?;
    let parts = decode(map)?;
    Ok(Graph::from_parts(parts, policy)?)
}

/// Renders a graph as a cluster document.
pub fn render_document(graph: &Graph) -> Result<String, StorageError> {
    let map = encode(graph)?;
    Ok(serde_json::to_string_pretty(&Value::Object(map))?)
}

fn decode(mut map: Map<String, Value>) -> Result<GraphParts, StorageError> {
    let entry: u32 = take_field(&mut map, ENTRY_KEY)?.ok_or_else(|| StorageError::Malformed {
        key: ENTRY_KEY.to_string(),
        reason: "missing".to_string(),
    })?;
    let deleted: Vec<u32> = take_field(&mut map, DELETED_KEY)?.unwrap_or_default();
    let parent_id: Option<u32> = take_field(&mut map, PARENT_KEY)?;

    let mut nodes = IndexMap::new();
    let mut parent_cluster = None;
    let mut endpoints = Vec::new();

    for (key, value) in map {
        let record: NodeRecord =
            serde_json::from_value(value).map_err(|e| StorageError::Malformed {
                key: key.clone(),
                reason: e.to_string(),
            })?;
        let key_id: u32 = key.parse().map_err(|_| StorageError::Malformed {
            key: key.clone(),
            reason: "node keys must be integer ids".to_string(),
        })?;

        if Some(key_id) == parent_id {
            let mut cluster = record.cluster.ok_or_else(|| StorageError::Malformed {
                key: key.clone(),
                reason: "parent cluster record has no cluster row".to_string(),
            })?;
            endpoints = std::mem::take(&mut cluster.endpoints);
            parent_cluster = Some(ParentCluster {
                id: NodeId(key_id),
                cluster: cluster_info(cluster),
            });
            continue;
        }

        // Key/id agreement is checked by the engine on load.
        let node = node_from_record(&key, record)?;
        nodes.insert(NodeId(key_id), node);
    }

    let exits: Vec<NodeId> = if endpoints.is_empty() {
        nodes
            .values()
            .filter(|node| node.kind == NodeKind::Exit)
            .map(|node| node.id)
            .collect()
    } else {
        endpoints
            .into_iter()
            .filter(|&id| id != entry)
            .map(NodeId)
            .collect()
    };

    tracing::debug!(nodes = nodes.len(), exits = exits.len(), "decoded cluster document");

    Ok(GraphParts {
        nodes,
        entry: NodeId(entry),
        exits,
        deleted: deleted.into_iter().map(NodeId).collect(),
        parent_cluster,
    })
}

fn take_field<T: serde::de::DeserializeOwned>(
    map: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StorageError::Malformed {
                key: key.to_string(),
                reason: e.to_string(),
            }),
    }
}

fn cluster_info(record: ClusterRecord) -> ClusterInfo {
    ClusterInfo {
        cluster_id: record.id,
        abbrev: record.abbrev,
        name: record.name,
        description: record.description,
        endpoints: record.endpoints.into_iter().map(NodeId).collect(),
        children_count: record.children_count,
        children_complete: record.children_complete,
        extra: record.extra,
    }
}

fn node_from_record(key: &str, record: NodeRecord) -> Result<Node, StorageError> {
    let missing = |what: &str| StorageError::Malformed {
        key: key.to_string(),
        reason: format!("{what} record missing"),
    };

    let kind = match record.record_type {
        RecordType::Cluster => {
            let cluster = record.cluster.ok_or_else(|| missing("cluster"))?;
            NodeKind::Cluster(cluster_info(cluster))
        }
        RecordType::Issue => {
            let issue = record.issue_id.ok_or_else(|| missing("issue"))?;
            NodeKind::Issue(IssueRef {
                issue_id: issue.id,
                number: issue.number,
                title: issue.title,
                state: issue.state,
                html_url: issue.html_url,
                extra: issue.extra,
            })
        }
        RecordType::Entry => NodeKind::Entry,
        RecordType::Exit => NodeKind::Exit,
    };

    Ok(Node::new(NodeId(record.id), kind).with_edges(
        record.upstream_nodes.unwrap_or_default().into_iter().map(NodeId),
        record.downstream_nodes.unwrap_or_default().into_iter().map(NodeId),
    ))
}

fn encode(graph: &Graph) -> Result<Map<String, Value>, StorageError> {
    let mut map = Map::new();
    let parent_id = graph.parent_cluster().map(|parent| parent.id.0);

    map.insert(ENTRY_KEY.to_string(), serde_json::to_value(graph.entry())?);
    map.insert(DELETED_KEY.to_string(), serde_json::to_value(graph.deleted())?);
    map.insert(PARENT_KEY.to_string(), serde_json::to_value(parent_id)?);

    if let Some(parent) = graph.parent_cluster() {
        let endpoints = std::iter::once(graph.entry())
            .chain(graph.exits().iter().copied())
            .map(|id| id.0)
            .collect();
        let record = NodeRecord {
            id: parent.id.0,
            record_type: RecordType::Cluster,
            parent_cluster: None,
            cluster_id: Some(parent.cluster.cluster_id),
            cluster: Some(cluster_record(&parent.cluster, endpoints)),
            issue_id: None,
            upstream_nodes: Some(Vec::new()),
            downstream_nodes: Some(Vec::new()),
        };
        map.insert(parent.id.to_string(), serde_json::to_value(record)?);
    }

    for node in graph.nodes() {
        let record = record_from_node(node, parent_id);
        map.insert(node.id.to_string(), serde_json::to_value(record)?);
    }

    Ok(map)
}

fn cluster_record(info: &ClusterInfo, endpoints: Vec<u32>) -> ClusterRecord {
    ClusterRecord {
        id: info.cluster_id,
        abbrev: info.abbrev.clone(),
        name: info.name.clone(),
        description: info.description.clone(),
        endpoints,
        children_count: info.children_count,
        children_complete: info.children_complete,
        extra: info.extra.clone(),
    }
}

fn record_from_node(node: &Node, parent_id: Option<u32>) -> NodeRecord {
    let (record_type, cluster, issue) = match &node.kind {
        NodeKind::Cluster(info) => (
            RecordType::Cluster,
            Some(cluster_record(
                info,
                info.endpoints.iter().map(|id| id.0).collect(),
            )),
            None,
        ),
        NodeKind::Issue(issue) => (
            RecordType::Issue,
            None,
            Some(IssueRecord {
                id: issue.issue_id,
                number: issue.number,
                title: issue.title.clone(),
                state: issue.state,
                html_url: issue.html_url.clone(),
                extra: issue.extra.clone(),
            }),
        ),
        NodeKind::Entry => (RecordType::Entry, None, None),
        NodeKind::Exit => (RecordType::Exit, None, None),
    };

    NodeRecord {
        id: node.id.0,
        record_type,
        parent_cluster: parent_id,
        cluster_id: cluster.as_ref().map(|c| c.id),
        cluster,
        issue_id: issue,
        upstream_nodes: Some(node.upstream.iter().map(|id| id.0).collect()),
        downstream_nodes: Some(node.downstream.iter().map(|id| id.0).collect()),
    }
}
