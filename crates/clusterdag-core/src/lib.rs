pub mod error;
pub mod graph;
pub mod id;
pub mod node;
mod reduce;
mod validate;

// Re-export commonly used types
pub use error::{CoreError, IntegrityViolation};
pub use graph::{Edge, Graph, GraphParts, LinkOutcome, LoadPolicy, ParentCluster};
pub use id::NodeId;
pub use node::{ClusterInfo, IssueRef, IssueState, Node, NodeKind};
