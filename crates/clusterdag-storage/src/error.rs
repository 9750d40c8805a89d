//! Storage error types for clusterdag-storage.

use clusterdag_core::CoreError;
use thiserror::Error;

use crate::types::ClusterId;

/// Errors produced by loading, converting or persisting graphs.
#[derive(Debug, Error)]
pub enum StorageError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing a backing file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// No graph is stored for the cluster.
    #[error("cluster not found: {0}")]
    ClusterNotFound(ClusterId),

    /// A document entry could not be interpreted.
    #[error("malformed document entry '{key}': {reason}")]
    Malformed { key: String, reason: String },

    /// The decoded graph was rejected by the engine.
    #[error(transparent)]
    Graph(#[from] CoreError),
}
