//! The [`GraphStore`] trait defining the storage contract for cluster graphs.
//!
//! Every backend stores the flat cluster document, so they are swappable
//! without changing the callers. The trait is synchronous, matching the
//! single-writer engine.

use clusterdag_core::{Graph, LoadPolicy};

use crate::error::StorageError;
use crate::types::ClusterId;

/// The storage contract for cluster graphs.
pub trait GraphStore {
    /// Loads and validates the graph of `cluster`.
    ///
    /// Fails with [`StorageError::ClusterNotFound`] if nothing is stored.
    fn load(&self, cluster: ClusterId, policy: LoadPolicy) -> Result<Graph, StorageError>;

    /// Stores `graph` as the graph of `cluster`, replacing any previous one.
    fn save(&mut self, cluster: ClusterId, graph: &Graph) -> Result<(), StorageError>;

    /// Stores a raw document after checking that it loads under `policy`.
    fn import(
        &mut self,
        cluster: ClusterId,
        document: &str,
        policy: LoadPolicy,
    ) -> Result<Graph, StorageError> {
        let graph = crate::document::parse_document(document, policy)?;
        self.save(cluster, &graph)?;
        Ok(graph)
    }

    /// All clusters with a stored graph, ascending.
    fn list(&self) -> Result<Vec<ClusterId>, StorageError>;
}
