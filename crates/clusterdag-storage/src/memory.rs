//! In-memory implementation of [`GraphStore`].
//!
//! [`InMemoryStore`] keeps rendered documents in a map, so it round-trips
//! through exactly the same format as [`FileStore`](crate::FileStore).

use std::collections::BTreeMap;

use clusterdag_core::{Graph, LoadPolicy};

use crate::document::{parse_document, render_document};
use crate::error::StorageError;
use crate::traits::GraphStore;
use crate::types::ClusterId;

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    documents: BTreeMap<ClusterId, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphStore for InMemoryStore {
    fn load(&self, cluster: ClusterId, policy: LoadPolicy) -> Result<Graph, StorageError> {
        let document = self
            .documents
            .get(&cluster)
            .ok_or(StorageError::ClusterNotFound(cluster))?;
        parse_document(document, policy)
    }

    fn save(&mut self, cluster: ClusterId, graph: &Graph) -> Result<(), StorageError> {
        let document = render_document(graph)?;
        self.documents.insert(cluster, document);
        Ok(())
    }

    fn list(&self) -> Result<Vec<ClusterId>, StorageError> {
        Ok(self.documents.keys().copied().collect())
    }
}
