//! File-backed implementation of [`GraphStore`].
//!
//! Each cluster's document lives in `<root>/cluster-<id>.json`. Saves write
//! a sibling temp file and rename it over the target so a crash never leaves
//! a half-written document behind.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use clusterdag_core::{Graph, LoadPolicy};

use crate::document::{parse_document, render_document};
use crate::error::StorageError;
use crate::traits::GraphStore;
use crate::types::ClusterId;

const PREFIX: &str = "cluster-";
const EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    /// Path of the document for `cluster`.
    pub fn path_for(&self, cluster: ClusterId) -> PathBuf {
        self.root.join(format!("{PREFIX}{cluster}.{EXTENSION}"))
    }
}

impl GraphStore for FileStore {
    fn load(&self, cluster: ClusterId, policy: LoadPolicy) -> Result<Graph, StorageError> {
        let path = self.path_for(cluster);
        let document = match fs::read_to_string(&path) {
            Ok(document) => document,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::ClusterNotFound(cluster))
            }
            Err(e) => return Err(e.into()),
        };

        let graph = parse_document(&document, policy)?;
        tracing::info!(%cluster, path = %path.display(), nodes = graph.count_nodes(), "loaded graph");
        Ok(graph)
    }

    fn save(&mut self, cluster: ClusterId, graph: &Graph) -> Result<(), StorageError> {
        let document = render_document(graph)?;
        fs::create_dir_all(&self.root)?;

        let path = self.path_for(cluster);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, document)?;
        fs::rename(&staging, &path)?;

        tracing::info!(%cluster, path = %path.display(), nodes = graph.count_nodes(), "saved graph");
        Ok(())
    }

    fn list(&self) -> Result<Vec<ClusterId>, StorageError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut clusters = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.strip_prefix(PREFIX))
                .and_then(|raw| raw.parse().ok());
            if let Some(id) = id {
                clusters.push(id);
            }
        }
        clusters.sort();
        Ok(clusters)
    }
}

#[cfg(test)]
mod tests {
    use clusterdag_core::NodeId;

    use super::*;
    use crate::sample::sample_document;

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("graphs"));

        let mut graph = store
            .import(ClusterId(5), &sample_document(), LoadPolicy::Strict)
            .unwrap();
        graph.delete_node(NodeId(7)).unwrap();
        store.save(ClusterId(5), &graph).unwrap();

        assert!(store.path_for(ClusterId(5)).exists());
        let reloaded = store.load(ClusterId(5), LoadPolicy::Strict).unwrap();
        assert_eq!(reloaded, graph);
    }

    #[test]
    fn list_ignores_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        let graph = parse_document(&sample_document(), LoadPolicy::Strict).unwrap();
        store.save(ClusterId(2), &graph).unwrap();
        store.save(ClusterId(1), &graph).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("cluster-abc.json"), "{}").unwrap();

        assert_eq!(store.list().unwrap(), vec![ClusterId(1), ClusterId(2)]);
    }

    #[test]
    fn missing_root_lists_nothing_and_loads_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent"));

        assert!(store.list().unwrap().is_empty());
        assert!(matches!(
            store.load(ClusterId(1), LoadPolicy::Strict),
            Err(StorageError::ClusterNotFound(ClusterId(1)))
        ));
    }
}
