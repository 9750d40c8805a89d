//! The stub project cluster: a small graph to seed demos and tests.
//!
//! ```text
//!            +-> 4 (issue, closed) --+-> 5 (cluster 2/5) --+
//! 2 (entry) -+                       X                     +-> 3 (exit)
//!            +-> 6 (cluster 2/2) ----+-> 7 (issue, open) --+
//! ```
//!
//! Both 4 and 6 feed both 5 and 7. Node 1 is the container cluster.

use serde_json::json;

/// Returns the stub project cluster as a document string.
pub fn sample_document() -> String {
    json!({
        "entry": 2,
        "deleted": [],
        "parent_cluster": 1,
        "1": {
            "id": 1,
            "type": "cluster",
            "parent_cluster": null,
            "cluster_id": 1,
            "cluster": {
                "id": 1,
                "abbrev": "ROOT",
                "name": "Project Root",
                "description": "Cluster of entire project",
                "endpoints": [2, 3],
                "creator": 1445825,
                "children_count": 5,
                "children_complete": 0
            },
            "issue_id": null,
            "upstream_nodes": [],
            "downstream_nodes": []
        },
        "2": {
            "id": 2,
            "type": "entry",
            "parent_cluster": 1,
            "cluster_id": null,
            "issue_id": null,
            "upstream_nodes": null,
            "downstream_nodes": [4, 6]
        },
        "3": {
            "id": 3,
            "type": "exit",
            "parent_cluster": 1,
            "cluster_id": null,
            "issue_id": null,
            "upstream_nodes": [5, 7],
            "downstream_nodes": []
        },
        "4": {
            "id": 4,
            "type": "issue",
            "parent_cluster": 1,
            "cluster_id": null,
            "issue_id": {
                "id": 82639324,
                "html_url": "https://github.com/relentlessbreakfast/sampleGraph/issues/4",
                "number": 4,
                "title": "Add O-auth",
                "state": "closed"
            },
            "upstream_nodes": [2],
            "downstream_nodes": [5, 7]
        },
        "5": {
            "id": 5,
            "type": "cluster",
            "parent_cluster": 1,
            "cluster_id": 5,
            "cluster": {
                "id": 5,
                "abbrev": "A/B",
                "name": "Cluster-Repo Selection Screen",
                "description": "Cluster of repo selection related tasks",
                "endpoints": [13, 14],
                "creator": 1445825,
                "children_count": 5,
                "children_complete": 2
            },
            "issue_id": null,
            "upstream_nodes": [4, 6],
            "downstream_nodes": [3]
        },
        "6": {
            "id": 6,
            "type": "cluster",
            "parent_cluster": 1,
            "cluster_id": 2,
            "cluster": {
                "id": 2,
                "abbrev": "DB",
                "name": "Cluster-Database Schema",
                "description": "Cluster of database schema related tasks",
                "endpoints": [11, 12],
                "creator": 1445825,
                "children_count": 2,
                "children_complete": 2
            },
            "issue_id": null,
            "upstream_nodes": [2],
            "downstream_nodes": [5, 7]
        },
        "7": {
            "id": 7,
            "type": "issue",
            "parent_cluster": 1,
            "cluster_id": null,
            "issue_id": {
                "id": 82639733,
                "html_url": "https://github.com/relentlessbreakfast/sampleGraph/issues/7",
                "number": 7,
                "title": "Make sample graph data",
                "state": "open"
            },
            "upstream_nodes": [4, 6],
            "downstream_nodes": [3]
        }
    })
    .to_string()
}
