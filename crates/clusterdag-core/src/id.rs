//! Stable node identifier for the dependency graph.
//!
//! Node ids are assigned by the persistence layer (they are primary keys in
//! the nodes table) and never invented by the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable node identifier. Serializes as a bare integer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
