//! Loading and persisting cluster dependency graphs.
//!
//! The graph engine in `clusterdag-core` performs no I/O. This crate is the
//! collaborator on either side of it: it reads the flat JSON document the
//! service exchanges per cluster into a validated [`Graph`], and writes a
//! graph back out in the same shape.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`types`]: ClusterId
//! - [`document`]: flat document <-> Graph conversion
//! - [`traits`]: GraphStore trait definition
//! - [`memory`]: InMemoryStore implementation
//! - [`file`]: FileStore implementation (one JSON file per cluster)
//! - [`sample`]: the stub project cluster used for demos and tests
//!
//! [`Graph`]: clusterdag_core::Graph

pub mod document;
pub mod error;
pub mod file;
pub mod memory;
pub mod sample;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use document::{parse_document, render_document};
pub use error::StorageError;
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use traits::GraphStore;
pub use types::ClusterId;
