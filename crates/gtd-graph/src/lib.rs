//! GTD Graph — persistence port for the catalog's entity graph.
//!
//! Entities are stored as a flat arena of nodes whose relationships are
//! integer handles. This crate owns that arena: the `NodeStore` backends
//! (in-memory and Neo4j) and the generic `GraphRepository` that flattens a
//! nested entity into nodes on save and materializes it again, depth-bounded,
//! on fetch.

pub mod client;
pub mod memory;
pub mod mutations;
pub mod queries;
pub mod repository;
pub mod store;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use memory::MemoryStore;
pub use repository::{
    check_shared_edits, node_ids, GraphRepository, Page, PageRequest, Repository,
};
pub use store::{NodeRecord, NodeStore, RelationRecord};
