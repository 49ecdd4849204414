//! Flat node storage: the arena behind every repository.

use async_trait::async_trait;
use gtd_core::NodeId;
use serde::{Deserialize, Serialize};

use crate::client::GraphError;

/// One stored node: scalar properties plus outgoing relationships as handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub label: String,
    /// Scalar fields, camelCase, nulls omitted.
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Outgoing relationships, ordered by `position` within a type.
    pub relations: Vec<RelationRecord>,
}

/// An outgoing relationship to another node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationRecord {
    pub rel_type: String,
    pub position: i64,
    pub target: NodeId,
    pub target_label: String,
}

impl NodeRecord {
    /// Outgoing targets of one relationship type, in position order.
    pub fn targets(&self, rel_type: &str) -> Vec<NodeId> {
        let mut edges: Vec<&RelationRecord> = self
            .relations
            .iter()
            .filter(|r| r.rel_type == rel_type)
            .collect();
        edges.sort_by_key(|r| r.position);
        edges.into_iter().map(|r| r.target).collect()
    }
}

/// Backend holding the node arena.
///
/// `write` is atomic: either every record (and its relationships) replaces
/// the stored version or nothing does. No cross-call locking is provided.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Reserve `count` fresh, never-reused ids.
    async fn allocate_ids(&self, count: usize) -> Result<Vec<NodeId>, GraphError>;

    /// Upsert records, replacing properties and outgoing relationships.
    async fn write(&self, records: Vec<NodeRecord>) -> Result<(), GraphError>;

    async fn read(&self, label: &str, id: NodeId) -> Result<Option<NodeRecord>, GraphError>;

    /// Nodes of one label in id order.
    async fn list(&self, label: &str, skip: u64, limit: u64)
        -> Result<Vec<NodeRecord>, GraphError>;

    async fn count(&self, label: &str) -> Result<u64, GraphError>;

    /// First node of `label` whose string `property` equals `value`.
    async fn find_by_property(
        &self,
        label: &str,
        property: &str,
        value: &str,
    ) -> Result<Option<NodeRecord>, GraphError>;

    /// Remove a node and every relationship touching it. Returns whether it existed.
    async fn remove(&self, label: &str, id: NodeId) -> Result<bool, GraphError>;
}
