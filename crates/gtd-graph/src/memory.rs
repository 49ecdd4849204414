//! In-process arena store.
//!
//! Nodes live in one `BTreeMap` keyed by their integer handle, so listing is
//! naturally in creation order. A single `RwLock` write guard covers each
//! `write`, which gives the same all-or-nothing behaviour as a Neo4j
//! transaction.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use gtd_core::NodeId;
use tokio::sync::RwLock;

use crate::client::GraphError;
use crate::store::{NodeRecord, NodeStore};

#[derive(Debug, Default)]
struct Arena {
    last_id: i64,
    nodes: BTreeMap<NodeId, NodeRecord>,
}

/// Thread-safe in-memory node store. Clone is cheap (inner Arc).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    arena: Arc<RwLock<Arena>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of nodes across all labels.
    pub async fn len(&self) -> usize {
        self.arena.read().await.nodes.len()
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn allocate_ids(&self, count: usize) -> Result<Vec<NodeId>, GraphError> {
        let mut arena = self.arena.write().await;
        let first = arena.last_id + 1;
        arena.last_id += count as i64;
        Ok((first..=arena.last_id).map(NodeId).collect())
    }

    async fn write(&self, records: Vec<NodeRecord>) -> Result<(), GraphError> {
        let mut arena = self.arena.write().await;
        for record in &records {
            if let Some(existing) = arena.nodes.get(&record.id) {
                if existing.label != record.label {
                    return Err(GraphError::LabelMismatch {
                        id: record.id.0,
                        expected: record.label.clone(),
                        found: existing.label.clone(),
                    });
                }
            }
        }
        for record in records {
            arena.last_id = arena.last_id.max(record.id.0);
            arena.nodes.insert(record.id, record);
        }
        Ok(())
    }

    async fn read(&self, label: &str, id: NodeId) -> Result<Option<NodeRecord>, GraphError> {
        let arena = self.arena.read().await;
        Ok(arena.nodes.get(&id).filter(|n| n.label == label).cloned())
    }

    async fn list(
        &self,
        label: &str,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<NodeRecord>, GraphError> {
        let arena = self.arena.read().await;
        Ok(arena
            .nodes
            .values()
            .filter(|n| n.label == label)
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, label: &str) -> Result<u64, GraphError> {
        let arena = self.arena.read().await;
        Ok(arena.nodes.values().filter(|n| n.label == label).count() as u64)
    }

    async fn find_by_property(
        &self,
        label: &str,
        property: &str,
        value: &str,
    ) -> Result<Option<NodeRecord>, GraphError> {
        let arena = self.arena.read().await;
        Ok(arena
            .nodes
            .values()
            .find(|n| {
                n.label == label
                    && n.properties.get(property).and_then(|v| v.as_str()) == Some(value)
            })
            .cloned())
    }

    async fn remove(&self, label: &str, id: NodeId) -> Result<bool, GraphError> {
        let mut arena = self.arena.write().await;
        let exists = arena.nodes.get(&id).is_some_and(|n| n.label == label);
        if !exists {
            return Ok(false);
        }

        arena.nodes.remove(&id);
        for node in arena.nodes.values_mut() {
            node.relations.retain(|r| r.target != id);
        }
        tracing::debug!(label, id = id.0, "Node removed from arena");
        Ok(true)
    }
}
