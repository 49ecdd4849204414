//! Read operations against Neo4j, and the `NodeStore` impl for `GraphClient`.

use async_trait::async_trait;
use gtd_core::NodeId;
use neo4rs::query;

use crate::client::{GraphClient, GraphError};
use crate::store::{NodeRecord, NodeStore, RelationRecord};

/// Tail shared by every node read: outgoing edges collected in position order,
/// properties and edges returned as JSON text.
const RECORD_PROJECTION: &str = "OPTIONAL MATCH (n)-[r]->(m)
     WITH n, r, m ORDER BY r.position
     RETURN n.id AS id,
            apoc.convert.toJson(properties(n)) AS props,
            apoc.convert.toJson(collect(CASE WHEN r IS NULL THEN null ELSE {
                relType: type(r), position: r.position,
                target: m.id, targetLabel: head(labels(m))
            } END)) AS rels
     ORDER BY id";

impl GraphClient {
    // ── Single Node Lookups ──────────────────────────────────────

    /// Get a node by label and id.
    pub async fn get_node(&self, label: &str, id: NodeId) -> Result<Option<NodeRecord>, GraphError> {
        let cypher = format!("MATCH (n:{label} {{id: $id}}) {RECORD_PROJECTION}");
        let q = query(&cypher).param("id", id.0);

        match self.query_one(q).await? {
            Some(row) => Ok(Some(row_to_record(&row, label)?)),
            None => Ok(None),
        }
    }

    /// Get the lowest-id node whose `property` equals `value`.
    pub async fn find_node_by_property(
        &self,
        label: &str,
        property: &str,
        value: &str,
    ) -> Result<Option<NodeRecord>, GraphError> {
        let cypher = format!(
            "MATCH (n:{label}) WHERE n[$property] = $value
             WITH n ORDER BY n.id LIMIT 1
             {RECORD_PROJECTION}"
        );

        let q = query(&cypher)
            .param("property", property)
            .param("value", value);

        match self.query_one(q).await? {
            Some(row) => Ok(Some(row_to_record(&row, label)?)),
            None => Ok(None),
        }
    }

    // ── Listing ──────────────────────────────────────────────────

    /// List nodes of a label in id order.
    pub async fn list_nodes(
        &self,
        label: &str,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<NodeRecord>, GraphError> {
        let cypher = format!(
            "MATCH (n:{label})
             WITH n ORDER BY n.id SKIP $skip LIMIT $limit
             {RECORD_PROJECTION}"
        );

        let q = query(&cypher)
            .param("skip", skip as i64)
            .param("limit", limit as i64);

        self.query_rows(q)
            .await?
            .iter()
            .map(|row| row_to_record(row, label))
            .collect()
    }

    /// Count nodes of a given label.
    pub async fn count_nodes(&self, label: &str) -> Result<u64, GraphError> {
        let cypher = format!("MATCH (n:{label}) RETURN count(n) AS cnt");

        match self.query_one(query(&cypher)).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0) as u64),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl NodeStore for GraphClient {
    async fn allocate_ids(&self, count: usize) -> Result<Vec<NodeId>, GraphError> {
        self.allocate_node_ids(count).await
    }

    async fn write(&self, records: Vec<NodeRecord>) -> Result<(), GraphError> {
        self.write_records(&records).await
    }

    async fn read(&self, label: &str, id: NodeId) -> Result<Option<NodeRecord>, GraphError> {
        self.get_node(label, id).await
    }

    async fn list(
        &self,
        label: &str,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<NodeRecord>, GraphError> {
        self.list_nodes(label, skip, limit).await
    }

    async fn count(&self, label: &str) -> Result<u64, GraphError> {
        self.count_nodes(label).await
    }

    async fn find_by_property(
        &self,
        label: &str,
        property: &str,
        value: &str,
    ) -> Result<Option<NodeRecord>, GraphError> {
        self.find_node_by_property(label, property, value).await
    }

    async fn remove(&self, label: &str, id: NodeId) -> Result<bool, GraphError> {
        self.delete_node(label, id).await
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn row_to_record(row: &neo4rs::Row, label: &str) -> Result<NodeRecord, GraphError> {
    let id: i64 = row
        .get("id")
        .map_err(|e| GraphError::Serialization(format!("Failed to read node id: {e}")))?;
    let props: String = row
        .get("props")
        .map_err(|e| GraphError::Serialization(format!("Failed to read properties: {e}")))?;
    let rels: String = row
        .get("rels")
        .map_err(|e| GraphError::Serialization(format!("Failed to read relations: {e}")))?;

    decode_record(NodeId(id), label, &props, &rels)
}

/// Build a record from the JSON text produced by `RECORD_PROJECTION`.
fn decode_record(
    id: NodeId,
    label: &str,
    props: &str,
    rels: &str,
) -> Result<NodeRecord, GraphError> {
    let mut properties: serde_json::Map<String, serde_json::Value> = serde_json::from_str(props)?;
    properties.remove("id");
    let relations: Vec<RelationRecord> = serde_json::from_str(rels)?;

    Ok(NodeRecord {
        id,
        label: label.to_string(),
        properties,
        relations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_strips_id_property() {
        let record = decode_record(
            NodeId(7),
            "City",
            r#"{"id": 7, "name": "Gdansk", "latitude": 54.35}"#,
            r#"[{"relType": "PART_OF", "position": 0, "target": 6, "targetLabel": "Province"}]"#,
        )
        .unwrap();

        assert_eq!(record.id, NodeId(7));
        assert!(!record.properties.contains_key("id"));
        assert_eq!(record.properties["name"], "Gdansk");
        assert_eq!(record.targets("PART_OF"), vec![NodeId(6)]);
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let err = decode_record(NodeId(1), "Region", "not json", "[]").unwrap_err();
        assert!(matches!(err, GraphError::Serialization(_)));
    }
}
