//! Write operations against Neo4j.
//!
//! Nodes are identified by (label, id). A write replaces each node's
//! properties and outgoing relationships wholesale, inside one transaction.

use gtd_core::NodeId;
use neo4rs::query;

use crate::client::{GraphClient, GraphError};
use crate::store::NodeRecord;

impl GraphClient {
    // ── Id Allocation ────────────────────────────────────────────

    /// Reserve `count` ids from the shared `IdSequence` node.
    pub async fn allocate_node_ids(&self, count: usize) -> Result<Vec<NodeId>, GraphError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let q = query(
            "MERGE (s:IdSequence {name: 'node'})
             ON CREATE SET s.value = 0
             SET s.value = s.value + $count
             RETURN s.value AS last",
        )
        .param("count", count as i64);

        let last: i64 = match self.query_one(q).await? {
            Some(row) => row
                .get("last")
                .map_err(|e| GraphError::Serialization(format!("Bad id sequence: {e}")))?,
            None => return Err(GraphError::Connection("Id sequence returned no row".into())),
        };

        let first = last - count as i64 + 1;
        Ok((first..=last).map(NodeId).collect())
    }

    // ── Batch Writes ─────────────────────────────────────────────

    /// Upsert node records and their outgoing relationships in a single transaction.
    pub async fn write_records(&self, records: &[NodeRecord]) -> Result<(), GraphError> {
        for record in records {
            self.check_label(record).await?;
        }

        let mut txn = self.start_txn().await?;

        for record in records {
            let label = &record.label;
            let props_json = serde_json::to_string(&record.properties)?;

            let cypher = format!(
                "MERGE (n:{label} {{id: $id}})
                 SET n = apoc.convert.fromJsonMap($props)
                 SET n.id = $id
                 WITH n
                 OPTIONAL MATCH (n)-[r]->()
                 DELETE r"
            );

            let q = query(&cypher)
                .param("id", record.id.0)
                .param("props", props_json);

            txn.run(q).await?;
        }

        // Relationships go in after every node of the batch exists.
        for record in records {
            for rel in &record.relations {
                let cypher = format!(
                    "MATCH (a:{from} {{id: $from_id}})
                     MATCH (b:{to} {{id: $to_id}})
                     CREATE (a)-[:{rel_type} {{position: $position}}]->(b)",
                    from = record.label,
                    to = rel.target_label,
                    rel_type = rel.rel_type,
                );

                let q = query(&cypher)
                    .param("from_id", record.id.0)
                    .param("to_id", rel.target.0)
                    .param("position", rel.position);

                txn.run(q).await?;
            }
        }

        txn.commit().await?;
        tracing::debug!(nodes = records.len(), "Node batch written");
        Ok(())
    }

    /// Fail when `record.id` already belongs to a node with another label.
    async fn check_label(&self, record: &NodeRecord) -> Result<(), GraphError> {
        let q = query(
            "MATCH (m {id: $id})
             WHERE NOT $label IN labels(m)
             RETURN head(labels(m)) AS found
             LIMIT 1",
        )
        .param("id", record.id.0)
        .param("label", record.label.as_str());

        let Some(row) = self.query_one(q).await? else {
            return Ok(());
        };
        Err(GraphError::LabelMismatch {
            id: record.id.0,
            expected: record.label.clone(),
            found: row.get::<String>("found").unwrap_or_default(),
        })
    }

    /// Delete a node by label and id, detaching all relationships.
    pub async fn delete_node(&self, label: &str, id: NodeId) -> Result<bool, GraphError> {
        let cypher = format!(
            "MATCH (n:{label} {{id: $id}})
             DETACH DELETE n
             RETURN count(*) AS cnt"
        );

        let q = query(&cypher).param("id", id.0);

        match self.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0) > 0),
            None => Ok(false),
        }
    }
}
