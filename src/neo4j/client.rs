//! Neo4j client for interacting with the knowledge graph
//!
//! Every node carries the common `CodeNode` label plus its type label.
//! Typed property sets are stored as JSON strings next to a handful of
//! flattened, searchable fields (`name`, `type`, `file_path`, `package`,
//! `description`, `entity`).

use super::error::{StoreError, StoreResult};
use super::models::*;
use neo4rs::{query, Graph, Query};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Label shared by every node written by the importer
pub const NODE_LABEL: &str = "CodeNode";

/// Client for Neo4j operations
pub struct Neo4jClient {
    uri: String,
    user: String,
    password: String,
    graph: RwLock<Option<Arc<Graph>>>,
    schema_ready: AtomicBool,
}

impl Neo4jClient {
    /// Create a client. No connection is opened until [`connect`](Self::connect).
    pub fn new(uri: &str, user: &str, password: &str) -> Self {
        Self {
            uri: uri.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            graph: RwLock::new(None),
            schema_ready: AtomicBool::new(false),
        }
    }

    /// Open the connection pool and make sure the schema exists
    pub async fn connect(&self) -> StoreResult<()> {
        let mut guard = self.graph.write().await;
        if guard.is_some() {
            return Ok(());
        }

        let graph = Graph::new(self.uri.as_str(), self.user.as_str(), self.password.as_str())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let graph = Arc::new(graph);

        if !self.schema_ready.swap(true, Ordering::SeqCst) {
            Self::init_schema(&graph).await;
        }

        tracing::debug!("Connected to Neo4j at {}", self.uri);
        *guard = Some(graph);
        Ok(())
    }

    /// Drop the connection pool
    pub async fn disconnect(&self) -> StoreResult<()> {
        if self.graph.write().await.take().is_some() {
            tracing::debug!("Disconnected from Neo4j");
        }
        Ok(())
    }

    async fn graph(&self) -> StoreResult<Arc<Graph>> {
        self.graph
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(StoreError::NotConnected)
    }

    /// Initialize the graph schema with constraints and indexes
    async fn init_schema(graph: &Graph) {
        let statements = [
            "CREATE CONSTRAINT code_node_id IF NOT EXISTS FOR (n:CodeNode) REQUIRE n.id IS UNIQUE",
            "CREATE INDEX code_node_name IF NOT EXISTS FOR (n:CodeNode) ON (n.name)",
            "CREATE INDEX code_node_type IF NOT EXISTS FOR (n:CodeNode) ON (n.type)",
            "CREATE INDEX code_node_file IF NOT EXISTS FOR (n:CodeNode) ON (n.file_path)",
        ];

        for statement in statements {
            if let Err(e) = graph.run(query(statement)).await {
                tracing::warn!("Schema statement may already exist: {}", e);
            }
        }
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Upsert nodes then relationships inside one transaction
    pub async fn import_data(
        &self,
        nodes: &[GraphNode],
        relationships: &[GraphRelationship],
    ) -> StoreResult<()> {
        if nodes.is_empty() && relationships.is_empty() {
            return Ok(());
        }
        let graph = self.graph().await?;

        let mut queries = Vec::with_capacity(nodes.len() + relationships.len());
        for node in nodes {
            queries.push(Self::node_upsert_query(node)?);
        }
        for rel in relationships {
            queries.push(Self::relationship_upsert_query(rel)?);
        }

        let mut txn = graph.start_txn().await?;
        txn.run_queries(queries).await?;
        txn.commit().await?;

        tracing::info!(
            "Imported {} nodes and {} relationships",
            nodes.len(),
            relationships.len()
        );
        Ok(())
    }

    fn node_upsert_query(node: &GraphNode) -> StoreResult<Query> {
        // Labels come from the NodeType enum, never from user input
        let cypher = format!(
            r#"
            MERGE (n:{label} {{id: $id}})
            SET n:{type_label},
                n.name = $name,
                n.type = $type,
                n.file_path = $file_path,
                n.package = $package,
                n.description = $description,
                n.entity = $entity,
                n.confidence = $confidence,
                n.properties = $properties,
                n.metadata = $metadata,
                n.extra = $extra
            "#,
            label = NODE_LABEL,
            type_label = node.node_type().as_str(),
        );

        Ok(query(&cypher)
            .param("id", node.id.clone())
            .param("name", node.name.clone())
            .param("type", node.node_type().as_str())
            .param("file_path", node.file_path())
            .param("package", node.package().unwrap_or_default())
            .param("description", node.description())
            .param("entity", node.properties.entity().unwrap_or_default())
            .param("confidence", node.metadata.confidence)
            .param("properties", to_json(&node.properties, "node properties")?)
            .param("metadata", to_json(&node.metadata, "node metadata")?)
            .param("extra", to_json(&node.extra, "node extra")?))
    }

    fn relationship_upsert_query(rel: &GraphRelationship) -> StoreResult<Query> {
        let cypher = format!(
            r#"
            MATCH (a:{label} {{id: $source}}), (b:{label} {{id: $target}})
            MERGE (a)-[r:{rel_type} {{id: $id}}]->(b)
            SET r.source = $source,
                r.target = $target,
                r.weight = $weight,
                r.confidence = $confidence,
                r.properties = $properties,
                r.extra = $extra
            "#,
            label = NODE_LABEL,
            rel_type = rel.rel_type.as_str(),
        );

        Ok(query(&cypher)
            .param("id", rel.id.clone())
            .param("source", rel.source.clone())
            .param("target", rel.target.clone())
            .param("weight", rel.metadata.weight)
            .param("confidence", rel.metadata.confidence)
            .param("properties", to_json(&rel.properties, "edge properties")?)
            .param("extra", to_json(&rel.extra, "edge extra")?))
    }

    /// Delete every CodeNode and its relationships
    pub async fn clear_database(&self) -> StoreResult<()> {
        let graph = self.graph().await?;
        graph
            .run(query(&format!("MATCH (n:{}) DETACH DELETE n", NODE_LABEL)))
            .await?;
        tracing::info!("Cleared knowledge graph");
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Execute a query and decode every declared column of every row
    pub async fn query(&self, cypher: &CypherQuery) -> StoreResult<QueryResult> {
        let graph = self.graph().await?;

        let mut q = query(&cypher.text);
        for (key, value) in &cypher.params {
            q = match value {
                ParamValue::String(v) => q.param(key, v.clone()),
                ParamValue::Int(v) => q.param(key, *v),
                ParamValue::Float(v) => q.param(key, *v),
                ParamValue::Bool(v) => q.param(key, *v),
                ParamValue::StringList(v) => q.param(key, v.clone()),
            };
        }

        let mut stream = graph.execute(q).await?;
        let mut result = QueryResult::default();

        while let Some(row) = stream.next().await? {
            let mut record = BTreeMap::new();
            for (alias, kind) in &cypher.columns {
                let value = match kind {
                    ColumnKind::Node => match row.get::<neo4rs::Node>(alias) {
                        Ok(node) => {
                            let node = Self::node_to_graph_node(&node)?;
                            let id = node.id.clone();
                            result.push_node(node);
                            RecordValue::Node(id)
                        }
                        // OPTIONAL MATCH yields null columns
                        Err(_) => RecordValue::Null,
                    },
                    ColumnKind::Relationship => match row.get::<neo4rs::Relation>(alias) {
                        Ok(rel) => {
                            let rel = Self::relation_to_graph_relationship(&rel)?;
                            let id = rel.id.clone();
                            result.push_relationship(rel);
                            RecordValue::Relationship(id)
                        }
                        Err(_) => RecordValue::Null,
                    },
                    ColumnKind::Scalar => Self::row_scalar(&row, alias),
                };
                record.insert(alias.clone(), value);
            }
            result.records.push(record);
        }

        Ok(result)
    }

    fn row_scalar(row: &neo4rs::Row, alias: &str) -> RecordValue {
        if let Ok(v) = row.get::<i64>(alias) {
            return RecordValue::Scalar(serde_json::Value::from(v));
        }
        if let Ok(v) = row.get::<f64>(alias) {
            return RecordValue::Scalar(serde_json::Value::from(v));
        }
        if let Ok(v) = row.get::<bool>(alias) {
            return RecordValue::Scalar(serde_json::Value::from(v));
        }
        if let Ok(v) = row.get::<String>(alias) {
            return RecordValue::Scalar(serde_json::Value::from(v));
        }
        if let Ok(v) = row.get::<Vec<String>>(alias) {
            return RecordValue::Scalar(serde_json::Value::from(v));
        }
        RecordValue::Null
    }

    /// Get a node by id
    pub async fn find_node(&self, id: &str) -> StoreResult<Option<GraphNode>> {
        let q = CypherQuery::new(format!("MATCH (n:{} {{id: $id}}) RETURN n", NODE_LABEL))
            .param("id", id)
            .returns("n", ColumnKind::Node);
        Ok(self.query(&q).await?.nodes.into_iter().next())
    }

    /// Nodes adjacent to `id`, optionally restricted to one relationship type
    pub async fn find_related_nodes(
        &self,
        id: &str,
        relation_type: Option<RelationType>,
    ) -> StoreResult<Vec<GraphNode>> {
        let pattern = match relation_type {
            Some(t) => format!("[:{}]", t.as_str()),
            None => "[]".to_string(),
        };
        let q = CypherQuery::new(format!(
            "MATCH (n:{label} {{id: $id}})-{pattern}-(m:{label}) RETURN DISTINCT m ORDER BY m.name",
            label = NODE_LABEL,
            pattern = pattern
        ))
        .param("id", id)
        .returns("m", ColumnKind::Node);
        Ok(self.query(&q).await?.nodes)
    }

    /// Count nodes and relationships by type
    pub async fn get_stats(&self) -> StoreResult<GraphStats> {
        let mut stats = GraphStats::default();

        let nodes = CypherQuery::new(format!(
            "MATCH (n:{}) RETURN n.type AS type, count(n) AS count",
            NODE_LABEL
        ))
        .returns("type", ColumnKind::Scalar)
        .returns("count", ColumnKind::Scalar);
        for (label, count) in Self::type_counts(&self.query(&nodes).await?) {
            stats.total_nodes += count;
            stats.nodes_by_type.insert(label, count);
        }

        let rels = CypherQuery::new(format!(
            "MATCH (:{label})-[r]->(:{label}) RETURN type(r) AS type, count(r) AS count",
            label = NODE_LABEL
        ))
        .returns("type", ColumnKind::Scalar)
        .returns("count", ColumnKind::Scalar);
        for (label, count) in Self::type_counts(&self.query(&rels).await?) {
            stats.total_relationships += count;
            stats.relationships_by_type.insert(label, count);
        }

        Ok(stats)
    }

    fn type_counts(result: &QueryResult) -> Vec<(String, usize)> {
        result
            .records
            .iter()
            .filter_map(|record| {
                let label = match record.get("type") {
                    Some(RecordValue::Scalar(serde_json::Value::String(s))) => s.clone(),
                    _ => return None,
                };
                let count = match record.get("count") {
                    Some(RecordValue::Scalar(v)) => v.as_u64()? as usize,
                    _ => return None,
                };
                Some((label, count))
            })
            .collect()
    }

    // ========================================================================
    // Decoding
    // ========================================================================

    fn node_to_graph_node(node: &neo4rs::Node) -> StoreResult<GraphNode> {
        let id: String = node.get("id").map_err(|e| StoreError::decode("node id", e))?;
        let properties: NodeProperties = from_json_prop(
            node.get::<String>("properties"),
            "node properties",
        )?;
        let metadata: NodeMetadata = from_json_prop(node.get::<String>("metadata"), "node metadata")?;
        let extra: ExtraProperties = node
            .get::<String>("extra")
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        Ok(GraphNode {
            name: node.get("name").unwrap_or_else(|_| id.clone()),
            id,
            properties,
            extra,
            metadata,
        })
    }

    fn relation_to_graph_relationship(rel: &neo4rs::Relation) -> StoreResult<GraphRelationship> {
        let rel_type: RelationType = rel
            .typ()
            .parse()
            .map_err(|e: String| StoreError::decode("relationship type", e))?;
        let properties: EdgeProperties =
            from_json_prop(rel.get::<String>("properties"), "edge properties")?;
        let extra: ExtraProperties = rel
            .get::<String>("extra")
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        Ok(GraphRelationship {
            id: rel
                .get("id")
                .map_err(|e| StoreError::decode("relationship id", e))?,
            rel_type,
            source: rel
                .get("source")
                .map_err(|e| StoreError::decode("relationship source", e))?,
            target: rel
                .get("target")
                .map_err(|e| StoreError::decode("relationship target", e))?,
            properties,
            extra,
            metadata: RelationshipMetadata {
                weight: rel.get("weight").unwrap_or(1.0),
                confidence: rel.get("confidence").unwrap_or(1.0),
            },
        })
    }
}

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|e| StoreError::decode(what, e))
}

fn from_json_prop<T, E>(raw: Result<String, E>, what: &str) -> StoreResult<T>
where
    T: serde::de::DeserializeOwned,
    E: std::fmt::Display,
{
    let raw = raw.map_err(|e| StoreError::decode(what, e))?;
    serde_json::from_str(&raw).map_err(|e| StoreError::decode(what, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_node() -> GraphNode {
        GraphNode::new(
            "schema:user:abc",
            "User",
            NodeProperties::SchemaEntity {
                file_path: "packages/db/src/schema/user.ts".into(),
                style: "zod".into(),
                field_count: 3,
                line: 1,
            },
            NodeMetadata::new(
                Some("packages/db/src/schema/user.ts".into()),
                Some("@repo/db".into()),
                0.9,
            ),
        )
    }

    #[tokio::test]
    async fn test_new_client_is_not_connected() {
        let client = Neo4jClient::new("bolt://localhost:7687", "neo4j", "secret");
        let err = client.query(&CypherQuery::new("RETURN 1")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotConnected));
        // Disconnecting a closed client is a no-op
        assert!(client.disconnect().await.is_ok());
    }

    #[test]
    fn test_node_upsert_query_uses_type_label() {
        // Query is opaque, but building it must not fail for any property set
        assert!(Neo4jClient::node_upsert_query(&sample_node()).is_ok());
    }

    #[test]
    fn test_relationship_upsert_query_builds() {
        let rel = GraphRelationship::new(
            "rel:has_field:1",
            RelationType::HasField,
            "schema:user:abc",
            "schema:email:def",
            EdgeProperties::HasField {
                field_type: "string".into(),
                nullable: false,
                validation: vec!["email".into()],
            },
        );
        assert!(Neo4jClient::relationship_upsert_query(&rel).is_ok());
    }

    #[test]
    fn test_from_json_prop_reports_decode_errors() {
        let err = from_json_prop::<NodeProperties, String>(Ok("{not json".into()), "node properties")
            .unwrap_err();
        assert!(err.to_string().contains("node properties"));
    }
}
