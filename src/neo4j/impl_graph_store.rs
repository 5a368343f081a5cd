//! `GraphStore` implementation for `Neo4jClient`.
//!
//! Every method simply delegates to the corresponding inherent method on `Neo4jClient`.

use async_trait::async_trait;

use super::client::Neo4jClient;
use super::error::StoreResult;
use super::models::*;
use super::traits::GraphStore;

#[async_trait]
impl GraphStore for Neo4jClient {
    async fn connect(&self) -> StoreResult<()> {
        self.connect().await
    }

    async fn disconnect(&self) -> StoreResult<()> {
        self.disconnect().await
    }

    async fn import_data(
        &self,
        nodes: &[GraphNode],
        relationships: &[GraphRelationship],
    ) -> StoreResult<()> {
        self.import_data(nodes, relationships).await
    }

    async fn clear_database(&self) -> StoreResult<()> {
        self.clear_database().await
    }

    async fn query(&self, query: &CypherQuery) -> StoreResult<QueryResult> {
        self.query(query).await
    }

    async fn find_node(&self, id: &str) -> StoreResult<Option<GraphNode>> {
        self.find_node(id).await
    }

    async fn find_related_nodes(
        &self,
        id: &str,
        relation_type: Option<RelationType>,
    ) -> StoreResult<Vec<GraphNode>> {
        self.find_related_nodes(id, relation_type).await
    }

    async fn get_stats(&self) -> StoreResult<GraphStats> {
        self.get_stats().await
    }
}
