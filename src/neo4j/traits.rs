//! GraphStore trait definition
//!
//! Defines the abstract interface to the graph database. The core only ever
//! talks to the store through this trait, which keeps the Neo4j client
//! swappable and lets tests run against an in-memory mock.

use crate::neo4j::error::StoreResult;
use crate::neo4j::models::*;
use async_trait::async_trait;

/// Abstract interface for all graph database operations.
#[async_trait]
pub trait GraphStore: Send + Sync {
    // ========================================================================
    // Connection lifecycle
    // ========================================================================

    /// Open the connection. Calling it on an open store is a no-op.
    async fn connect(&self) -> StoreResult<()>;

    /// Release the connection. Calling it on a closed store is a no-op.
    async fn disconnect(&self) -> StoreResult<()>;

    // ========================================================================
    // Writes
    // ========================================================================

    /// Upsert a batch of nodes and relationships by id
    async fn import_data(
        &self,
        nodes: &[GraphNode],
        relationships: &[GraphRelationship],
    ) -> StoreResult<()>;

    /// Remove every node and relationship
    async fn clear_database(&self) -> StoreResult<()>;

    // ========================================================================
    // Reads
    // ========================================================================

    /// Run a read query; records mirror its declared return columns
    async fn query(&self, query: &CypherQuery) -> StoreResult<QueryResult>;

    /// Get a node by id
    async fn find_node(&self, id: &str) -> StoreResult<Option<GraphNode>>;

    /// Nodes adjacent to `id` in either direction, optionally restricted to one relationship type
    async fn find_related_nodes(
        &self,
        id: &str,
        relation_type: Option<RelationType>,
    ) -> StoreResult<Vec<GraphNode>>;

    /// Node and relationship counts
    async fn get_stats(&self) -> StoreResult<GraphStats>;
}
