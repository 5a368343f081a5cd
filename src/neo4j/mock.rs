//! In-memory mock implementation of GraphStore for testing.
//!
//! Stores nodes and relationships in `tokio::sync::RwLock<HashMap<K, V>>`
//! collections keyed by id, so importing the same batch twice upserts instead
//! of duplicating. Cypher text is not evaluated; queries are answered from
//! their structured [`NodeMatcher`].
//! Conditionally compiled with `#[cfg(test)]`.

use crate::neo4j::error::{StoreError, StoreResult};
use crate::neo4j::models::*;
use crate::neo4j::traits::GraphStore;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory mock implementation of GraphStore for testing.
pub struct MockGraphStore {
    pub nodes: RwLock<HashMap<String, GraphNode>>,
    pub relationships: RwLock<HashMap<String, GraphRelationship>>,
    connected: AtomicBool,
    pub connect_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
}

impl MockGraphStore {
    /// Create a new empty MockGraphStore.
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            relationships: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
        }
    }

    /// Create a store pre-seeded with nodes and relationships
    pub async fn with_data(nodes: Vec<GraphNode>, relationships: Vec<GraphRelationship>) -> Self {
        let store = Self::new();
        {
            let mut map = store.nodes.write().await;
            for node in nodes {
                map.insert(node.id.clone(), node);
            }
        }
        {
            let mut map = store.relationships.write().await;
            for rel in relationships {
                map.insert(rel.id.clone(), rel);
            }
        }
        store
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> StoreResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(StoreError::NotConnected)
        }
    }

    fn node_matches(node: &GraphNode, matcher: &NodeMatcher) -> bool {
        if !matcher.node_types.is_empty() && !matcher.node_types.contains(&node.node_type()) {
            return false;
        }

        if let Some(entity) = &matcher.for_entity {
            let entity_match = node
                .properties
                .entity()
                .map(|e| e.to_lowercase() == *entity)
                .unwrap_or(false);
            let path_match = node.file_path().to_lowercase().contains(entity.as_str());
            if !entity_match && !path_match {
                return false;
            }
        }

        let name = node.name.to_lowercase();
        let fields = match matcher.fields {
            MatchFields::Name => vec![name],
            MatchFields::NameOrPath => vec![name, node.file_path().to_lowercase()],
            MatchFields::All => vec![
                name,
                node.node_type().as_str().to_lowercase(),
                node.description().to_lowercase(),
                node.file_path().to_lowercase(),
            ],
        };
        matcher
            .terms
            .iter()
            .any(|t| fields.iter().any(|f| f.contains(t.as_str())))
    }
}

impl Default for MockGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MockGraphStore {
    async fn connect(&self) -> StoreResult<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> StoreResult<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn import_data(
        &self,
        nodes: &[GraphNode],
        relationships: &[GraphRelationship],
    ) -> StoreResult<()> {
        self.ensure_connected()?;
        let mut node_map = self.nodes.write().await;
        for node in nodes {
            node_map.insert(node.id.clone(), node.clone());
        }
        let mut rel_map = self.relationships.write().await;
        for rel in relationships {
            // Same as MATCH ... MERGE: edges with a missing endpoint are dropped
            if node_map.contains_key(&rel.source) && node_map.contains_key(&rel.target) {
                rel_map.insert(rel.id.clone(), rel.clone());
            }
        }
        Ok(())
    }

    async fn clear_database(&self) -> StoreResult<()> {
        self.ensure_connected()?;
        self.nodes.write().await.clear();
        self.relationships.write().await.clear();
        Ok(())
    }

    async fn query(&self, query: &CypherQuery) -> StoreResult<QueryResult> {
        self.ensure_connected()?;
        let matcher = query
            .matcher
            .as_ref()
            .ok_or_else(|| StoreError::Query("mock store needs a structured matcher".into()))?;

        let nodes = self.nodes.read().await;
        let mut matched: Vec<&GraphNode> = nodes
            .values()
            .filter(|n| Self::node_matches(n, matcher))
            .collect();
        // Same ordering as the Cypher ORDER BY
        let order_key = |node: &GraphNode| {
            let name = node.name.to_lowercase();
            let exact = matcher.exact.as_deref().is_some_and(|e| e == name);
            (!exact, !name.contains(matcher.primary.as_str()))
        };
        matched.sort_by(|a, b| {
            order_key(a)
                .cmp(&order_key(b))
                .then_with(|| a.name.cmp(&b.name))
        });
        matched.truncate(matcher.limit);

        let rels = self.relationships.read().await;
        let mut result = QueryResult::default();
        for node in matched {
            result.push_node(node.clone());
            let mut expanded = false;
            if matcher.expand_relationships {
                let mut outgoing: Vec<&GraphRelationship> =
                    rels.values().filter(|r| r.source == node.id).collect();
                outgoing.sort_by(|a, b| a.id.cmp(&b.id));
                for rel in outgoing {
                    if let Some(target) = nodes.get(&rel.target) {
                        result.push_node(target.clone());
                        result.push_relationship(rel.clone());
                        let mut record = BTreeMap::new();
                        record.insert("n".to_string(), RecordValue::Node(node.id.clone()));
                        record.insert("r".to_string(), RecordValue::Relationship(rel.id.clone()));
                        record.insert("m".to_string(), RecordValue::Node(target.id.clone()));
                        result.records.push(record);
                        expanded = true;
                    }
                }
            }
            if !expanded {
                let mut record = BTreeMap::new();
                record.insert("n".to_string(), RecordValue::Node(node.id.clone()));
                result.records.push(record);
            }
        }
        Ok(result)
    }

    async fn find_node(&self, id: &str) -> StoreResult<Option<GraphNode>> {
        self.ensure_connected()?;
        Ok(self.nodes.read().await.get(id).cloned())
    }

    async fn find_related_nodes(
        &self,
        id: &str,
        relation_type: Option<RelationType>,
    ) -> StoreResult<Vec<GraphNode>> {
        self.ensure_connected()?;
        let nodes = self.nodes.read().await;
        let rels = self.relationships.read().await;
        let mut related: Vec<GraphNode> = rels
            .values()
            .filter(|r| relation_type.map(|t| t == r.rel_type).unwrap_or(true))
            .filter_map(|r| {
                if r.source == id {
                    nodes.get(&r.target).cloned()
                } else if r.target == id {
                    nodes.get(&r.source).cloned()
                } else {
                    None
                }
            })
            .collect();
        related.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        related.dedup_by(|a, b| a.id == b.id);
        Ok(related)
    }

    async fn get_stats(&self) -> StoreResult<GraphStats> {
        self.ensure_connected()?;
        let mut stats = GraphStats::default();
        for node in self.nodes.read().await.values() {
            stats.total_nodes += 1;
            *stats
                .nodes_by_type
                .entry(node.node_type().as_str().to_string())
                .or_default() += 1;
        }
        for rel in self.relationships.read().await.values() {
            stats.total_relationships += 1;
            *stats
                .relationships_by_type
                .entry(rel.rel_type.as_str().to_string())
                .or_default() += 1;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[tokio::test]
    async fn test_import_twice_is_idempotent() {
        let store = MockGraphStore::new();
        store.connect().await.unwrap();
        let (nodes, rels) = user_schema_graph();

        store.import_data(&nodes, &rels).await.unwrap();
        store.import_data(&nodes, &rels).await.unwrap();

        let stats = store.get_stats().await.unwrap();
        assert_eq!(stats.total_nodes, nodes.len());
        assert_eq!(stats.total_relationships, rels.len());
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let store = MockGraphStore::new();
        let err = store.find_node("anything").await.unwrap_err();
        assert!(matches!(err, StoreError::NotConnected));
    }

    #[tokio::test]
    async fn test_find_related_nodes_filters_by_type() {
        let (nodes, rels) = user_schema_graph();
        let store = MockGraphStore::with_data(nodes.clone(), rels).await;
        store.connect().await.unwrap();

        let entity = nodes
            .iter()
            .find(|n| n.node_type() == NodeType::SchemaEntity)
            .unwrap();
        let fields = store
            .find_related_nodes(&entity.id, Some(RelationType::HasField))
            .await
            .unwrap();
        assert!(!fields.is_empty());
        assert!(fields.iter().all(|n| n.node_type() == NodeType::SchemaField));

        let none = store
            .find_related_nodes(&entity.id, Some(RelationType::Calls))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_query_without_matcher_is_rejected() {
        let store = MockGraphStore::new();
        store.connect().await.unwrap();
        let err = store
            .query(&CypherQuery::new("MATCH (n) RETURN n"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[tokio::test]
    async fn test_clear_database() {
        let (nodes, rels) = user_schema_graph();
        let store = MockGraphStore::with_data(nodes, rels).await;
        store.connect().await.unwrap();
        store.clear_database().await.unwrap();
        assert_eq!(store.get_stats().await.unwrap().total_nodes, 0);
    }
}
