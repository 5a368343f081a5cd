//! Query resolution against the graph store
//!
//! A [`QueryResolver`] turns a [`QueryRequest`] into one read query, runs it
//! inside a connect/query/disconnect bracket under a timeout, and ranks the
//! result into a [`QueryResponse`].

pub mod builder;
pub mod ranking;
pub mod response;

pub use response::{
    EntitySummary, PatternSummary, QueryEcho, QueryResponse, QueryResults, RelatedFiles,
    RelationshipSummary, ResponseMetadata,
};

use crate::neo4j::error::StoreError;
use crate::neo4j::models::{GraphNode, NodeType, QueryResult, RecordValue};
use crate::neo4j::traits::GraphStore;
use ranking::RankTarget;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    FindEntity,
    FindSymbol,
    FindPattern,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::FindEntity => "find_entity",
            QueryType::FindSymbol => "find_symbol",
            QueryType::FindPattern => "find_pattern",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query_type: QueryType,
    pub target: String,
    #[serde(default)]
    pub for_entity: Option<String>,
    #[serde(default)]
    pub include_related: bool,
    #[serde(default)]
    pub debug: bool,
}

impl QueryRequest {
    pub fn new(query_type: QueryType, target: impl Into<String>) -> Self {
        Self {
            query_type,
            target: target.into(),
            for_entity: None,
            include_related: false,
            debug: false,
        }
    }

    pub fn for_entity(mut self, entity: impl Into<String>) -> Self {
        self.for_entity = Some(entity.into());
        self
    }

    pub fn include_related(mut self, include: bool) -> Self {
        self.include_related = include;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("query timed out")]
    Timeout,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Resolver settings (the `query` section of config.yaml)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub timeout_ms: u64,
    pub debug_timeout_ms: u64,
    pub entity_limit: usize,
    pub debug_entity_limit: usize,
    pub symbol_limit: usize,
    pub pattern_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            debug_timeout_ms: 10_000,
            entity_limit: 10,
            debug_entity_limit: 20,
            symbol_limit: 20,
            pattern_limit: 50,
        }
    }
}

impl QueryConfig {
    pub fn timeout(&self, debug: bool) -> Duration {
        Duration::from_millis(if debug {
            self.debug_timeout_ms
        } else {
            self.timeout_ms
        })
    }

    pub fn limit(&self, request: &QueryRequest) -> usize {
        match (request.query_type, request.debug) {
            (QueryType::FindEntity, false) => self.entity_limit,
            (QueryType::FindEntity, true) => self.debug_entity_limit,
            (QueryType::FindSymbol, _) => self.symbol_limit,
            (QueryType::FindPattern, _) => self.pattern_limit,
        }
    }
}

pub struct QueryResolver {
    store: Arc<dyn GraphStore>,
    config: QueryConfig,
}

impl QueryResolver {
    pub fn new(store: Arc<dyn GraphStore>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Resolve a request into a structured response. Never fails: errors
    /// become `success: false` responses that echo the request.
    pub async fn resolve(&self, request: &QueryRequest) -> QueryResponse {
        let start = Instant::now();
        let echo = QueryEcho::from(request);

        match self.execute(request).await {
            Ok(result) => {
                let elapsed = start.elapsed().as_millis() as u64;
                let (results, metadata) = summarize(request, result, elapsed);
                tracing::debug!(
                    "{} {:?}: {} found in {}ms",
                    request.query_type,
                    request.target,
                    metadata.total_found,
                    elapsed
                );
                QueryResponse::success(echo, results, metadata)
            }
            Err(e) => {
                tracing::warn!("{} {:?} failed: {}", request.query_type, request.target, e);
                QueryResponse::failure(echo, e.to_string())
            }
        }
    }

    /// Run the request's query under the configured timeout
    pub async fn execute(&self, request: &QueryRequest) -> Result<QueryResult, QueryError> {
        if request.target.trim().is_empty() {
            return Err(QueryError::InvalidRequest("target must not be empty".into()));
        }

        let query = builder::build_query(request, self.config.limit(request));
        let timeout = self.config.timeout(request.debug);
        let deadline = tokio::time::Instant::now() + timeout;

        tokio::time::timeout_at(deadline, self.store.connect())
            .await
            .map_err(|_| QueryError::Timeout)??;

        // Only the query races the deadline; the connection is released whatever it yields
        let result = tokio::time::timeout_at(deadline, self.store.query(&query)).await;
        if let Err(e) = self.store.disconnect().await {
            tracing::warn!("Failed to disconnect from graph store: {}", e);
        }

        result
            .map_err(|_| QueryError::Timeout)?
            .map_err(QueryError::from)
    }
}

/// Ids bound to a record column, in record order without repeats
fn column_ids(result: &QueryResult, column: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    result
        .records
        .iter()
        .filter_map(|record| match record.get(column) {
            Some(RecordValue::Node(id)) => Some(id.clone()),
            _ => None,
        })
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Rank, partition and bucket a raw query result
fn summarize(
    request: &QueryRequest,
    result: QueryResult,
    execution_time_ms: u64,
) -> (QueryResults, ResponseMetadata) {
    let target = request.target.trim();
    let by_id: HashMap<&str, &GraphNode> =
        result.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut matched_ids = column_ids(&result, "n");
    if matched_ids.is_empty() && result.records.is_empty() {
        matched_ids = result.nodes.iter().map(|n| n.id.clone()).collect();
    }
    let matched: Vec<GraphNode> = matched_ids
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).map(|n| (*n).clone()))
        .collect();
    let matched_set: HashSet<&str> = matched_ids.iter().map(|s| s.as_str()).collect();
    let neighbours: Vec<GraphNode> = column_ids(&result, "m")
        .iter()
        .filter(|id| !matched_set.contains(id.as_str()))
        .filter_map(|id| by_id.get(id.as_str()).map(|n| (*n).clone()))
        .collect();

    let patterns = if request.query_type == QueryType::FindPattern {
        ranking::group_patterns(&matched)
    } else {
        Vec::new()
    };

    let rank_target = RankTarget::new(target);
    let ranked = ranking::rank(ranking::dedupe_by_name(matched), &rank_target);
    let (primary, mut related) = ranking::partition(ranked, &rank_target);
    let known: HashSet<String> = related
        .iter()
        .chain(primary.iter())
        .map(|n| n.name.clone())
        .collect();
    related.extend(
        ranking::dedupe_by_name(neighbours)
            .into_iter()
            .filter(|n| !known.contains(&n.name)),
    );

    let names: HashMap<&str, &str> = result
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.name.as_str()))
        .collect();
    let relationships: Vec<RelationshipSummary> = result
        .relationships
        .iter()
        .map(|r| RelationshipSummary::new(r, &names))
        .collect();

    let related_files = ranking::bucket_files(
        primary
            .iter()
            .chain(related.iter())
            .filter(|n| n.node_type() != NodeType::Package)
            .map(|n| n.file_path()),
    );

    let confidence = ranking::confidence(primary.as_ref(), &rank_target, related.len());
    let total_found = related.len() + usize::from(primary.is_some());
    let suggestions = suggestions_for(target, primary.as_ref(), &related, confidence);

    let results = QueryResults {
        primary_target: primary.as_ref().map(EntitySummary::from),
        related_entities: related.iter().map(EntitySummary::from).collect(),
        relationships,
        related_files,
        suggestions,
        patterns,
    };
    let metadata = ResponseMetadata {
        execution_time_ms,
        confidence,
        total_found,
    };
    (results, metadata)
}

const MAX_NAME_SUGGESTIONS: usize = 3;

fn suggestions_for(
    target: &str,
    primary: Option<&GraphNode>,
    related: &[GraphNode],
    confidence: f64,
) -> Option<Vec<String>> {
    match primary {
        None if related.is_empty() => Some(vec![
            format!("No nodes matched \"{}\"", target),
            "Run `devgraph sync` to refresh the graph".to_string(),
            "Try a shorter or more general term".to_string(),
            "Use --find-pattern to search file paths as well as names".to_string(),
        ]),
        Some(node) if confidence < 1.0 => {
            let mut out = vec![format!(
                "No exact match for \"{}\"; closest is \"{}\"",
                target, node.name
            )];
            out.extend(
                related
                    .iter()
                    .take(MAX_NAME_SUGGESTIONS)
                    .map(|n| format!("Did you mean \"{}\"?", n.name)),
            );
            Some(out)
        }
        None => Some(
            related
                .iter()
                .take(MAX_NAME_SUGGESTIONS)
                .map(|n| format!("Did you mean \"{}\"?", n.name))
                .collect(),
        ),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neo4j::error::StoreResult;
    use crate::neo4j::mock::MockGraphStore;
    use crate::neo4j::models::*;
    use crate::test_helpers::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store whose queries never complete
    #[derive(Default)]
    struct PendingStore {
        connects: AtomicUsize,
        disconnects: AtomicUsize,
    }

    #[async_trait]
    impl GraphStore for PendingStore {
        async fn connect(&self) -> StoreResult<()> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn disconnect(&self) -> StoreResult<()> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn import_data(&self, _: &[GraphNode], _: &[GraphRelationship]) -> StoreResult<()> {
            Ok(())
        }
        async fn clear_database(&self) -> StoreResult<()> {
            Ok(())
        }
        async fn query(&self, _: &CypherQuery) -> StoreResult<QueryResult> {
            std::future::pending().await
        }
        async fn find_node(&self, _: &str) -> StoreResult<Option<GraphNode>> {
            Ok(None)
        }
        async fn find_related_nodes(
            &self,
            _: &str,
            _: Option<RelationType>,
        ) -> StoreResult<Vec<GraphNode>> {
            Ok(Vec::new())
        }
        async fn get_stats(&self) -> StoreResult<GraphStats> {
            Ok(GraphStats::default())
        }
    }

    async fn seeded_resolver() -> (QueryResolver, Arc<MockGraphStore>) {
        let (nodes, rels) = user_schema_graph();
        let store = Arc::new(MockGraphStore::with_data(nodes, rels).await);
        (
            QueryResolver::new(store.clone(), QueryConfig::default()),
            store,
        )
    }

    #[tokio::test]
    async fn test_timeout_yields_structured_failure() {
        let config = QueryConfig {
            timeout_ms: 50,
            ..Default::default()
        };
        let resolver = QueryResolver::new(Arc::new(PendingStore::default()), config);
        let start = Instant::now();
        let response = resolver
            .resolve(&QueryRequest::new(QueryType::FindEntity, "User"))
            .await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("query timed out"));
        assert_eq!(response.query.target, "User");
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_timeout_releases_connection() {
        let config = QueryConfig {
            timeout_ms: 30,
            ..Default::default()
        };
        let store = Arc::new(PendingStore::default());
        let resolver = QueryResolver::new(store.clone(), config);

        for _ in 0..2 {
            let response = resolver
                .resolve(&QueryRequest::new(QueryType::FindEntity, "User"))
                .await;
            assert_eq!(response.error.as_deref(), Some("query timed out"));
        }
        assert_eq!(store.connects.load(Ordering::SeqCst), 2);
        assert_eq!(store.disconnects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_multi_word_target_survives_limit() {
        let mut nodes: Vec<GraphNode> = (0..12)
            .map(|i| {
                entity_node(
                    &format!("Aprofile{:02}", i),
                    &format!("packages/db/src/schema/aprofile{:02}.ts", i),
                )
            })
            .collect();
        nodes.push(entity_node("UserAccount", "packages/db/src/schema/account.ts"));
        let store = Arc::new(MockGraphStore::with_data(nodes, Vec::new()).await);
        let resolver = QueryResolver::new(store, QueryConfig::default());

        let response = resolver
            .resolve(&QueryRequest::new(QueryType::FindEntity, "user profile"))
            .await;
        assert!(response.success);
        let results = response.results.unwrap();
        assert_eq!(results.primary_target.unwrap().name, "UserAccount");
        assert_eq!(results.related_entities.len(), 9);
        assert_eq!(response.metadata.unwrap().confidence, 0.8);
    }

    #[tokio::test]
    async fn test_empty_target_is_invalid() {
        let (resolver, _) = seeded_resolver().await;
        let err = resolver
            .execute(&QueryRequest::new(QueryType::FindEntity, "  "))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_find_entity_exact_match() {
        let (resolver, store) = seeded_resolver().await;
        let response = resolver
            .resolve(&QueryRequest::new(QueryType::FindEntity, "User"))
            .await;
        assert!(response.success);
        let results = response.results.unwrap();
        let primary = results.primary_target.unwrap();
        assert_eq!(primary.name, "User");
        assert_eq!(primary.node_type, NodeType::SchemaEntity);
        assert_eq!(response.metadata.unwrap().confidence, 1.0);
        assert!(results.suggestions.is_none());
        assert_eq!(
            results.related_files.schemas,
            vec!["packages/db/src/schema/user.ts"]
        );
        assert_eq!(
            results.related_files.migrations,
            vec!["packages/db/src/schema/migrations"]
        );

        // connection is released after every query
        assert_eq!(store.connect_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.disconnect_calls.load(Ordering::SeqCst), 1);
        assert!(!store.is_connected());
    }

    #[tokio::test]
    async fn test_nothing_found_has_suggestions() {
        let (resolver, _) = seeded_resolver().await;
        let response = resolver
            .resolve(&QueryRequest::new(QueryType::FindEntity, "Spaceship"))
            .await;
        assert!(response.success);
        let metadata = response.metadata.unwrap();
        assert_eq!(metadata.confidence, 0.0);
        assert_eq!(metadata.total_found, 0);
        assert!(response.results.unwrap().suggestions.is_some());
    }

    #[tokio::test]
    async fn test_find_symbol_for_entity() {
        let (resolver, _) = seeded_resolver().await;
        let response = resolver
            .resolve(&QueryRequest::new(QueryType::FindSymbol, "email").for_entity("User"))
            .await;
        let results = response.results.unwrap();
        let primary = results.primary_target.unwrap();
        assert_eq!(primary.name, "email");
        assert_eq!(primary.node_type, NodeType::SchemaField);
    }

    #[tokio::test]
    async fn test_debug_returns_relationships() {
        let (resolver, _) = seeded_resolver().await;
        let response = resolver
            .resolve(&QueryRequest::new(QueryType::FindEntity, "User").debug(true))
            .await;
        let results = response.results.unwrap();
        assert!(!results.relationships.is_empty());
        assert!(results
            .relationships
            .iter()
            .any(|r| r.rel_type == RelationType::HasField
                && r.source_name.as_deref() == Some("User")));
    }

    #[tokio::test]
    async fn test_find_pattern_groups_by_type() {
        let (resolver, _) = seeded_resolver().await;
        let response = resolver
            .resolve(&QueryRequest::new(QueryType::FindPattern, "schema/user"))
            .await;
        let results = response.results.unwrap();
        assert!(results
            .patterns
            .iter()
            .any(|p| p.node_type == NodeType::SchemaField && p.count >= 2));
    }

    #[tokio::test]
    async fn test_store_errors_keep_their_message() {
        let store = MockGraphStore::new();
        let err = store.import_data(&[], &[]).await.unwrap_err();
        let query_err = QueryError::from(err);
        assert_eq!(query_err.to_string(), "graph store is not connected");
    }
}
