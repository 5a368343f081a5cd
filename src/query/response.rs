//! JSON response shapes of the query resolver

use super::{QueryRequest, QueryType};
use crate::neo4j::models::{GraphNode, GraphRelationship, NodeProperties, NodeType, RelationType};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;

/// The request, echoed back in every response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryEcho {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    pub target: String,
    pub for_entity: Option<String>,
    pub include_related: bool,
}

impl From<&QueryRequest> for QueryEcho {
    fn from(request: &QueryRequest) -> Self {
        Self {
            query_type: request.query_type,
            target: request.target.clone(),
            for_entity: request.for_entity.clone(),
            include_related: request.include_related,
        }
    }
}

/// A node as presented to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub file_path: String,
    pub package: Option<String>,
    pub description: String,
    pub properties: NodeProperties,
}

impl From<&GraphNode> for EntitySummary {
    fn from(node: &GraphNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            node_type: node.node_type(),
            file_path: node.file_path().to_string(),
            package: node.package().map(|p| p.to_string()),
            description: node.description(),
            properties: node.properties.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub rel_type: RelationType,
    pub source: String,
    pub target: String,
    pub source_name: Option<String>,
    pub target_name: Option<String>,
}

impl RelationshipSummary {
    pub fn new(rel: &GraphRelationship, names: &HashMap<&str, &str>) -> Self {
        Self {
            id: rel.id.clone(),
            rel_type: rel.rel_type,
            source: rel.source.clone(),
            target: rel.target.clone(),
            source_name: names.get(rel.source.as_str()).map(|n| n.to_string()),
            target_name: names.get(rel.target.as_str()).map(|n| n.to_string()),
        }
    }
}

/// File paths of the result, bucketed by layer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelatedFiles {
    pub schemas: Vec<String>,
    pub apis: Vec<String>,
    pub ui_components: Vec<String>,
    pub tests: Vec<String>,
    pub migrations: Vec<String>,
}

impl RelatedFiles {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.apis.is_empty()
            && self.ui_components.is_empty()
            && self.tests.is_empty()
            && self.migrations.is_empty()
    }
}

/// Matches of one node type (find_pattern)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSummary {
    pub node_type: NodeType,
    pub count: usize,
    pub examples: Vec<String>,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResults {
    pub primary_target: Option<EntitySummary>,
    pub related_entities: Vec<EntitySummary>,
    pub relationships: Vec<RelationshipSummary>,
    pub related_files: RelatedFiles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    pub patterns: Vec<PatternSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseMetadata {
    pub execution_time_ms: u64,
    pub confidence: f64,
    pub total_found: usize,
}

/// Structured resolver output. Failures carry the error and the original query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub query: QueryEcho,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<QueryResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    pub fn success(query: QueryEcho, results: QueryResults, metadata: ResponseMetadata) -> Self {
        Self {
            success: true,
            query,
            results: Some(results),
            metadata: Some(metadata),
            error: None,
        }
    }

    pub fn failure(query: QueryEcho, error: impl Into<String>) -> Self {
        Self {
            success: false,
            query,
            results: None,
            metadata: None,
            error: Some(error.into()),
        }
    }

    /// Human-readable rendering for the terminal
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} \"{}\"{}",
            self.query.query_type,
            self.query.target,
            self.query
                .for_entity
                .as_ref()
                .map(|e| format!(" (entity: {})", e))
                .unwrap_or_default()
        );

        if let Some(error) = &self.error {
            let _ = writeln!(out, "error: {}", error);
            return out;
        }
        let Some(results) = &self.results else {
            return out;
        };

        match &results.primary_target {
            Some(primary) => {
                let _ = writeln!(
                    out,
                    "\nPrimary: {} [{}] {}",
                    primary.name, primary.node_type, primary.file_path
                );
                let _ = writeln!(out, "  {}", primary.description);
            }
            None => {
                let _ = writeln!(out, "\nNo primary target");
            }
        }

        if !results.related_entities.is_empty() {
            let _ = writeln!(out, "\nRelated ({}):", results.related_entities.len());
            for entity in &results.related_entities {
                let _ = writeln!(
                    out,
                    "  - {} [{}] {}",
                    entity.name, entity.node_type, entity.file_path
                );
            }
        }

        if !results.relationships.is_empty() {
            let _ = writeln!(out, "\nRelationships:");
            for rel in &results.relationships {
                let _ = writeln!(
                    out,
                    "  {} -[{}]-> {}",
                    rel.source_name.as_deref().unwrap_or(&rel.source),
                    rel.rel_type,
                    rel.target_name.as_deref().unwrap_or(&rel.target)
                );
            }
        }

        let files = &results.related_files;
        for (label, paths) in [
            ("Schemas", &files.schemas),
            ("APIs", &files.apis),
            ("UI components", &files.ui_components),
            ("Tests", &files.tests),
            ("Migrations", &files.migrations),
        ] {
            if !paths.is_empty() {
                let _ = writeln!(out, "\n{}:", label);
                for path in paths {
                    let _ = writeln!(out, "  {}", path);
                }
            }
        }

        for pattern in &results.patterns {
            let _ = writeln!(
                out,
                "\n{} x{}: {}",
                pattern.node_type,
                pattern.count,
                pattern.examples.join(", ")
            );
        }

        if let Some(suggestions) = &results.suggestions {
            let _ = writeln!(out, "\nSuggestions:");
            for s in suggestions {
                let _ = writeln!(out, "  * {}", s);
            }
        }

        if let Some(meta) = &self.metadata {
            let _ = writeln!(
                out,
                "\n{} found in {}ms (confidence {:.2})",
                meta.total_found, meta.execution_time_ms, meta.confidence
            );
        }
        out
    }
}
