//! Graph models for the repository knowledge graph
//!
//! Nodes and relationships are immutable once emitted by an extractor.
//! Identity lives only in `id`; properties and metadata never feed it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Free-form extension map carried next to the typed property sets
pub type ExtraProperties = BTreeMap<String, serde_json::Value>;

// ============================================================================
// Node and relationship kinds
// ============================================================================

/// Kind of a graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    Package,
    File,
    Document,
    #[serde(rename = "API")]
    Api,
    SchemaEntity,
    SchemaField,
    Function,
    Class,
    Interface,
    Import,
    Export,
}

impl NodeType {
    pub const ALL: [NodeType; 11] = [
        NodeType::Package,
        NodeType::File,
        NodeType::Document,
        NodeType::Api,
        NodeType::SchemaEntity,
        NodeType::SchemaField,
        NodeType::Function,
        NodeType::Class,
        NodeType::Interface,
        NodeType::Import,
        NodeType::Export,
    ];

    /// Label used both as the Neo4j label and the `type` property
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Package => "Package",
            NodeType::File => "File",
            NodeType::Document => "Document",
            NodeType::Api => "API",
            NodeType::SchemaEntity => "SchemaEntity",
            NodeType::SchemaField => "SchemaField",
            NodeType::Function => "Function",
            NodeType::Class => "Class",
            NodeType::Interface => "Interface",
            NodeType::Import => "Import",
            NodeType::Export => "Export",
        }
    }

    /// Namespace token used as the id prefix
    pub fn namespace(&self) -> &'static str {
        match self {
            NodeType::Package => "package",
            NodeType::File | NodeType::Document => "file",
            NodeType::Api => "api",
            NodeType::SchemaEntity | NodeType::SchemaField => "schema",
            NodeType::Import => "import",
            NodeType::Export => "export",
            NodeType::Function | NodeType::Class | NodeType::Interface => "symbol",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown node type: {}", s))
    }
}

/// Kind of a graph relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    DependsOn,
    HasField,
    Defines,
    References,
    Implements,
    Extends,
    Calls,
    Imports,
    Exports,
    Contains,
}

impl RelationType {
    pub const ALL: [RelationType; 10] = [
        RelationType::DependsOn,
        RelationType::HasField,
        RelationType::Defines,
        RelationType::References,
        RelationType::Implements,
        RelationType::Extends,
        RelationType::Calls,
        RelationType::Imports,
        RelationType::Exports,
        RelationType::Contains,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::DependsOn => "DEPENDS_ON",
            RelationType::HasField => "HAS_FIELD",
            RelationType::Defines => "DEFINES",
            RelationType::References => "REFERENCES",
            RelationType::Implements => "IMPLEMENTS",
            RelationType::Extends => "EXTENDS",
            RelationType::Calls => "CALLS",
            RelationType::Imports => "IMPORTS",
            RelationType::Exports => "EXPORTS",
            RelationType::Contains => "CONTAINS",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown relationship type: {}", s))
    }
}

// ============================================================================
// Node property sets
// ============================================================================

/// Kind-specific node properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeProperties {
    Package {
        path: String,
        version: Option<String>,
        private: bool,
        description: Option<String>,
    },
    File {
        path: String,
        language: String,
        hash: String,
        line_count: u32,
    },
    Document {
        path: String,
        title: Option<String>,
    },
    Api {
        file_path: String,
        router: Option<String>,
        method: String,
        route: Option<String>,
        input_schema: Option<String>,
        line: u32,
    },
    SchemaEntity {
        file_path: String,
        style: String,
        field_count: u32,
        line: u32,
    },
    SchemaField {
        file_path: String,
        entity: String,
        field_type: String,
        nullable: bool,
        validation: Vec<String>,
        line: u32,
    },
    Function {
        file_path: String,
        line_start: u32,
        line_end: u32,
        is_async: bool,
        is_exported: bool,
        params: Vec<String>,
    },
    Class {
        file_path: String,
        line_start: u32,
        line_end: u32,
        is_exported: bool,
        extends: Option<String>,
        implements: Vec<String>,
    },
    Interface {
        file_path: String,
        line_start: u32,
        line_end: u32,
        is_exported: bool,
        extends: Vec<String>,
    },
    Import {
        file_path: String,
        source: String,
        items: Vec<String>,
        is_internal: bool,
        line: u32,
    },
    Export {
        file_path: String,
        is_default: bool,
        line: u32,
    },
}

impl NodeProperties {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeProperties::Package { .. } => NodeType::Package,
            NodeProperties::File { .. } => NodeType::File,
            NodeProperties::Document { .. } => NodeType::Document,
            NodeProperties::Api { .. } => NodeType::Api,
            NodeProperties::SchemaEntity { .. } => NodeType::SchemaEntity,
            NodeProperties::SchemaField { .. } => NodeType::SchemaField,
            NodeProperties::Function { .. } => NodeType::Function,
            NodeProperties::Class { .. } => NodeType::Class,
            NodeProperties::Interface { .. } => NodeType::Interface,
            NodeProperties::Import { .. } => NodeType::Import,
            NodeProperties::Export { .. } => NodeType::Export,
        }
    }

    /// Repository-relative path of the artifact this node was extracted from
    pub fn file_path(&self) -> &str {
        match self {
            NodeProperties::Package { path, .. }
            | NodeProperties::File { path, .. }
            | NodeProperties::Document { path, .. } => path,
            NodeProperties::Api { file_path, .. }
            | NodeProperties::SchemaEntity { file_path, .. }
            | NodeProperties::SchemaField { file_path, .. }
            | NodeProperties::Function { file_path, .. }
            | NodeProperties::Class { file_path, .. }
            | NodeProperties::Interface { file_path, .. }
            | NodeProperties::Import { file_path, .. }
            | NodeProperties::Export { file_path, .. } => file_path,
        }
    }

    /// Owning entity for schema fields
    pub fn entity(&self) -> Option<&str> {
        match self {
            NodeProperties::SchemaField { entity, .. } => Some(entity),
            _ => None,
        }
    }

    /// Short human-readable summary, stored as the searchable `description`
    pub fn describe(&self) -> String {
        match self {
            NodeProperties::Package {
                version,
                description,
                ..
            } => match (description, version) {
                (Some(d), _) => d.clone(),
                (None, Some(v)) => format!("package @ {}", v),
                (None, None) => "package".to_string(),
            },
            NodeProperties::File { language, .. } => format!("{} source file", language),
            NodeProperties::Document { title, .. } => {
                title.clone().unwrap_or_else(|| "document".to_string())
            }
            NodeProperties::Api {
                router,
                method,
                route,
                ..
            } => {
                let mut s = format!("{} endpoint", method);
                if let Some(r) = router {
                    s.push_str(&format!(" in {}", r));
                }
                if let Some(r) = route {
                    s.push_str(&format!(" at {}", r));
                }
                s
            }
            NodeProperties::SchemaEntity {
                style, field_count, ..
            } => format!("{} schema entity with {} fields", style, field_count),
            NodeProperties::SchemaField {
                entity,
                field_type,
                nullable,
                ..
            } => format!(
                "{} field of {}{}",
                field_type,
                entity,
                if *nullable { " (optional)" } else { "" }
            ),
            NodeProperties::Function { is_async, .. } => {
                if *is_async {
                    "async function".to_string()
                } else {
                    "function".to_string()
                }
            }
            NodeProperties::Class { extends, .. } => match extends {
                Some(base) => format!("class extending {}", base),
                None => "class".to_string(),
            },
            NodeProperties::Interface { .. } => "interface".to_string(),
            NodeProperties::Import { source, .. } => format!("import from {}", source),
            NodeProperties::Export { is_default, .. } => {
                if *is_default {
                    "default export".to_string()
                } else {
                    "named export".to_string()
                }
            }
        }
    }
}

/// Provenance and confidence of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub source_file: Option<String>,
    pub package: Option<String>,
    pub confidence: f64,
    pub extracted_at: DateTime<Utc>,
}

impl NodeMetadata {
    pub fn new(source_file: Option<String>, package: Option<String>, confidence: f64) -> Self {
        Self {
            source_file,
            package,
            confidence: confidence.clamp(0.0, 1.0),
            extracted_at: Utc::now(),
        }
    }
}

/// A node in the repository knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub properties: NodeProperties,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraProperties,
    pub metadata: NodeMetadata,
}

impl GraphNode {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        properties: NodeProperties,
        metadata: NodeMetadata,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            properties,
            extra: ExtraProperties::new(),
            metadata,
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.properties.node_type()
    }

    pub fn file_path(&self) -> &str {
        self.properties.file_path()
    }

    pub fn package(&self) -> Option<&str> {
        self.metadata.package.as_deref()
    }

    pub fn description(&self) -> String {
        self.properties.describe()
    }
}

// ============================================================================
// Relationship property sets
// ============================================================================

/// Kind-specific relationship properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeProperties {
    HasField {
        field_type: String,
        nullable: bool,
        validation: Vec<String>,
    },
    DependsOn {
        specifier: String,
        version: Option<String>,
        dev: bool,
    },
    Imports {
        items: Vec<String>,
    },
    Plain,
}

/// Weight and confidence of a relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMetadata {
    pub weight: f64,
    pub confidence: f64,
}

impl Default for RelationshipMetadata {
    fn default() -> Self {
        Self {
            weight: 1.0,
            confidence: 1.0,
        }
    }
}

/// A directed, typed edge between two node ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRelationship {
    pub id: String,
    #[serde(rename = "type")]
    pub rel_type: RelationType,
    pub source: String,
    pub target: String,
    pub properties: EdgeProperties,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraProperties,
    pub metadata: RelationshipMetadata,
}

impl GraphRelationship {
    pub fn new(
        id: impl Into<String>,
        rel_type: RelationType,
        source: impl Into<String>,
        target: impl Into<String>,
        properties: EdgeProperties,
    ) -> Self {
        Self {
            id: id.into(),
            rel_type,
            source: source.into(),
            target: target.into(),
            properties,
            extra: ExtraProperties::new(),
            metadata: RelationshipMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, weight: f64, confidence: f64) -> Self {
        self.metadata = RelationshipMetadata {
            weight,
            confidence: confidence.clamp(0.0, 1.0),
        };
        self
    }
}

// ============================================================================
// Extraction results
// ============================================================================

/// Summary of one extractor run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub extractor_name: String,
    pub extraction_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub source_count: usize,
    pub node_count: usize,
    pub relationship_count: usize,
}

/// Output of a single extractor run. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    nodes: Vec<GraphNode>,
    relationships: Vec<GraphRelationship>,
    metadata: ExtractionMetadata,
}

impl ExtractionResult {
    pub fn new(
        extractor_name: impl Into<String>,
        nodes: Vec<GraphNode>,
        relationships: Vec<GraphRelationship>,
        source_count: usize,
        duration_ms: u64,
    ) -> Self {
        let metadata = ExtractionMetadata {
            extractor_name: extractor_name.into(),
            extraction_time: Utc::now(),
            duration_ms,
            source_count,
            node_count: nodes.len(),
            relationship_count: relationships.len(),
        };
        Self {
            nodes,
            relationships,
            metadata,
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn relationships(&self) -> &[GraphRelationship] {
        &self.relationships
    }

    pub fn metadata(&self) -> &ExtractionMetadata {
        &self.metadata
    }

    pub fn into_parts(self) -> (Vec<GraphNode>, Vec<GraphRelationship>, ExtractionMetadata) {
        (self.nodes, self.relationships, self.metadata)
    }
}

// ============================================================================
// Queries and results
// ============================================================================

/// Typed Cypher parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    StringList(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::StringList(v)
    }
}

/// What a return column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Node,
    Relationship,
    Scalar,
}

/// Which node fields a search term is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchFields {
    /// name, type, description and file path
    #[default]
    All,
    Name,
    NameOrPath,
}

/// Structured form of a node search, evaluated by stores that cannot run Cypher
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeMatcher {
    /// Lowercase terms; a node matches when any term is contained in one of its searchable fields
    pub terms: Vec<String>,
    /// Lowercase term whose presence in the name ranks a node first
    pub primary: String,
    /// Lowercase whole target; when set, an equal name ranks before everything
    pub exact: Option<String>,
    pub fields: MatchFields,
    /// Empty means all types
    pub node_types: Vec<NodeType>,
    /// Lowercase entity filter (entity property equal, or file path containing it)
    pub for_entity: Option<String>,
    pub limit: usize,
    /// Expand one outgoing relationship hop per matched node
    pub expand_relationships: bool,
}

/// A parameterized Cypher query with its declared return columns
#[derive(Debug, Clone, PartialEq)]
pub struct CypherQuery {
    pub text: String,
    pub params: BTreeMap<String, ParamValue>,
    pub columns: Vec<(String, ColumnKind)>,
    pub matcher: Option<NodeMatcher>,
}

impl CypherQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: BTreeMap::new(),
            columns: Vec::new(),
            matcher: None,
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn returns(mut self, alias: impl Into<String>, kind: ColumnKind) -> Self {
        self.columns.push((alias.into(), kind));
        self
    }

    pub fn with_matcher(mut self, matcher: NodeMatcher) -> Self {
        self.matcher = Some(matcher);
        self
    }
}

/// One cell of a result record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    Node(String),
    Relationship(String),
    Scalar(serde_json::Value),
    Null,
}

/// Result of a query: deduplicated nodes and edges plus raw records
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<GraphRelationship>,
    pub records: Vec<BTreeMap<String, RecordValue>>,
    #[serde(skip)]
    node_ids: HashSet<String>,
    #[serde(skip)]
    relationship_ids: HashSet<String>,
}

impl QueryResult {
    /// A result holding the given nodes, first occurrence of each id kept
    pub fn from_nodes(nodes: impl IntoIterator<Item = GraphNode>) -> Self {
        let mut result = Self::default();
        for node in nodes {
            result.push_node(node);
        }
        result
    }

    /// Add a node unless one with the same id is already present
    pub fn push_node(&mut self, node: GraphNode) {
        if self.node_ids.insert(node.id.clone()) {
            self.nodes.push(node);
        }
    }

    /// Add a relationship unless one with the same id is already present
    pub fn push_relationship(&mut self, rel: GraphRelationship) {
        if self.relationship_ids.insert(rel.id.clone()) {
            self.relationships.push(rel);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }
}

/// Node and relationship counts per type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_relationships: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
    pub relationships_by_type: BTreeMap<String, usize>,
}
