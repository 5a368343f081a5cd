//! Extractor pipeline
//!
//! Extractors turn one category of source artifact into graph nodes and
//! relationships. Each one filters candidate files, scans them into
//! per-file records in parallel, and transforms the records into a
//! [`GraphFragment`]. The [`ExtractionPipeline`] walks the repository once
//! and runs every registered extractor over the same file list.

pub mod api;
pub mod code;
pub mod docs;
pub mod helpers;
pub mod package;
pub mod pipeline;
pub mod schema;
pub mod walker;

pub use api::ApiExtractor;
pub use code::CodeExtractor;
pub use docs::DocumentExtractor;
pub use package::PackageExtractor;
pub use pipeline::{ExtractionPipeline, PipelineOutput};
pub use schema::SchemaExtractor;
pub use walker::RepositoryWalker;

use crate::neo4j::models::*;
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Failure to process a single file. Never aborts a run.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8")]
    Encoding { path: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Hard failures of a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no extractors registered")]
    NoExtractors,

    #[error("repository root does not exist: {0}")]
    RootNotFound(PathBuf),
}

// ============================================================================
// Configuration
// ============================================================================

/// Directories never descended into
pub const DEFAULT_SKIP_DIRS: &[&str] = &["node_modules", ".git", "dist", "build"];

/// Extraction settings (the `extraction` section of config.yaml)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Directories to walk, relative to the repository root
    pub scan_dirs: Vec<String>,
    /// Extra directory names to skip on top of [`DEFAULT_SKIP_DIRS`]
    pub skip_dirs: Vec<String>,
    /// Import prefixes that denote workspace-internal packages
    pub internal_namespaces: Vec<String>,
    /// Files larger than this are ignored
    pub max_file_size: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            scan_dirs: vec![".".into()],
            skip_dirs: vec![".next".into(), "coverage".into(), "target".into()],
            internal_namespaces: vec!["@repo/".into(), "@workspace/".into()],
            max_file_size: 1024 * 1024,
        }
    }
}

// ============================================================================
// Source files and fragments
// ============================================================================

/// A file discovered by the walker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Repository-relative path with forward slashes
    pub relative_path: String,
    /// Name of the nearest enclosing package, if any
    pub package: Option<String>,
}

impl SourceFile {
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn has_extension(&self, extensions: &[&str]) -> bool {
        self.extension()
            .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    /// Lowercase relative path contains any of the keywords
    pub fn path_contains_any(&self, keywords: &[&str]) -> bool {
        let lower = self.relative_path.to_lowercase();
        keywords.iter().any(|k| lower.contains(k))
    }
}

/// Read a source file as UTF-8
pub fn read_source(file: &SourceFile) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(&file.path).map_err(|source| ExtractionError::Read {
        path: file.relative_path.clone(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| ExtractionError::Encoding {
        path: file.relative_path.clone(),
    })
}

/// Nodes and relationships produced by one transform
#[derive(Debug, Clone, Default)]
pub struct GraphFragment {
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<GraphRelationship>,
}

impl GraphFragment {
    pub fn push_node(&mut self, node: GraphNode) {
        self.nodes.push(node);
    }

    pub fn push_relationship(&mut self, rel: GraphRelationship) {
        self.relationships.push(rel);
    }
}

// ============================================================================
// Extractor traits
// ============================================================================

/// A pluggable scanner for one category of source artifact
pub trait Extractor: Send + Sync {
    /// Per-file scan output
    type Record: Send;

    fn name(&self) -> &'static str;

    /// Node kinds this extractor can emit
    fn node_types(&self) -> &'static [NodeType];

    /// Relationship kinds this extractor can emit
    fn relation_types(&self) -> &'static [RelationType];

    /// Whether a file belongs to this extractor's domain
    fn is_candidate(&self, file: &SourceFile) -> bool;

    /// Recognize structure in one file. `Ok(None)` means nothing relevant.
    fn scan_file(
        &self,
        file: &SourceFile,
        content: &str,
    ) -> Result<Option<Self::Record>, ExtractionError>;

    fn transform_to_graph(&self, records: Vec<Self::Record>) -> GraphFragment;

    /// Scan every candidate in parallel. Per-file failures are logged and skipped.
    fn extract_raw_data(&self, files: &[SourceFile]) -> Vec<Self::Record> {
        files
            .par_iter()
            .filter(|file| self.is_candidate(file))
            .filter_map(|file| {
                match read_source(file).and_then(|content| self.scan_file(file, &content)) {
                    Ok(record) => record,
                    Err(e) => {
                        tracing::debug!("[{}] skipping file: {}", self.name(), e);
                        None
                    }
                }
            })
            .collect()
    }
}

/// Object-safe view of an [`Extractor`], so a pipeline can hold mixed extractors
pub trait RunExtractor: Send + Sync {
    fn extractor_name(&self) -> &'static str;

    fn run(&self, files: &[SourceFile]) -> ExtractionResult;
}

impl<E: Extractor> RunExtractor for E {
    fn extractor_name(&self) -> &'static str {
        self.name()
    }

    fn run(&self, files: &[SourceFile]) -> ExtractionResult {
        let start = Instant::now();
        let source_count = files.iter().filter(|f| self.is_candidate(f)).count();
        let records = self.extract_raw_data(files);
        let fragment = self.transform_to_graph(records);

        let result = ExtractionResult::new(
            self.name(),
            fragment.nodes,
            fragment.relationships,
            source_count,
            start.elapsed().as_millis() as u64,
        );
        tracing::info!(
            "[{}] {} candidate files -> {} nodes, {} relationships",
            self.name(),
            source_count,
            result.metadata().node_count,
            result.metadata().relationship_count
        );
        result
    }
}

/// Whether an import specifier points at a workspace-internal package
pub fn is_internal_import(specifier: &str, namespaces: &[String]) -> bool {
    namespaces.iter().any(|ns| specifier.starts_with(ns.as_str()))
}

/// Package name of an internal import (`@repo/db/schema` -> `@repo/db`)
pub fn package_of_import(specifier: &str) -> &str {
    let mut parts = specifier.splitn(3, '/');
    match (parts.next(), parts.next()) {
        (Some(scope), Some(name)) if scope.starts_with('@') => {
            &specifier[..scope.len() + 1 + name.len()]
        }
        (Some(name), _) => name,
        _ => specifier,
    }
}

/// Repository-relative path with forward slashes
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
