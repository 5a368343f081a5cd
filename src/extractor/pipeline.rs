//! Extraction pipeline: walk once, run every extractor, merge results

use super::walker::RepositoryWalker;
use super::{
    ApiExtractor, CodeExtractor, DocumentExtractor, ExtractionConfig, PackageExtractor,
    PipelineError, RunExtractor, SchemaExtractor,
};
use crate::identity::IdGenerator;
use crate::neo4j::models::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

/// Merged output of a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Per-extractor summaries, in registration order
    pub results: Vec<ExtractionMetadata>,
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<GraphRelationship>,
    pub files_scanned: usize,
}

pub struct ExtractionPipeline {
    root: PathBuf,
    config: ExtractionConfig,
    extractors: Vec<Box<dyn RunExtractor>>,
}

impl ExtractionPipeline {
    pub fn new(root: impl Into<PathBuf>, config: ExtractionConfig) -> Self {
        Self {
            root: root.into(),
            config,
            extractors: Vec::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn RunExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Register the schema, package, API, code and document extractors
    pub fn with_default_extractors(self, ids: IdGenerator) -> Self {
        let namespaces = self.config.internal_namespaces.clone();
        self.with_extractor(Box::new(SchemaExtractor::new(ids, namespaces.clone())))
            .with_extractor(Box::new(PackageExtractor::new(ids, namespaces.clone())))
            .with_extractor(Box::new(ApiExtractor::new(ids)))
            .with_extractor(Box::new(CodeExtractor::new(ids, namespaces)))
            .with_extractor(Box::new(DocumentExtractor::new(ids)))
    }

    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.extractor_name()).collect()
    }

    /// Walk the repository and run every extractor over the same file list.
    ///
    /// Extractors run in parallel; their outputs are concatenated in
    /// registration order and deduplicated by id, keeping the first emission.
    pub fn run(&self) -> Result<PipelineOutput, PipelineError> {
        if self.extractors.is_empty() {
            return Err(PipelineError::NoExtractors);
        }
        if !self.root.is_dir() {
            return Err(PipelineError::RootNotFound(self.root.clone()));
        }

        let start = Instant::now();
        let files = RepositoryWalker::new(&self.root, &self.config).walk();
        tracing::info!(
            "Scanning {} files under {} with {} extractors",
            files.len(),
            self.root.display(),
            self.extractors.len()
        );

        let results: Vec<ExtractionResult> = self
            .extractors
            .par_iter()
            .map(|extractor| extractor.run(&files))
            .collect();

        let mut output = PipelineOutput {
            files_scanned: files.len(),
            ..Default::default()
        };
        let mut seen_nodes = HashSet::new();
        let mut seen_relationships = HashSet::new();

        for result in results {
            let (nodes, relationships, metadata) = result.into_parts();
            output.nodes.extend(
                nodes
                    .into_iter()
                    .filter(|n| seen_nodes.insert(n.id.clone())),
            );
            output.relationships.extend(
                relationships
                    .into_iter()
                    .filter(|r| seen_relationships.insert(r.id.clone())),
            );
            output.results.push(metadata);
        }

        tracing::info!(
            "Extraction finished in {}ms: {} nodes, {} relationships",
            start.elapsed().as_millis(),
            output.nodes.len(),
            output.relationships.len()
        );
        Ok(output)
    }
}
