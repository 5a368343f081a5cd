//! Main orchestrator runner

use crate::context::{ContextSynthesizer, DevelopmentContext};
use crate::extractor::ExtractionPipeline;
use crate::identity::IdGenerator;
use crate::intent::IntentClassifier;
use crate::neo4j::error::StoreResult;
use crate::neo4j::models::{ExtractionMetadata, GraphStats};
use crate::neo4j::GraphStore;
use crate::query::{QueryRequest, QueryResolver, QueryResponse, QueryType};
use crate::AppState;
use anyhow::{Context, Result};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Outcome of a repository sync
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub root: PathBuf,
    pub files_scanned: usize,
    pub nodes: usize,
    pub relationships: usize,
    pub extractors: Vec<ExtractionMetadata>,
    pub duration_ms: u64,
}

/// Ties the pipeline, the graph store, the resolver and the synthesizer together
pub struct Orchestrator {
    state: AppState,
    resolver: QueryResolver,
    classifier: IntentClassifier,
    synthesizer: ContextSynthesizer,
}

impl Orchestrator {
    pub fn new(state: AppState) -> Self {
        let resolver = QueryResolver::new(state.store.clone(), state.config.query.clone());
        Self {
            state,
            resolver,
            classifier: IntentClassifier::new(),
            synthesizer: ContextSynthesizer::new(),
        }
    }

    /// Get the graph store
    pub fn store(&self) -> &dyn GraphStore {
        self.state.store.as_ref()
    }

    /// Extract a repository and import the result into the graph store.
    ///
    /// `root` defaults to the configured repository root.
    pub async fn sync_repository(&self, root: Option<&Path>) -> Result<SyncReport> {
        let root = root
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.state.config.repository_root.clone());
        let start = Instant::now();
        tracing::info!("Syncing repository: {}", root.display());

        let pipeline = ExtractionPipeline::new(root.clone(), self.state.config.extraction.clone())
            .with_default_extractors(IdGenerator::new(self.state.config.id_scheme));
        let output = tokio::task::spawn_blocking(move || pipeline.run())
            .await
            .context("Extraction task failed")?
            .with_context(|| format!("Failed to extract {}", root.display()))?;

        self.connected(
            self.state
                .store
                .import_data(&output.nodes, &output.relationships),
        )
        .await
        .context("Failed to import graph")?;

        let report = SyncReport {
            root,
            files_scanned: output.files_scanned,
            nodes: output.nodes.len(),
            relationships: output.relationships.len(),
            extractors: output.results,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "Sync complete: {} files, {} nodes, {} relationships in {}ms",
            report.files_scanned,
            report.nodes,
            report.relationships,
            report.duration_ms
        );
        Ok(report)
    }

    /// Run a structured query
    pub async fn resolve(&self, request: &QueryRequest) -> QueryResponse {
        self.resolver.resolve(request).await
    }

    /// Classify a natural-language request, look up its entity and build
    /// a development context.
    pub async fn ask(&self, text: &str) -> DevelopmentContext {
        let intent = self.classifier.classify(text);
        tracing::debug!(
            "Classified {:?} as {} (entity {:?}, field {:?}, confidence {})",
            text,
            intent.detected_action,
            intent.target_entity,
            intent.field_name,
            intent.confidence
        );

        let resolved = match &intent.target_entity {
            Some(entity) => {
                let request = QueryRequest::new(QueryType::FindEntity, entity.clone())
                    .include_related(true);
                Some(self.resolver.resolve(&request).await)
            }
            None => None,
        };
        self.synthesizer.synthesize(&intent, resolved.as_ref())
    }

    /// Node and relationship counts of the stored graph
    pub async fn stats(&self) -> Result<GraphStats> {
        self.connected(self.state.store.get_stats())
            .await
            .context("Failed to read graph stats")
    }

    /// Remove the whole graph
    pub async fn clear(&self) -> Result<()> {
        self.connected(self.state.store.clear_database())
            .await
            .context("Failed to clear graph")?;
        tracing::info!("Graph cleared");
        Ok(())
    }

    /// Run one store operation between connect and disconnect
    async fn connected<T>(&self, op: impl Future<Output = StoreResult<T>>) -> Result<T> {
        let store = &self.state.store;
        store
            .connect()
            .await
            .context("Failed to connect to graph store")?;
        let result = op.await;
        if let Err(e) = store.disconnect().await {
            tracing::warn!("Failed to disconnect from graph store: {}", e);
        }
        Ok(result?)
    }
}
