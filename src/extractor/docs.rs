//! Markdown document extractor

use super::helpers::{file_node, file_node_id, content_hash};
use super::{ExtractionError, Extractor, GraphFragment, SourceFile};
use crate::identity::{IdExtra, IdGenerator};
use crate::neo4j::models::*;

/// Scan output for one document
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub file: SourceFile,
    pub hash: String,
    pub line_count: u32,
    pub title: Option<String>,
}

pub struct DocumentExtractor {
    ids: IdGenerator,
}

impl DocumentExtractor {
    pub fn new(ids: IdGenerator) -> Self {
        Self { ids }
    }

    /// Text of the first level-one heading, skipping front matter
    pub fn title_of(content: &str) -> Option<String> {
        let mut in_front_matter = false;
        for (i, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if i == 0 && trimmed == "---" {
                in_front_matter = true;
                continue;
            }
            if in_front_matter {
                if trimmed == "---" {
                    in_front_matter = false;
                }
                continue;
            }
            if let Some(title) = trimmed.strip_prefix("# ") {
                let title = title.trim();
                if !title.is_empty() {
                    return Some(title.to_string());
                }
            }
        }
        None
    }
}

impl Extractor for DocumentExtractor {
    type Record = DocumentRecord;

    fn name(&self) -> &'static str {
        "document"
    }

    fn node_types(&self) -> &'static [NodeType] {
        &[NodeType::File, NodeType::Document]
    }

    fn relation_types(&self) -> &'static [RelationType] {
        &[RelationType::Contains]
    }

    fn is_candidate(&self, file: &SourceFile) -> bool {
        file.has_extension(&["md", "mdx"])
    }

    fn scan_file(
        &self,
        file: &SourceFile,
        content: &str,
    ) -> Result<Option<DocumentRecord>, ExtractionError> {
        Ok(Some(DocumentRecord {
            file: file.clone(),
            hash: content_hash(content),
            line_count: content.lines().count() as u32,
            title: Self::title_of(content),
        }))
    }

    fn transform_to_graph(&self, records: Vec<DocumentRecord>) -> GraphFragment {
        let mut fragment = GraphFragment::default();

        for record in records {
            let file = &record.file;
            let path = file.relative_path.as_str();
            let file_id = file_node_id(&self.ids, file);
            fragment.push_node(file_node(&self.ids, file, &record.hash, record.line_count));

            let name = record
                .title
                .clone()
                .unwrap_or_else(|| file.file_name().to_string());
            let id = self.ids.node_id(
                NodeType::Document,
                file.package.as_deref(),
                &name,
                IdExtra::file(path),
            );
            fragment.push_relationship(GraphRelationship::new(
                self.ids.relationship_id(RelationType::Contains, &file_id, &id),
                RelationType::Contains,
                file_id,
                id.clone(),
                EdgeProperties::Plain,
            ));
            fragment.push_node(GraphNode::new(
                id,
                name,
                NodeProperties::Document {
                    path: path.to_string(),
                    title: record.title,
                },
                NodeMetadata::new(Some(path.to_string()), file.package.clone(), 1.0),
            ));
        }

        fragment
    }
}
