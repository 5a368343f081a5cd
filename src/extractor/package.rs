//! Package manifest extractor
//!
//! One Package node per `package.json`, with DEPENDS_ON edges between
//! workspace packages (or towards internal-namespace packages that live
//! outside the scanned tree).

use super::helpers::package_node_id;
use super::{is_internal_import, ExtractionError, Extractor, GraphFragment, SourceFile};
use crate::identity::IdGenerator;
use crate::neo4j::models::*;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    name: Option<String>,
    version: Option<String>,
    description: Option<String>,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    peer_dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDependency {
    pub name: String,
    pub version: String,
    pub dev: bool,
}

/// Scan output for one manifest
#[derive(Debug, Clone)]
pub struct PackageManifest {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub private: bool,
    /// Repository-relative manifest path
    pub path: String,
    pub dependencies: Vec<ManifestDependency>,
}

pub struct PackageExtractor {
    ids: IdGenerator,
    internal_namespaces: Vec<String>,
}

impl PackageExtractor {
    pub fn new(ids: IdGenerator, internal_namespaces: Vec<String>) -> Self {
        Self {
            ids,
            internal_namespaces,
        }
    }

    /// Parse a manifest. Manifests without a name are not packages.
    pub fn parse_manifest(
        file: &SourceFile,
        content: &str,
    ) -> Result<Option<PackageManifest>, ExtractionError> {
        let raw: RawManifest =
            serde_json::from_str(content).map_err(|e| ExtractionError::Parse {
                path: file.relative_path.clone(),
                message: e.to_string(),
            })?;
        let Some(name) = raw.name else {
            return Ok(None);
        };

        let mut dependencies: Vec<ManifestDependency> = raw
            .dependencies
            .into_iter()
            .chain(raw.peer_dependencies)
            .map(|(name, version)| ManifestDependency {
                name,
                version,
                dev: false,
            })
            .collect();
        dependencies.extend(raw.dev_dependencies.into_iter().map(|(name, version)| {
            ManifestDependency {
                name,
                version,
                dev: true,
            }
        }));

        Ok(Some(PackageManifest {
            name,
            version: raw.version,
            description: raw.description,
            private: raw.private,
            path: file.relative_path.clone(),
            dependencies,
        }))
    }
}

impl Extractor for PackageExtractor {
    type Record = PackageManifest;

    fn name(&self) -> &'static str {
        "package"
    }

    fn node_types(&self) -> &'static [NodeType] {
        &[NodeType::Package]
    }

    fn relation_types(&self) -> &'static [RelationType] {
        &[RelationType::DependsOn]
    }

    fn is_candidate(&self, file: &SourceFile) -> bool {
        file.file_name() == "package.json"
    }

    fn scan_file(
        &self,
        file: &SourceFile,
        content: &str,
    ) -> Result<Option<PackageManifest>, ExtractionError> {
        Self::parse_manifest(file, content)
    }

    fn transform_to_graph(&self, mut records: Vec<PackageManifest>) -> GraphFragment {
        let mut fragment = GraphFragment::default();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        let workspace: HashSet<&str> = records.iter().map(|m| m.name.as_str()).collect();

        for manifest in &records {
            let id = package_node_id(&self.ids, &manifest.name);
            fragment.push_node(GraphNode::new(
                id.clone(),
                manifest.name.clone(),
                NodeProperties::Package {
                    path: manifest.path.clone(),
                    version: manifest.version.clone(),
                    private: manifest.private,
                    description: manifest.description.clone(),
                },
                NodeMetadata::new(Some(manifest.path.clone()), Some(manifest.name.clone()), 1.0),
            ));

            for dep in &manifest.dependencies {
                let internal = workspace.contains(dep.name.as_str())
                    || is_internal_import(&dep.name, &self.internal_namespaces);
                if !internal || dep.name == manifest.name {
                    continue;
                }
                let target = package_node_id(&self.ids, &dep.name);
                fragment.push_relationship(GraphRelationship::new(
                    self.ids
                        .relationship_id(RelationType::DependsOn, &id, &target),
                    RelationType::DependsOn,
                    id.clone(),
                    target,
                    EdgeProperties::DependsOn {
                        specifier: dep.name.clone(),
                        version: Some(dep.version.clone()),
                        dev: dep.dev,
                    },
                ));
            }
        }

        fragment
    }
}
