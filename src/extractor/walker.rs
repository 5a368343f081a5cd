//! Repository file discovery

use super::{relative_path, ExtractionConfig, SourceFile, DEFAULT_SKIP_DIRS};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walks the configured scan directories under an explicit root
pub struct RepositoryWalker<'a> {
    root: &'a Path,
    config: &'a ExtractionConfig,
}

impl<'a> RepositoryWalker<'a> {
    pub fn new(root: &'a Path, config: &'a ExtractionConfig) -> Self {
        Self { root, config }
    }

    fn is_skipped_dir(&self, name: &str) -> bool {
        DEFAULT_SKIP_DIRS.contains(&name) || self.config.skip_dirs.iter().any(|d| d == name)
    }

    /// Collect every file under the scan directories, tagged with its package.
    ///
    /// Missing scan directories and unreadable entries are skipped.
    pub fn walk(&self) -> Vec<SourceFile> {
        let mut paths = BTreeSet::new();

        for scan_dir in &self.config.scan_dirs {
            let dir = match scan_dir.trim_matches('/') {
                "" | "." => self.root.to_path_buf(),
                sub => self.root.join(sub),
            };
            if !dir.is_dir() {
                tracing::debug!("Scan directory not found, skipping: {}", dir.display());
                continue;
            }

            let entries = WalkDir::new(&dir)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| {
                    !(e.depth() > 0
                        && e.file_type().is_dir()
                        && e.file_name()
                            .to_str()
                            .map(|n| self.is_skipped_dir(n))
                            .unwrap_or(false))
                });

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::debug!("Skipping unreadable entry: {}", e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let too_large = entry
                    .metadata()
                    .map(|m| m.len() > self.config.max_file_size)
                    .unwrap_or(false);
                if too_large {
                    tracing::debug!("Skipping large file: {}", entry.path().display());
                    continue;
                }
                paths.insert(entry.into_path());
            }
        }

        let packages = Self::package_roots(&paths);
        paths
            .into_iter()
            .map(|path| {
                let package = Self::owning_package(&packages, &path);
                SourceFile {
                    relative_path: relative_path(self.root, &path),
                    path,
                    package,
                }
            })
            .collect()
    }

    /// Directory -> package name, from every `package.json` found
    fn package_roots(paths: &BTreeSet<PathBuf>) -> BTreeMap<PathBuf, String> {
        paths
            .iter()
            .filter(|p| p.file_name().and_then(|n| n.to_str()) == Some("package.json"))
            .filter_map(|p| {
                let content = std::fs::read_to_string(p).ok()?;
                let manifest: serde_json::Value = serde_json::from_str(&content).ok()?;
                let name = manifest.get("name")?.as_str()?.to_string();
                Some((p.parent()?.to_path_buf(), name))
            })
            .collect()
    }

    fn owning_package(packages: &BTreeMap<PathBuf, String>, path: &Path) -> Option<String> {
        path.ancestors()
            .skip(1)
            .find_map(|dir| packages.get(dir))
            .cloned()
    }
}
