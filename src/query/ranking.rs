//! Post-processing of query results: dedupe, rank, partition, bucket

use super::builder::{primary_term, tokenize};
use super::response::{PatternSummary, RelatedFiles};
use crate::neo4j::models::{GraphNode, NodeType};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How well a name matches the target. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRank {
    Exact,
    Prefix,
    Contains,
    Other,
}

/// Lowercase alphanumerics only, so "user profile" and "UserProfile" compare equal
fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn match_rank(name: &str, target: &str) -> MatchRank {
    let name = compact(name);
    let target = compact(target);
    if name == target {
        MatchRank::Exact
    } else if name.starts_with(&target) {
        MatchRank::Prefix
    } else if name.contains(&target) {
        MatchRank::Contains
    } else {
        MatchRank::Other
    }
}

/// A query target prepared for ranking: the whole target plus its terms
#[derive(Debug, Clone)]
pub struct RankTarget {
    whole: String,
    terms: Vec<String>,
    primary: String,
}

impl RankTarget {
    pub fn new(target: &str) -> Self {
        let terms = tokenize(target);
        Self {
            whole: target.trim().to_string(),
            primary: primary_term(&terms),
            terms,
        }
    }

    /// Number of distinct terms contained in the name
    fn terms_in(&self, name: &str) -> usize {
        let name = name.to_lowercase();
        self.terms.iter().filter(|t| name.contains(t.as_str())).count()
    }

    /// Sort key: whole-target rank, then more terms, then primary-term rank
    fn key(&self, name: &str) -> (MatchRank, std::cmp::Reverse<usize>, MatchRank) {
        (
            match_rank(name, &self.whole),
            std::cmp::Reverse(self.terms_in(name)),
            match_rank(name, &self.primary),
        )
    }

    /// Whether the node can stand as the primary target
    fn is_candidate(&self, node: &GraphNode) -> bool {
        let name = node.name.to_lowercase();
        let node_type = node.node_type().as_str().to_lowercase();
        match_rank(&node.name, &self.whole) != MatchRank::Other
            || name.contains(&self.primary)
            || node_type.contains(&self.primary)
    }

    fn is_exact(&self, name: &str) -> bool {
        match_rank(name, &self.whole) == MatchRank::Exact
    }
}

/// Preference between nodes sharing a name: definitions before references
fn type_priority(node_type: NodeType) -> u8 {
    match node_type {
        NodeType::SchemaEntity => 0,
        NodeType::Api => 1,
        NodeType::SchemaField => 2,
        NodeType::Interface | NodeType::Class => 3,
        NodeType::Function => 4,
        NodeType::Document => 5,
        NodeType::Package => 6,
        NodeType::File => 7,
        NodeType::Export => 8,
        NodeType::Import => 9,
    }
}

/// Keep one node per name, preferring definitions over references
pub fn dedupe_by_name(nodes: Vec<GraphNode>) -> Vec<GraphNode> {
    let mut order: Vec<String> = Vec::new();
    let mut best: HashMap<String, GraphNode> = HashMap::new();
    for node in nodes {
        let replace = match best.get(&node.name) {
            Some(kept) => {
                (type_priority(node.node_type()), node.id.as_str())
                    < (type_priority(kept.node_type()), kept.id.as_str())
            }
            None => {
                order.push(node.name.clone());
                true
            }
        };
        if replace {
            best.insert(node.name.clone(), node);
        }
    }
    order.into_iter().filter_map(|name| best.remove(&name)).collect()
}

/// Exact, then prefix, then contained, then the rest. Within a rank, names
/// holding more of the target's terms come first, then names holding the
/// primary term; remaining ties by name.
pub fn rank(mut nodes: Vec<GraphNode>, target: &RankTarget) -> Vec<GraphNode> {
    nodes.sort_by(|a, b| {
        target
            .key(&a.name)
            .cmp(&target.key(&b.name))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| type_priority(a.node_type()).cmp(&type_priority(b.node_type())))
            .then_with(|| a.id.cmp(&b.id))
    });
    nodes
}

/// Split ranked nodes into the primary target (the best node whose name
/// matches the target or whose name or type holds the primary term) and
/// everything else.
pub fn partition(
    ranked: Vec<GraphNode>,
    target: &RankTarget,
) -> (Option<GraphNode>, Vec<GraphNode>) {
    let position = ranked.iter().position(|n| target.is_candidate(n));
    let mut related = ranked;
    let primary = position.map(|i| related.remove(i));
    (primary, related)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileBucket {
    Schema,
    Api,
    Ui,
    Test,
}

/// Layer of a file path. Checks run in order and the first hit wins.
pub fn classify_path(path: &str) -> Option<FileBucket> {
    let lower = path.to_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|k| lower.contains(k));
    if has(&["schema", ".prisma"]) {
        Some(FileBucket::Schema)
    } else if has(&["api", "trpc", "router", "routes"]) {
        Some(FileBucket::Api)
    } else if has(&["component", "/ui/", "pages/", "app/", ".tsx", ".jsx"]) {
        Some(FileBucket::Ui)
    } else if has(&["test", "spec"]) {
        Some(FileBucket::Test)
    } else {
        None
    }
}

/// Directory part of a repository-relative path
fn parent_dir(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(dir, _)| dir)
}

/// Bucket distinct paths by layer and derive one migrations entry per
/// schema directory.
pub fn bucket_files<'a>(paths: impl IntoIterator<Item = &'a str>) -> RelatedFiles {
    let distinct: BTreeSet<&str> = paths.into_iter().filter(|p| !p.is_empty()).collect();
    let mut files = RelatedFiles::default();
    for path in distinct {
        let bucket = match classify_path(path) {
            Some(FileBucket::Schema) => &mut files.schemas,
            Some(FileBucket::Api) => &mut files.apis,
            Some(FileBucket::Ui) => &mut files.ui_components,
            Some(FileBucket::Test) => &mut files.tests,
            None => continue,
        };
        bucket.push(path.to_string());
    }

    let schema_dirs: BTreeSet<String> = files
        .schemas
        .iter()
        .map(|p| match parent_dir(p) {
            Some(dir) => format!("{}/migrations", dir),
            None => "migrations".to_string(),
        })
        .collect();
    files.migrations = schema_dirs.into_iter().collect();
    files
}

const PATTERN_EXAMPLES: usize = 5;

/// Group nodes by type for find_pattern
pub fn group_patterns(nodes: &[GraphNode]) -> Vec<PatternSummary> {
    let mut groups: BTreeMap<&'static str, (NodeType, Vec<&GraphNode>)> = BTreeMap::new();
    for node in nodes {
        groups
            .entry(node.node_type().as_str())
            .or_insert_with(|| (node.node_type(), Vec::new()))
            .1
            .push(node);
    }

    let mut patterns: Vec<PatternSummary> = groups
        .into_values()
        .map(|(node_type, members)| {
            let files: BTreeSet<&str> = members
                .iter()
                .map(|n| n.file_path())
                .filter(|p| !p.is_empty())
                .collect();
            PatternSummary {
                node_type,
                count: members.len(),
                examples: members
                    .iter()
                    .take(PATTERN_EXAMPLES)
                    .map(|n| n.name.clone())
                    .collect(),
                files: files
                    .into_iter()
                    .take(PATTERN_EXAMPLES)
                    .map(|p| p.to_string())
                    .collect(),
            }
        })
        .collect();
    patterns.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.node_type.as_str().cmp(b.node_type.as_str()))
    });
    patterns
}

/// Confidence of a resolved query
pub fn confidence(primary: Option<&GraphNode>, target: &RankTarget, related_count: usize) -> f64 {
    match primary {
        Some(node) if target.is_exact(&node.name) => 1.0,
        Some(_) => 0.8,
        None if related_count > 0 => 0.5,
        None => 0.0,
    }
}
