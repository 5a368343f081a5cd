//! Helpers shared by the extractors

use super::SourceFile;
use crate::identity::{IdExtra, IdGenerator};
use crate::neo4j::models::*;
use sha2::{Digest, Sha256};

/// Language label from a file extension
pub fn language_of(file: &SourceFile) -> &'static str {
    match file.extension().map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("ts") | Some("tsx") | Some("mts") | Some("cts") => "typescript",
        Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => "javascript",
        Some("prisma") => "prisma",
        Some("json") => "json",
        Some("md") | Some("mdx") => "markdown",
        _ => "text",
    }
}

/// SHA-256 of the content, hex encoded
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Id of the File node for a source file
pub fn file_node_id(ids: &IdGenerator, file: &SourceFile) -> String {
    ids.node_id(
        NodeType::File,
        file.package.as_deref(),
        &file.relative_path,
        IdExtra::file(&file.relative_path),
    )
}

/// Id of a Package node. Packages are global by name.
pub fn package_node_id(ids: &IdGenerator, name: &str) -> String {
    ids.node_id(NodeType::Package, Some(name), name, IdExtra::default())
}

/// File node for a scanned source file.
///
/// Every extractor builds file nodes through this function so that the
/// same file always yields an identical node regardless of who emitted it.
pub fn file_node(ids: &IdGenerator, file: &SourceFile, hash: &str, line_count: u32) -> GraphNode {
    GraphNode::new(
        file_node_id(ids, file),
        file.relative_path.clone(),
        NodeProperties::File {
            path: file.relative_path.clone(),
            language: language_of(file).to_string(),
            hash: hash.to_string(),
            line_count,
        },
        NodeMetadata::new(Some(file.relative_path.clone()), file.package.clone(), 1.0),
    )
}

/// 1-based line number of a byte offset
pub fn line_at(content: &str, offset: usize) -> u32 {
    let offset = offset.min(content.len());
    content.as_bytes()[..offset]
        .iter()
        .filter(|b| **b == b'\n')
        .count() as u32
        + 1
}

/// Byte offset just past the `}` matching the first `{` at or after `open_from`.
///
/// Braces inside string literals and comments are ignored. Returns the
/// end of the content when the block never closes.
pub fn find_block_end(content: &str, open_from: usize) -> usize {
    let bytes = content.as_bytes();
    let mut depth = 0i32;
    let mut opened = false;
    let mut in_string: Option<u8> = None;
    let mut i = open_from;

    while i < bytes.len() {
        let b = bytes[i];
        match in_string {
            Some(quote) => {
                if b == b'\\' {
                    i += 1;
                } else if b == quote {
                    in_string = None;
                }
            }
            None => match b {
                b'"' | b'\'' | b'`' => in_string = Some(b),
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                    continue;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i += 2;
                    while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                        i += 1;
                    }
                    i += 2;
                    continue;
                }
                b'{' => {
                    depth += 1;
                    opened = true;
                }
                b'}' => {
                    depth -= 1;
                    if opened && depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    bytes.len()
}

/// Convert `snake_case`, `kebab-case` or spaced words to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut c = word.chars();
            match c.next() {
                None => String::new(),
                Some(f) => f.to_uppercase().chain(c).collect(),
            }
        })
        .collect()
}

/// Convert PascalCase or camelCase to snake_case
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else if c == '-' || c.is_whitespace() {
            if !result.ends_with('_') {
                result.push('_');
            }
        } else {
            result.push(c);
        }
    }
    result
}

// ============================================================================
// Tree-sitter helpers
// ============================================================================

/// Get the text content of a node
pub fn get_text<'a>(node: &tree_sitter::Node<'a>, source: &'a str) -> Option<&'a str> {
    node.utf8_text(source.as_bytes()).ok()
}

/// Get text from a named field in a node
pub fn get_field_text<'a>(
    node: &tree_sitter::Node<'a>,
    field: &str,
    source: &'a str,
) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| get_text(&n, source))
        .map(|s| s.to_string())
}

/// First direct child of the given kind
pub fn find_child_by_kind<'a>(
    node: &tree_sitter::Node<'a>,
    kind: &str,
) -> Option<tree_sitter::Node<'a>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

/// Whether any direct child has the given kind
pub fn has_child_kind(node: &tree_sitter::Node, kind: &str) -> bool {
    find_child_by_kind(node, kind).is_some()
}
