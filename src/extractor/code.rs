//! TypeScript/JavaScript code extractor
//!
//! Tree-sitter based extraction of:
//! - Functions (declarations, arrow functions assigned to variables, class methods)
//! - Classes with their `extends`/`implements` names
//! - Interfaces
//! - Imports and exports
//!
//! Every symbol hangs off its File node through CONTAINS, IMPORTS or EXPORTS.

use super::helpers::{
    content_hash, file_node, file_node_id, find_child_by_kind, get_field_text, get_text,
    has_child_kind, package_node_id,
};
use super::{
    is_internal_import, package_of_import, ExtractionError, Extractor, GraphFragment, SourceFile,
};
use crate::identity::{IdExtra, IdGenerator};
use crate::neo4j::models::*;
use std::collections::HashSet;
use tree_sitter::{Language, Parser};

const CODE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Function { is_async: bool, params: Vec<String> },
    Class { extends: Option<String>, implements: Vec<String> },
    Interface { extends: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub line_start: u32,
    pub line_end: u32,
    pub is_exported: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDef {
    pub source: String,
    pub items: Vec<String>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportDef {
    pub name: String,
    pub is_default: bool,
    pub line: u32,
}

/// Everything recognized in one source file
#[derive(Debug, Clone, Default)]
pub struct ParsedCode {
    pub symbols: Vec<CodeSymbol>,
    pub imports: Vec<ImportDef>,
    pub exports: Vec<ExportDef>,
}

/// Scan output for one code file
#[derive(Debug, Clone)]
pub struct CodeFileRecord {
    pub file: SourceFile,
    pub hash: String,
    pub line_count: u32,
    pub parsed: ParsedCode,
}

pub struct CodeExtractor {
    ids: IdGenerator,
    internal_namespaces: Vec<String>,
}

impl CodeExtractor {
    pub fn new(ids: IdGenerator, internal_namespaces: Vec<String>) -> Self {
        Self {
            ids,
            internal_namespaces,
        }
    }

    fn language_for(file: &SourceFile) -> Language {
        if file.has_extension(&["tsx", "jsx"]) {
            tree_sitter_typescript::LANGUAGE_TSX.into()
        } else {
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
        }
    }

    /// Parse a file into symbols, imports and exports
    pub fn parse(file: &SourceFile, content: &str) -> Result<ParsedCode, ExtractionError> {
        let parse_error = |message: String| ExtractionError::Parse {
            path: file.relative_path.clone(),
            message,
        };

        let mut parser = Parser::new();
        parser
            .set_language(&Self::language_for(file))
            .map_err(|e| parse_error(e.to_string()))?;
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| parse_error("parser returned no tree".to_string()))?;

        let mut parsed = ParsedCode::default();
        extract_recursive(&tree.root_node(), content, false, &mut parsed);
        Ok(parsed)
    }
}

impl Extractor for CodeExtractor {
    type Record = CodeFileRecord;

    fn name(&self) -> &'static str {
        "code"
    }

    fn node_types(&self) -> &'static [NodeType] {
        &[
            NodeType::File,
            NodeType::Function,
            NodeType::Class,
            NodeType::Interface,
            NodeType::Import,
            NodeType::Export,
        ]
    }

    fn relation_types(&self) -> &'static [RelationType] {
        &[
            RelationType::Contains,
            RelationType::Imports,
            RelationType::Exports,
            RelationType::DependsOn,
        ]
    }

    fn is_candidate(&self, file: &SourceFile) -> bool {
        file.has_extension(CODE_EXTENSIONS)
    }

    fn scan_file(
        &self,
        file: &SourceFile,
        content: &str,
    ) -> Result<Option<CodeFileRecord>, ExtractionError> {
        let parsed = Self::parse(file, content)?;
        Ok(Some(CodeFileRecord {
            file: file.clone(),
            hash: content_hash(content),
            line_count: content.lines().count() as u32,
            parsed,
        }))
    }

    fn transform_to_graph(&self, records: Vec<CodeFileRecord>) -> GraphFragment {
        let mut fragment = GraphFragment::default();

        for record in records {
            let file = &record.file;
            let path = file.relative_path.as_str();
            let package = file.package.as_deref();
            let file_id = file_node_id(&self.ids, file);
            fragment.push_node(file_node(&self.ids, file, &record.hash, record.line_count));
            let metadata = || NodeMetadata::new(Some(path.to_string()), file.package.clone(), 1.0);

            for symbol in record.parsed.symbols {
                let (node_type, properties) = match symbol.kind {
                    SymbolKind::Function { is_async, params } => (
                        NodeType::Function,
                        NodeProperties::Function {
                            file_path: path.to_string(),
                            line_start: symbol.line_start,
                            line_end: symbol.line_end,
                            is_async,
                            is_exported: symbol.is_exported,
                            params,
                        },
                    ),
                    SymbolKind::Class {
                        extends,
                        implements,
                    } => (
                        NodeType::Class,
                        NodeProperties::Class {
                            file_path: path.to_string(),
                            line_start: symbol.line_start,
                            line_end: symbol.line_end,
                            is_exported: symbol.is_exported,
                            extends,
                            implements,
                        },
                    ),
                    SymbolKind::Interface { extends } => (
                        NodeType::Interface,
                        NodeProperties::Interface {
                            file_path: path.to_string(),
                            line_start: symbol.line_start,
                            line_end: symbol.line_end,
                            is_exported: symbol.is_exported,
                            extends,
                        },
                    ),
                };
                let id = self
                    .ids
                    .node_id(node_type, package, &symbol.name, IdExtra::file(path));
                fragment.push_relationship(GraphRelationship::new(
                    self.ids.relationship_id(RelationType::Contains, &file_id, &id),
                    RelationType::Contains,
                    file_id.clone(),
                    id.clone(),
                    EdgeProperties::Plain,
                ));
                fragment.push_node(GraphNode::new(id, symbol.name, properties, metadata()));
            }

            let mut depended = HashSet::new();
            for import in record.parsed.imports {
                let internal_package = is_internal_import(&import.source, &self.internal_namespaces);
                let is_internal = internal_package || import.source.starts_with('.');
                let id = self.ids.node_id(
                    NodeType::Import,
                    package,
                    &import.source,
                    IdExtra::file(path),
                );
                fragment.push_relationship(GraphRelationship::new(
                    self.ids.relationship_id(RelationType::Imports, &file_id, &id),
                    RelationType::Imports,
                    file_id.clone(),
                    id.clone(),
                    EdgeProperties::Imports {
                        items: import.items.clone(),
                    },
                ));
                if internal_package {
                    let target_package = package_of_import(&import.source).to_string();
                    if depended.insert(target_package.clone()) {
                        let target = package_node_id(&self.ids, &target_package);
                        fragment.push_relationship(
                            GraphRelationship::new(
                                self.ids
                                    .relationship_id(RelationType::DependsOn, &file_id, &target),
                                RelationType::DependsOn,
                                file_id.clone(),
                                target,
                                EdgeProperties::DependsOn {
                                    specifier: import.source.clone(),
                                    version: None,
                                    dev: false,
                                },
                            )
                            .with_metadata(1.0, 0.9),
                        );
                    }
                }
                fragment.push_node(GraphNode::new(
                    id,
                    import.source.clone(),
                    NodeProperties::Import {
                        file_path: path.to_string(),
                        source: import.source,
                        items: import.items,
                        is_internal,
                        line: import.line,
                    },
                    metadata(),
                ));
            }

            for export in record.parsed.exports {
                let id = self
                    .ids
                    .node_id(NodeType::Export, package, &export.name, IdExtra::file(path));
                fragment.push_relationship(GraphRelationship::new(
                    self.ids.relationship_id(RelationType::Exports, &file_id, &id),
                    RelationType::Exports,
                    file_id.clone(),
                    id.clone(),
                    EdgeProperties::Plain,
                ));
                fragment.push_node(GraphNode::new(
                    id,
                    export.name,
                    NodeProperties::Export {
                        file_path: path.to_string(),
                        is_default: export.is_default,
                        line: export.line,
                    },
                    metadata(),
                ));
            }
        }

        fragment
    }
}

// ============================================================================
// AST walking
// ============================================================================

fn line_range(node: &tree_sitter::Node) -> (u32, u32) {
    (
        node.start_position().row as u32 + 1,
        node.end_position().row as u32 + 1,
    )
}

fn extract_recursive(node: &tree_sitter::Node, source: &str, exported: bool, parsed: &mut ParsedCode) {
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(func) = extract_function(&child, source, exported) {
                    parsed.symbols.push(func);
                }
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(class) = extract_class(&child, source, exported) {
                    let class_name = class.name.clone();
                    parsed.symbols.push(class);
                    if let Some(body) = child.child_by_field_name("body") {
                        extract_class_methods(&body, source, &class_name, parsed);
                    }
                }
            }
            "interface_declaration" => {
                if let Some(iface) = extract_interface(&child, source, exported) {
                    parsed.symbols.push(iface);
                }
            }
            "import_statement" => {
                if let Some(import) = extract_import(&child, source) {
                    parsed.imports.push(import);
                }
            }
            "export_statement" => {
                extract_exports(&child, source, parsed);
                extract_recursive(&child, source, true, parsed);
            }
            "lexical_declaration" | "variable_declaration" => {
                extract_variable_functions(&child, source, exported, parsed);
            }
            _ => extract_recursive(&child, source, exported, parsed),
        }
    }
}

fn extract_params(node: &tree_sitter::Node, source: &str) -> Vec<String> {
    let Some(params) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    let names = params
        .children(&mut cursor)
        .filter(|c| {
            matches!(
                c.kind(),
                "required_parameter" | "optional_parameter" | "rest_parameter" | "identifier"
            )
        })
        .filter_map(|c| {
            let pattern = c.child_by_field_name("pattern").unwrap_or(c);
            get_text(&pattern, source).map(|s| s.to_string())
        })
        .collect();
    names
}

fn extract_function(node: &tree_sitter::Node, source: &str, exported: bool) -> Option<CodeSymbol> {
    let name = get_field_text(node, "name", source)?;
    let (line_start, line_end) = line_range(node);
    Some(CodeSymbol {
        name,
        kind: SymbolKind::Function {
            is_async: has_child_kind(node, "async"),
            params: extract_params(node, source),
        },
        line_start,
        line_end,
        is_exported: exported,
    })
}

/// Split `extends A implements B, C` heritage text into its parts
fn parse_heritage(text: &str) -> (Option<String>, Vec<String>) {
    let text = text.trim();
    let (extends_part, implements_part) = match text.find("implements") {
        Some(idx) => (&text[..idx], Some(&text[idx + "implements".len()..])),
        None => (text, None),
    };
    let extends = extends_part
        .trim()
        .strip_prefix("extends")
        .map(|s| s.trim().trim_end_matches(',').to_string())
        .filter(|s| !s.is_empty());
    let implements = implements_part
        .map(|s| {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default();
    (extends, implements)
}

fn extract_class(node: &tree_sitter::Node, source: &str, exported: bool) -> Option<CodeSymbol> {
    let name = get_field_text(node, "name", source)?;
    let (extends, implements) = find_child_by_kind(node, "class_heritage")
        .and_then(|h| get_text(&h, source))
        .map(parse_heritage)
        .unwrap_or_default();
    let (line_start, line_end) = line_range(node);
    Some(CodeSymbol {
        name,
        kind: SymbolKind::Class {
            extends,
            implements,
        },
        line_start,
        line_end,
        is_exported: exported,
    })
}

fn extract_interface(node: &tree_sitter::Node, source: &str, exported: bool) -> Option<CodeSymbol> {
    let name = get_field_text(node, "name", source)?;
    let extends = find_child_by_kind(node, "extends_type_clause")
        .and_then(|c| get_text(&c, source))
        .map(|text| {
            text.trim()
                .trim_start_matches("extends")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let (line_start, line_end) = line_range(node);
    Some(CodeSymbol {
        name,
        kind: SymbolKind::Interface { extends },
        line_start,
        line_end,
        is_exported: exported,
    })
}

fn extract_class_methods(body: &tree_sitter::Node, source: &str, class_name: &str, parsed: &mut ParsedCode) {
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        if child.kind() != "method_definition" {
            continue;
        }
        if let Some(mut method) = extract_function(&child, source, false) {
            method.name = format!("{}.{}", class_name, method.name);
            parsed.symbols.push(method);
        }
    }
}

fn extract_variable_functions(
    node: &tree_sitter::Node,
    source: &str,
    exported: bool,
    parsed: &mut ParsedCode,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "variable_declarator" {
            continue;
        }
        let (Some(name), Some(value)) = (
            get_field_text(&child, "name", source),
            child.child_by_field_name("value"),
        ) else {
            continue;
        };
        if !matches!(value.kind(), "arrow_function" | "function_expression" | "function") {
            continue;
        }
        let (line_start, line_end) = line_range(node);
        parsed.symbols.push(CodeSymbol {
            name,
            kind: SymbolKind::Function {
                is_async: has_child_kind(&value, "async"),
                params: extract_params(&value, source),
            },
            line_start,
            line_end,
            is_exported: exported,
        });
    }
}

fn extract_import(node: &tree_sitter::Node, source: &str) -> Option<ImportDef> {
    let source_node = node
        .child_by_field_name("source")
        .or_else(|| find_child_by_kind(node, "string"))?;
    let path = get_text(&source_node, source)?
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string();

    let mut items = Vec::new();
    if let Some(clause) = find_child_by_kind(node, "import_clause") {
        collect_import_names(&clause, source, &mut items);
    }

    Some(ImportDef {
        source: path,
        items,
        line: node.start_position().row as u32 + 1,
    })
}

fn collect_import_names(node: &tree_sitter::Node, source: &str, items: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                if let Some(text) = get_text(&child, source) {
                    items.push(text.to_string());
                }
            }
            "import_specifier" => {
                let name = child
                    .child_by_field_name("alias")
                    .or_else(|| child.child_by_field_name("name"))
                    .and_then(|n| get_text(&n, source));
                if let Some(name) = name {
                    items.push(name.to_string());
                }
            }
            "namespace_import" => {
                if let Some(id) = find_child_by_kind(&child, "identifier") {
                    if let Some(text) = get_text(&id, source) {
                        items.push(format!("* as {}", text));
                    }
                }
            }
            _ => collect_import_names(&child, source, items),
        }
    }
}

fn extract_exports(node: &tree_sitter::Node, source: &str, parsed: &mut ParsedCode) {
    let line = node.start_position().row as u32 + 1;
    let is_default = has_child_kind(node, "default");

    if let Some(decl) = node.child_by_field_name("declaration") {
        let mut names = Vec::new();
        if let Some(name) = get_field_text(&decl, "name", source) {
            names.push(name);
        } else {
            let mut cursor = decl.walk();
            for declarator in decl.children(&mut cursor) {
                if declarator.kind() == "variable_declarator" {
                    if let Some(name) = get_field_text(&declarator, "name", source) {
                        names.push(name);
                    }
                }
            }
        }
        for name in names {
            parsed.exports.push(ExportDef {
                name,
                is_default,
                line,
            });
        }
        return;
    }

    if let Some(clause) = find_child_by_kind(node, "export_clause") {
        let mut cursor = clause.walk();
        for spec in clause.children(&mut cursor) {
            if spec.kind() != "export_specifier" {
                continue;
            }
            let name = spec
                .child_by_field_name("alias")
                .or_else(|| spec.child_by_field_name("name"))
                .and_then(|n| get_text(&n, source));
            if let Some(name) = name {
                parsed.exports.push(ExportDef {
                    name: name.to_string(),
                    is_default: false,
                    line,
                });
            }
        }
        return;
    }

    if is_default {
        let name = node
            .child_by_field_name("value")
            .and_then(|v| get_text(&v, source))
            .filter(|t| t.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or("default");
        parsed.exports.push(ExportDef {
            name: name.to_string(),
            is_default: true,
            line,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn source(rel: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(format!("/repo/{}", rel)),
            relative_path: rel.to_string(),
            package: Some("@repo/web".to_string()),
        }
    }

    const SAMPLE: &str = r#"
import { db } from "@repo/db";
import React, { useState as useLocalState } from "react";
import * as utils from "./utils";

export interface UserProps extends BaseProps {
  name: string;
}

export class UserService extends BaseService implements Disposable {
  async load(id: string) {
    return db.user.find(id);
  }
}

export const formatUser = async (user: User, verbose?: boolean) => user.name;

function helper() {}

export default UserService;
"#;

    #[test]
    fn test_parse_symbols() {
        let parsed = CodeExtractor::parse(&source("apps/web/src/user.ts"), SAMPLE).unwrap();
        let names: Vec<&str> = parsed.symbols.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"UserProps"));
        assert!(names.contains(&"UserService"));
        assert!(names.contains(&"UserService.load"));
        assert!(names.contains(&"formatUser"));
        assert!(names.contains(&"helper"));

        let service = parsed
            .symbols
            .iter()
            .find(|s| s.name == "UserService")
            .unwrap();
        assert!(service.is_exported);
        match &service.kind {
            SymbolKind::Class {
                extends,
                implements,
            } => {
                assert_eq!(extends.as_deref(), Some("BaseService"));
                assert_eq!(implements, &vec!["Disposable".to_string()]);
            }
            other => panic!("expected class, got {:?}", other),
        }

        let format_user = parsed
            .symbols
            .iter()
            .find(|s| s.name == "formatUser")
            .unwrap();
        assert!(format_user.is_exported);
        match &format_user.kind {
            SymbolKind::Function { is_async, params } => {
                assert!(is_async);
                assert_eq!(params.len(), 2);
            }
            other => panic!("expected function, got {:?}", other),
        }

        let helper = parsed.symbols.iter().find(|s| s.name == "helper").unwrap();
        assert!(!helper.is_exported);
    }

    #[test]
    fn test_parse_imports_and_exports() {
        let parsed = CodeExtractor::parse(&source("apps/web/src/user.ts"), SAMPLE).unwrap();
        let sources: Vec<&str> = parsed.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["@repo/db", "react", "./utils"]);
        assert!(parsed.imports[1].items.contains(&"useLocalState".to_string()));
        assert!(parsed.imports[2].items.contains(&"* as utils".to_string()));

        let exports: Vec<&str> = parsed.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(exports.contains(&"UserProps"));
        assert!(exports.contains(&"formatUser"));
        assert!(parsed
            .exports
            .iter()
            .any(|e| e.is_default && e.name == "UserService"));
    }

    #[test]
    fn test_parse_heritage() {
        assert_eq!(
            parse_heritage("extends Base implements A, B"),
            (Some("Base".to_string()), vec!["A".to_string(), "B".to_string()])
        );
        assert_eq!(parse_heritage("implements A"), (None, vec!["A".to_string()]));
    }

    #[test]
    fn test_transform_edges() {
        let ex = CodeExtractor::new(IdGenerator::default(), vec!["@repo/".to_string()]);
        let file = source("apps/web/src/user.ts");
        let record = ex.scan_file(&file, SAMPLE).unwrap().unwrap();
        let fragment = ex.transform_to_graph(vec![record]);

        let count = |t: RelationType| {
            fragment
                .relationships
                .iter()
                .filter(|r| r.rel_type == t)
                .count()
        };
        assert_eq!(count(RelationType::Imports), 3);
        assert_eq!(count(RelationType::DependsOn), 1);
        assert!(count(RelationType::Contains) >= 5);
        assert!(count(RelationType::Exports) >= 3);

        let internal: Vec<bool> = fragment
            .nodes
            .iter()
            .filter_map(|n| match &n.properties {
                NodeProperties::Import { is_internal, .. } => Some(*is_internal),
                _ => None,
            })
            .collect();
        assert_eq!(internal.iter().filter(|i| **i).count(), 2);
    }

    #[test]
    fn test_tsx_files_parse() {
        let content = "export function Card() { return <div className=\"card\">hi</div>; }";
        let parsed = CodeExtractor::parse(&source("apps/web/src/Card.tsx"), content).unwrap();
        assert_eq!(parsed.symbols.len(), 1);
        assert_eq!(parsed.exports[0].name, "Card");
    }
}
