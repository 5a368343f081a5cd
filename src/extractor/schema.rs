//! Schema extractor
//!
//! Recognizes data-model definitions in schema-like files:
//! - zod objects (`const UserSchema = z.object({ ... })`)
//! - TypeScript interfaces and object type aliases
//! - classes in entity/model files (with validation decorators)
//! - Prisma models
//! - drizzle tables (`pgTable("users", { ... })`)
//!
//! Emits SchemaEntity and SchemaField nodes linked by HAS_FIELD, DEFINES
//! edges from the declaring file, and DEPENDS_ON edges for imports of
//! workspace-internal packages.

use super::helpers::{
    content_hash, file_node, file_node_id, find_block_end, line_at, package_node_id,
    to_pascal_case,
};
use super::{
    is_internal_import, package_of_import, ExtractionError, Extractor, GraphFragment, SourceFile,
};
use crate::identity::{IdExtra, IdGenerator};
use crate::neo4j::models::*;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

const SCHEMA_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "prisma"];
const SCHEMA_PATH_KEYWORDS: &[&str] = &[
    "schema",
    "entity",
    "entities",
    "model",
    "field",
    "validation",
    "validator",
];

// ============================================================================
// Patterns
// ============================================================================

static ZOD_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?const\s+([A-Za-z_]\w*?)(?:Schema)?\s*=\s*z\s*\.\s*object\s*\(\s*\{")
        .expect("valid regex")
});

static INTERFACE_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?interface\s+([A-Z]\w*)(?:<[^>{]*>)?(?:\s+extends\s+[^{]+)?\s*\{")
        .expect("valid regex")
});

static TYPE_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?type\s+([A-Z]\w*)\s*=\s*\{").expect("valid regex")
});

static CLASS_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+([A-Z]\w*)[^{\n]*\{")
        .expect("valid regex")
});

static PRISMA_MODEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*model\s+([A-Za-z_]\w*)\s*\{").expect("valid regex")
});

static DRIZZLE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*(?:export\s+)?const\s+(\w+)\s*=\s*(?:pg|mysql|sqlite)Table\s*\(\s*["'`][^"'`]+["'`]\s*,\s*\{"#)
        .expect("valid regex")
});

static TS_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?:readonly|public|private|protected|declare)\s+)*([A-Za-z_$][\w$]*)(\?)?!?\s*:\s*(.*?)\s*[,;]?\s*$")
        .expect("valid regex")
});

static PRISMA_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_]\w*)\s+([A-Za-z_]\w*)(\[\])?(\?)?(.*)$").expect("valid regex")
});

static ZOD_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"z\s*\.\s*(?:coerce\s*\.\s*)?(\w+)\s*\(").expect("valid regex")
});

static CALL_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*\(").expect("valid regex"));

static MIN_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\.min|@min|@minlength|\.minlength|\.nonempty)\s*\(\s*(\d+)?").expect("valid regex")
});

static MAX_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\.max|@max|@maxlength|\.maxlength|\.length|varchar\s*\([^)]*length)\s*[:(]\s*(\d+)?").expect("valid regex")
});

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s+(?:type\s+)?(?:([\w*{}\s,$]+?)\s+from\s+)?["']([^"']+)["']"#)
        .expect("valid regex")
});

// ============================================================================
// Records
// ============================================================================

/// How an entity was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityStyle {
    Zod,
    Interface,
    TypeAlias,
    Class,
    Prisma,
    Drizzle,
}

impl EntityStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStyle::Zod => "zod",
            EntityStyle::Interface => "interface",
            EntityStyle::TypeAlias => "type",
            EntityStyle::Class => "class",
            EntityStyle::Prisma => "prisma",
            EntityStyle::Drizzle => "drizzle",
        }
    }

    /// How much a match of this style can be trusted to be a data model
    fn confidence(&self) -> f64 {
        match self {
            EntityStyle::Zod | EntityStyle::Prisma | EntityStyle::Drizzle => 0.95,
            EntityStyle::Interface | EntityStyle::TypeAlias => 0.8,
            EntityStyle::Class => 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: String,
    pub nullable: bool,
    pub validation: Vec<String>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityDef {
    pub name: String,
    pub style: EntityStyle,
    pub line: u32,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaImport {
    pub specifier: String,
    pub package: String,
    pub items: Vec<String>,
}

/// Scan output for one schema file
#[derive(Debug, Clone)]
pub struct SchemaFileRecord {
    pub file: SourceFile,
    pub hash: String,
    pub line_count: u32,
    pub entities: Vec<EntityDef>,
    pub imports: Vec<SchemaImport>,
}

// ============================================================================
// Extractor
// ============================================================================

pub struct SchemaExtractor {
    ids: IdGenerator,
    internal_namespaces: Vec<String>,
}

impl SchemaExtractor {
    pub fn new(ids: IdGenerator, internal_namespaces: Vec<String>) -> Self {
        Self {
            ids,
            internal_namespaces,
        }
    }

    /// Find every entity definition in a file
    pub fn parse_entities(&self, file: &SourceFile, content: &str) -> Vec<EntityDef> {
        let mut found: Vec<(usize, EntityDef)> = Vec::new();
        let mut seen = HashSet::new();

        let is_prisma = file.has_extension(&["prisma"]);
        let patterns: Vec<(&Regex, EntityStyle)> = if is_prisma {
            vec![(&*PRISMA_MODEL, EntityStyle::Prisma)]
        } else {
            vec![
                (&*ZOD_ENTITY, EntityStyle::Zod),
                (&*DRIZZLE_TABLE, EntityStyle::Drizzle),
                (&*INTERFACE_ENTITY, EntityStyle::Interface),
                (&*TYPE_ENTITY, EntityStyle::TypeAlias),
                (&*CLASS_ENTITY, EntityStyle::Class),
            ]
        };

        for (pattern, style) in patterns {
            for cap in pattern.captures_iter(content) {
                let (Some(whole), Some(raw_name)) = (cap.get(0), cap.get(1)) else {
                    continue;
                };
                let name = to_pascal_case(raw_name.as_str());
                if name.is_empty() || !seen.insert(name.clone()) {
                    continue;
                }

                let open = whole.end() - 1;
                let end = find_block_end(content, open);
                let body_end = end.saturating_sub(1).max(open + 1);
                let body = content.get(open + 1..body_end).unwrap_or_default();
                let body_line = line_at(content, open);

                let fields = if style == EntityStyle::Prisma {
                    parse_prisma_fields(body, body_line)
                } else {
                    parse_ts_fields(body, body_line, style)
                };

                found.push((
                    whole.start(),
                    EntityDef {
                        name,
                        style,
                        line: line_at(content, whole.start()),
                        fields,
                    },
                ));
            }
        }

        found.sort_by_key(|(offset, _)| *offset);
        found.into_iter().map(|(_, e)| e).collect()
    }

    /// Imports of workspace-internal packages
    pub fn parse_imports(&self, content: &str) -> Vec<SchemaImport> {
        IMPORT
            .captures_iter(content)
            .filter_map(|cap| {
                let specifier = cap.get(2)?.as_str();
                if !is_internal_import(specifier, &self.internal_namespaces) {
                    return None;
                }
                let items = cap
                    .get(1)
                    .map(|m| {
                        m.as_str()
                            .split(|c: char| c == ',' || c == '{' || c == '}')
                            .map(|s| s.trim())
                            .filter(|s| !s.is_empty())
                            .map(|s| s.split_whitespace().last().unwrap_or(s).to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                Some(SchemaImport {
                    specifier: specifier.to_string(),
                    package: package_of_import(specifier).to_string(),
                    items,
                })
            })
            .collect()
    }
}

impl Extractor for SchemaExtractor {
    type Record = SchemaFileRecord;

    fn name(&self) -> &'static str {
        "schema"
    }

    fn node_types(&self) -> &'static [NodeType] {
        &[NodeType::File, NodeType::SchemaEntity, NodeType::SchemaField]
    }

    fn relation_types(&self) -> &'static [RelationType] {
        &[
            RelationType::Defines,
            RelationType::HasField,
            RelationType::DependsOn,
        ]
    }

    fn is_candidate(&self, file: &SourceFile) -> bool {
        file.has_extension(SCHEMA_EXTENSIONS)
            && (file.has_extension(&["prisma"]) || file.path_contains_any(SCHEMA_PATH_KEYWORDS))
    }

    fn scan_file(
        &self,
        file: &SourceFile,
        content: &str,
    ) -> Result<Option<SchemaFileRecord>, ExtractionError> {
        let entities = self.parse_entities(file, content);
        let imports = self.parse_imports(content);
        if entities.is_empty() && imports.is_empty() {
            return Ok(None);
        }
        Ok(Some(SchemaFileRecord {
            file: file.clone(),
            hash: content_hash(content),
            line_count: content.lines().count() as u32,
            entities,
            imports,
        }))
    }

    fn transform_to_graph(&self, records: Vec<SchemaFileRecord>) -> GraphFragment {
        let mut fragment = GraphFragment::default();

        for record in records {
            let file = &record.file;
            let path = file.relative_path.as_str();
            let package = file.package.as_deref();
            let file_id = file_node_id(&self.ids, file);
            fragment.push_node(file_node(&self.ids, file, &record.hash, record.line_count));

            for entity in &record.entities {
                let entity_id =
                    self.ids
                        .node_id(NodeType::SchemaEntity, package, &entity.name, IdExtra::file(path));
                fragment.push_node(GraphNode::new(
                    entity_id.clone(),
                    entity.name.clone(),
                    NodeProperties::SchemaEntity {
                        file_path: path.to_string(),
                        style: entity.style.as_str().to_string(),
                        field_count: entity.fields.len() as u32,
                        line: entity.line,
                    },
                    NodeMetadata::new(
                        Some(path.to_string()),
                        file.package.clone(),
                        entity.style.confidence(),
                    ),
                ));
                fragment.push_relationship(GraphRelationship::new(
                    self.ids
                        .relationship_id(RelationType::Defines, &file_id, &entity_id),
                    RelationType::Defines,
                    file_id.clone(),
                    entity_id.clone(),
                    EdgeProperties::Plain,
                ));

                for field in &entity.fields {
                    let field_id = self.ids.node_id(
                        NodeType::SchemaField,
                        package,
                        &field.name,
                        IdExtra::typed(&entity.name, path),
                    );
                    fragment.push_node(GraphNode::new(
                        field_id.clone(),
                        field.name.clone(),
                        NodeProperties::SchemaField {
                            file_path: path.to_string(),
                            entity: entity.name.clone(),
                            field_type: field.field_type.clone(),
                            nullable: field.nullable,
                            validation: field.validation.clone(),
                            line: field.line,
                        },
                        NodeMetadata::new(
                            Some(path.to_string()),
                            file.package.clone(),
                            entity.style.confidence(),
                        ),
                    ));
                    fragment.push_relationship(GraphRelationship::new(
                        self.ids
                            .relationship_id(RelationType::HasField, &entity_id, &field_id),
                        RelationType::HasField,
                        entity_id.clone(),
                        field_id,
                        EdgeProperties::HasField {
                            field_type: field.field_type.clone(),
                            nullable: field.nullable,
                            validation: field.validation.clone(),
                        },
                    ));
                }
            }

            let mut linked = HashSet::new();
            for import in &record.imports {
                if !linked.insert(import.package.as_str()) {
                    continue;
                }
                let target = package_node_id(&self.ids, &import.package);
                fragment.push_relationship(
                    GraphRelationship::new(
                        self.ids
                            .relationship_id(RelationType::DependsOn, &file_id, &target),
                        RelationType::DependsOn,
                        file_id.clone(),
                        target,
                        EdgeProperties::DependsOn {
                            specifier: import.specifier.clone(),
                            version: None,
                            dev: false,
                        },
                    )
                    .with_metadata(1.0, 0.9),
                );
            }
        }

        fragment
    }
}

// ============================================================================
// Field parsing
// ============================================================================

/// Body lines at brace depth zero, with continuation lines (`.min(3)`)
/// folded into the preceding line
fn top_level_lines(body: &str, body_line: u32) -> Vec<(u32, String)> {
    let mut lines: Vec<(u32, String)> = Vec::new();
    let mut depth = 0i32;

    for (i, raw) in body.lines().enumerate() {
        let line_no = body_line + i as u32;
        let trimmed = raw.trim();
        let at_top = depth <= 0;

        for c in trimmed.chars() {
            match c {
                '{' | '(' | '[' => depth += 1,
                '}' | ')' | ']' => depth -= 1,
                _ => {}
            }
        }

        if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('*') {
            continue;
        }
        if at_top && trimmed.starts_with('.') {
            if let Some(last) = lines.last_mut() {
                last.1.push_str(trimmed);
            }
            continue;
        }
        if at_top {
            lines.push((line_no, trimmed.to_string()));
        } else if let Some(last) = lines.last_mut() {
            // Chained validators often continue inside the call parens
            last.1.push(' ');
            last.1.push_str(trimmed);
        }
    }
    lines
}

fn parse_ts_fields(body: &str, body_line: u32, style: EntityStyle) -> Vec<FieldDef> {
    let mut fields = Vec::new();
    let mut decorators = String::new();

    for (line, text) in top_level_lines(body, body_line) {
        if text.starts_with('@') {
            decorators.push_str(&text);
            decorators.push(' ');
            continue;
        }
        let Some(cap) = TS_FIELD.captures(&text) else {
            decorators.clear();
            continue;
        };
        let name = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        let optional_marker = cap.get(2).is_some();
        let type_expr = cap.get(3).map(|m| m.as_str()).unwrap_or_default();
        let full = format!("{}{}", decorators, type_expr);
        decorators.clear();

        let field_type = match style {
            EntityStyle::Zod => ZOD_TYPE
                .captures(type_expr)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            EntityStyle::Drizzle => CALL_TYPE
                .captures(type_expr)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            _ => ts_type_name(type_expr),
        };

        let nullable = match style {
            EntityStyle::Zod => {
                full.contains(".optional()") || full.contains(".nullable()") || full.contains(".nullish()")
            }
            EntityStyle::Drizzle => !full.contains(".notNull()") && !full.contains(".primaryKey()"),
            _ => {
                optional_marker
                    || type_expr.contains("| null")
                    || type_expr.contains("| undefined")
                    || full.contains("@IsOptional")
            }
        };

        fields.push(FieldDef {
            name: name.to_string(),
            validation: validation_rules(&full, nullable),
            field_type,
            nullable,
            line,
        });
    }
    fields
}

fn parse_prisma_fields(body: &str, body_line: u32) -> Vec<FieldDef> {
    top_level_lines(body, body_line)
        .into_iter()
        .filter(|(_, text)| !text.starts_with("@@"))
        .filter_map(|(line, text)| {
            let cap = PRISMA_FIELD.captures(&text)?;
            let name = cap.get(1)?.as_str().to_string();
            let mut field_type = cap.get(2)?.as_str().to_string();
            if cap.get(3).is_some() {
                field_type.push_str("[]");
            }
            let nullable = cap.get(4).is_some();
            let attributes = cap.get(5).map(|m| m.as_str()).unwrap_or_default();
            Some(FieldDef {
                name,
                validation: validation_rules(attributes, nullable),
                field_type,
                nullable,
                line,
            })
        })
        .collect()
}

/// Base type name of a TypeScript type expression (`string | null` -> `string`)
fn ts_type_name(type_expr: &str) -> String {
    type_expr
        .split('|')
        .map(|t| t.trim())
        .find(|t| !t.is_empty() && *t != "null" && *t != "undefined")
        .map(|t| t.trim_end_matches(';').trim_end_matches(',').to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Validation keywords found in a field definition
fn validation_rules(definition: &str, nullable: bool) -> Vec<String> {
    let lower = definition.to_lowercase();
    let mut rules = vec![if nullable { "optional" } else { "required" }.to_string()];

    if let Some(cap) = MIN_RULE.captures(definition) {
        rules.push(match cap.get(1) {
            Some(n) => format!("min:{}", n.as_str()),
            None => "min".to_string(),
        });
    }
    if let Some(cap) = MAX_RULE.captures(definition) {
        rules.push(match cap.get(1) {
            Some(n) => format!("max:{}", n.as_str()),
            None => "max".to_string(),
        });
    }
    if lower.contains("unique") {
        rules.push("unique".to_string());
    }
    if lower.contains(".email(") || lower.contains("@isemail") {
        rules.push("email".to_string());
    }
    if lower.contains(".url(") || lower.contains("@isurl") {
        rules.push("url".to_string());
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn source(rel: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(format!("/repo/{}", rel)),
            relative_path: rel.to_string(),
            package: Some("@repo/db".to_string()),
        }
    }

    fn extractor() -> SchemaExtractor {
        SchemaExtractor::new(IdGenerator::default(), vec!["@repo/".to_string()])
    }

    const ZOD_SCHEMA: &str = r#"
import { z } from "zod";
import { baseFields } from "@repo/shared/schema";

export const UserSchema = z.object({
  id: z.string().uuid(),
  email: z.string().email().max(255),
  name: z
    .string()
    .min(2)
    .optional(),
  website: z.string().url().nullable(),
  address: z.object({
    street: z.string(),
  }),
});
"#;

    #[test]
    fn test_candidate_filter() {
        let ex = extractor();
        assert!(ex.is_candidate(&source("packages/db/src/schema/user.ts")));
        assert!(ex.is_candidate(&source("prisma/db.prisma")));
        assert!(ex.is_candidate(&source("src/validation/forms.ts")));
        assert!(!ex.is_candidate(&source("src/components/Button.tsx")));
        assert!(!ex.is_candidate(&source("docs/schema.md")));
    }

    #[test]
    fn test_zod_entity_and_fields() {
        let ex = extractor();
        let entities = ex.parse_entities(&source("packages/db/src/schema/user.ts"), ZOD_SCHEMA);
        assert_eq!(entities.len(), 1);
        let user = &entities[0];
        assert_eq!(user.name, "User");
        assert_eq!(user.style, EntityStyle::Zod);

        let names: Vec<&str> = user.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email", "name", "website", "address"]);

        let email = &user.fields[1];
        assert_eq!(email.field_type, "string");
        assert!(!email.nullable);
        assert!(email.validation.contains(&"email".to_string()));
        assert!(email.validation.contains(&"max:255".to_string()));
        assert!(email.validation.contains(&"required".to_string()));

        let name = &user.fields[2];
        assert!(name.nullable);
        assert!(name.validation.contains(&"min:2".to_string()));

        let website = &user.fields[3];
        assert!(website.nullable);
        assert!(website.validation.contains(&"url".to_string()));

        assert_eq!(user.fields[4].field_type, "object");
    }

    #[test]
    fn test_prisma_model() {
        let content = r#"
model Product {
  id        String   @id @default(cuid())
  sku       String   @unique
  price     Decimal
  tags      String[]
  notes     String?
  @@index([sku])
}
"#;
        let ex = extractor();
        let entities = ex.parse_entities(&source("prisma/schema.prisma"), content);
        assert_eq!(entities.len(), 1);
        let product = &entities[0];
        assert_eq!(product.name, "Product");
        assert_eq!(product.fields.len(), 5);
        assert!(product.fields[1].validation.contains(&"unique".to_string()));
        assert_eq!(product.fields[3].field_type, "String[]");
        assert!(product.fields[4].nullable);
    }

    #[test]
    fn test_interface_and_class_entities() {
        let content = r#"
export interface Order extends Base {
  id: string;
  total?: number;
  note: string | null;
  submit(): void;
}

export class Invoice {
  @IsEmail()
  billingEmail: string;

  @IsOptional()
  memo: string;

  constructor() {}
}
"#;
        let ex = extractor();
        let entities = ex.parse_entities(&source("src/entities/order.ts"), content);
        let names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Order", "Invoice"]);

        let order = &entities[0];
        assert_eq!(order.fields.len(), 3);
        assert!(order.fields[1].nullable);
        assert!(order.fields[2].nullable);
        assert_eq!(order.fields[2].field_type, "string");

        let invoice = &entities[1];
        assert_eq!(invoice.fields.len(), 2);
        assert!(invoice.fields[0].validation.contains(&"email".to_string()));
        assert!(invoice.fields[1].nullable);
    }

    #[test]
    fn test_drizzle_table() {
        let content = r#"
export const users = pgTable("users", {
  id: serial("id").primaryKey(),
  email: text("email").notNull().unique(),
  bio: text("bio"),
});
"#;
        let ex = extractor();
        let entities = ex.parse_entities(&source("packages/db/src/schema.ts"), content);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "Users");
        let email = &entities[0].fields[1];
        assert_eq!(email.field_type, "text");
        assert!(!email.nullable);
        assert!(email.validation.contains(&"unique".to_string()));
        assert!(entities[0].fields[2].nullable);
    }

    #[test]
    fn test_internal_imports_only() {
        let imports = extractor().parse_imports(ZOD_SCHEMA);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].package, "@repo/shared");
        assert_eq!(imports[0].items, vec!["baseFields"]);
    }

    #[test]
    fn test_transform_emits_has_field_and_depends_on() {
        let ex = extractor();
        let file = source("packages/db/src/schema/user.ts");
        let record = ex.scan_file(&file, ZOD_SCHEMA).unwrap().unwrap();
        let fragment = ex.transform_to_graph(vec![record]);

        let entity = fragment
            .nodes
            .iter()
            .find(|n| n.node_type() == NodeType::SchemaEntity)
            .unwrap();
        assert_eq!(entity.name, "User");

        let has_field: Vec<_> = fragment
            .relationships
            .iter()
            .filter(|r| r.rel_type == RelationType::HasField)
            .collect();
        assert_eq!(has_field.len(), 5);
        assert!(has_field.iter().all(|r| r.source == entity.id));

        let depends: Vec<_> = fragment
            .relationships
            .iter()
            .filter(|r| r.rel_type == RelationType::DependsOn)
            .collect();
        assert_eq!(depends.len(), 1);
        assert_eq!(
            depends[0].target,
            package_node_id(&IdGenerator::default(), "@repo/shared")
        );

        assert!(fragment
            .relationships
            .iter()
            .any(|r| r.rel_type == RelationType::Defines && r.target == entity.id));
    }

    #[test]
    fn test_file_without_entities_or_imports_is_irrelevant() {
        let ex = extractor();
        let file = source("src/schema/empty.ts");
        assert!(ex.scan_file(&file, "export const x = 1;").unwrap().is_none());
    }
}
