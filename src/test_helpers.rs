//! Test helper factories
//!
//! Provides convenience functions for creating graph nodes and small seeded
//! graphs with sensible defaults.
#![allow(dead_code)]

use crate::identity::{IdExtra, IdGenerator};
use crate::neo4j::models::*;

const USER_SCHEMA: &str = "packages/db/src/schema/user.ts";
const POST_SCHEMA: &str = "packages/db/src/schema/post.ts";
const USER_ROUTER: &str = "packages/api/src/router/user.ts";

fn ids() -> IdGenerator {
    IdGenerator::default()
}

fn metadata(path: &str) -> NodeMetadata {
    NodeMetadata::new(Some(path.to_string()), Some("@repo/db".to_string()), 1.0)
}

// ============================================================================
// Node factories
// ============================================================================

/// A zod SchemaEntity node with no fields
pub fn entity_node(name: &str, path: &str) -> GraphNode {
    GraphNode::new(
        ids().node_id(NodeType::SchemaEntity, Some("@repo/db"), name, IdExtra::file(path)),
        name,
        NodeProperties::SchemaEntity {
            file_path: path.to_string(),
            style: "zod".to_string(),
            field_count: 0,
            line: 1,
        },
        metadata(path),
    )
}

/// A code symbol of the given type. Types without a code shape
/// (files, packages, documents) fall back to a function node.
pub fn symbol_node(node_type: NodeType, name: &str, path: &str) -> GraphNode {
    let file_path = path.to_string();
    let properties = match node_type {
        NodeType::Interface => NodeProperties::Interface {
            file_path,
            line_start: 1,
            line_end: 5,
            is_exported: true,
            extends: Vec::new(),
        },
        NodeType::Class => NodeProperties::Class {
            file_path,
            line_start: 1,
            line_end: 20,
            is_exported: true,
            extends: None,
            implements: Vec::new(),
        },
        NodeType::SchemaEntity => {
            return entity_node(name, path);
        }
        NodeType::SchemaField => NodeProperties::SchemaField {
            file_path,
            entity: "User".to_string(),
            field_type: "string".to_string(),
            nullable: false,
            validation: Vec::new(),
            line: 2,
        },
        NodeType::Api => NodeProperties::Api {
            file_path,
            router: Some("user".to_string()),
            method: "query".to_string(),
            route: None,
            input_schema: None,
            line: 3,
        },
        NodeType::Import => NodeProperties::Import {
            file_path,
            source: "@repo/db".to_string(),
            items: vec![name.to_string()],
            is_internal: true,
            line: 1,
        },
        NodeType::Export => NodeProperties::Export {
            file_path,
            is_default: false,
            line: 1,
        },
        _ => NodeProperties::Function {
            file_path,
            line_start: 1,
            line_end: 10,
            is_async: false,
            is_exported: true,
            params: Vec::new(),
        },
    };
    GraphNode::new(
        ids().node_id(node_type, None, name, IdExtra::file(path)),
        name,
        properties,
        metadata(path),
    )
}

fn file_node(path: &str) -> GraphNode {
    GraphNode::new(
        ids().node_id(NodeType::File, None, path, IdExtra::default()),
        path,
        NodeProperties::File {
            path: path.to_string(),
            language: "typescript".to_string(),
            hash: "0".repeat(64),
            line_count: 20,
        },
        metadata(path),
    )
}

fn field_node(entity: &str, name: &str, field_type: &str, nullable: bool, path: &str) -> GraphNode {
    GraphNode::new(
        ids().node_id(
            NodeType::SchemaField,
            Some("@repo/db"),
            name,
            IdExtra::typed(entity, path),
        ),
        name,
        NodeProperties::SchemaField {
            file_path: path.to_string(),
            entity: entity.to_string(),
            field_type: field_type.to_string(),
            nullable,
            validation: Vec::new(),
            line: 3,
        },
        metadata(path),
    )
}

fn edge(rel_type: RelationType, source: &GraphNode, target: &GraphNode) -> GraphRelationship {
    let properties = match (&rel_type, &target.properties) {
        (
            RelationType::HasField,
            NodeProperties::SchemaField {
                field_type,
                nullable,
                validation,
                ..
            },
        ) => EdgeProperties::HasField {
            field_type: field_type.clone(),
            nullable: *nullable,
            validation: validation.clone(),
        },
        _ => EdgeProperties::Plain,
    };
    GraphRelationship::new(
        ids().relationship_id(rel_type, &source.id, &target.id),
        rel_type,
        source.id.clone(),
        target.id.clone(),
        properties,
    )
}

// ============================================================================
// Seeded graphs
// ============================================================================

/// A small monorepo graph: `User` (id, name, email) and `Post` (title,
/// authorId) schema entities with their files, plus one `user.byId`
/// procedure in the API router.
pub fn user_schema_graph() -> (Vec<GraphNode>, Vec<GraphRelationship>) {
    let mut nodes = Vec::new();
    let mut rels = Vec::new();

    for (entity_name, path, fields) in [
        (
            "User",
            USER_SCHEMA,
            vec![("id", "string", false), ("name", "string", true), ("email", "string", false)],
        ),
        (
            "Post",
            POST_SCHEMA,
            vec![("title", "string", false), ("authorId", "string", false)],
        ),
    ] {
        let file = file_node(path);
        let mut entity = entity_node(entity_name, path);
        if let NodeProperties::SchemaEntity { field_count, .. } = &mut entity.properties {
            *field_count = fields.len() as u32;
        }
        rels.push(edge(RelationType::Defines, &file, &entity));
        for (name, field_type, nullable) in fields {
            let field = field_node(entity_name, name, field_type, nullable, path);
            rels.push(edge(RelationType::HasField, &entity, &field));
            nodes.push(field);
        }
        nodes.push(file);
        nodes.push(entity);
    }

    let router = file_node(USER_ROUTER);
    let by_id = symbol_node(NodeType::Api, "user.byId", USER_ROUTER);
    rels.push(edge(RelationType::Contains, &router, &by_id));
    nodes.push(router);
    nodes.push(by_id);

    (nodes, rels)
}
