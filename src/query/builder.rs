//! Cypher construction for resolver queries
//!
//! Every query carries the equivalent [`NodeMatcher`] so that stores which
//! cannot run Cypher answer it the same way.

use super::{QueryRequest, QueryType};
use crate::neo4j::client::NODE_LABEL;
use crate::neo4j::models::*;
use std::collections::HashSet;

/// Node types searched by `find_symbol`
pub const SYMBOL_TYPES: &[NodeType] = &[
    NodeType::Function,
    NodeType::Class,
    NodeType::Interface,
    NodeType::Export,
    NodeType::Import,
    NodeType::SchemaField,
    NodeType::Api,
];

/// Lowercase alphanumeric words longer than two characters, first occurrence
/// only. Falls back to the whole lowercase target when there are none.
pub fn tokenize(target: &str) -> Vec<String> {
    let lower = target.trim().to_lowercase();
    let mut seen = HashSet::new();
    let mut terms: Vec<String> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .filter(|w| seen.insert(w.to_string()))
        .map(str::to_string)
        .collect();
    if terms.is_empty() {
        terms.push(lower);
    }
    terms
}

/// The term whose presence in a name ranks a node first: the first term
pub fn primary_term(terms: &[String]) -> String {
    terms.first().cloned().unwrap_or_default()
}

fn term_predicate(fields: &[&str], param: &str) -> String {
    let parts: Vec<String> = fields
        .iter()
        .map(|f| format!("toLower(coalesce(n.{}, '')) CONTAINS ${}", f, param))
        .collect();
    format!("({})", parts.join(" OR "))
}

/// Build the read query for a request
pub fn build_query(request: &QueryRequest, limit: usize) -> CypherQuery {
    let terms = tokenize(&request.target);
    let primary = primary_term(&terms);
    let for_entity = request
        .for_entity
        .as_ref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let expand = request.debug || request.include_related;

    let (fields, node_types) = match request.query_type {
        QueryType::FindEntity => (MatchFields::All, Vec::new()),
        QueryType::FindSymbol => (MatchFields::Name, SYMBOL_TYPES.to_vec()),
        QueryType::FindPattern => (MatchFields::NameOrPath, Vec::new()),
    };
    let searched: &[&str] = match fields {
        MatchFields::All => &["name", "type", "description", "file_path"],
        MatchFields::Name => &["name"],
        MatchFields::NameOrPath => &["name", "file_path"],
    };

    let mut query = CypherQuery::new(String::new());
    let mut clauses = Vec::new();

    let term_clauses: Vec<String> = terms
        .iter()
        .enumerate()
        .map(|(i, term)| {
            let param = format!("term{}", i);
            let clause = term_predicate(searched, &param);
            query.params.insert(param, ParamValue::String(term.clone()));
            clause
        })
        .collect();
    clauses.push(format!("({})", term_clauses.join(" OR ")));

    if !node_types.is_empty() {
        clauses.push("n.type IN $types".to_string());
        query.params.insert(
            "types".to_string(),
            ParamValue::StringList(node_types.iter().map(|t| t.as_str().to_string()).collect()),
        );
    }

    if let Some(entity) = &for_entity {
        clauses.push(
            "(toLower(coalesce(n.entity, '')) = $for_entity \
             OR toLower(coalesce(n.file_path, '')) CONTAINS $for_entity)"
                .to_string(),
        );
        query
            .params
            .insert("for_entity".to_string(), ParamValue::String(entity.clone()));
    }

    let exact = match request.query_type {
        QueryType::FindSymbol => Some(request.target.trim().to_lowercase()),
        _ => None,
    };
    let order = match exact {
        Some(_) => {
            "CASE WHEN toLower(n.name) = $exact THEN 0 \
             WHEN toLower(n.name) CONTAINS $primary THEN 1 ELSE 2 END, n.name"
        }
        None => "CASE WHEN toLower(n.name) CONTAINS $primary THEN 0 ELSE 1 END, n.name",
    };
    if let Some(exact) = &exact {
        query
            .params
            .insert("exact".to_string(), ParamValue::String(exact.clone()));
    }

    let mut text = format!(
        "MATCH (n:{label})\nWHERE {where_clause}\nWITH n\nORDER BY {order}\nLIMIT $limit\n",
        label = NODE_LABEL,
        where_clause = clauses.join("\nAND "),
        order = order,
    );
    if expand {
        text.push_str(&format!("OPTIONAL MATCH (n)-[r]->(m:{})\nRETURN n, r, m", NODE_LABEL));
    } else {
        text.push_str("RETURN n");
    }

    query.text = text;
    query = query
        .param("primary", primary.clone())
        .param("limit", limit as i64)
        .returns("n", ColumnKind::Node);
    if expand {
        query = query
            .returns("r", ColumnKind::Relationship)
            .returns("m", ColumnKind::Node);
    }

    query.with_matcher(NodeMatcher {
        terms,
        primary,
        exact,
        fields,
        node_types,
        for_entity,
        limit,
        expand_relationships: expand,
    })
}
