//! Deterministic node and relationship identities
//!
//! An id is `<namespace>:<name>:<hash>`. The hash covers the canonical key
//! `kind|package|name|type|file_path`, so two symbols with the same name in
//! different files or packages never share an id. Ids never depend on
//! properties, metadata, or extraction time.

use crate::neo4j::models::{NodeType, RelationType};
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use std::str::FromStr;
use twox_hash::XxHash64;

/// Maximum length of the sanitized name segment
const MAX_NAME_SEGMENT: usize = 40;

/// Length of a legacy hash segment
const LEGACY_HASH_LEN: usize = 8;

/// Length of a base-36 encoded u64 (36^13 > 2^64)
const XXHASH_HASH_LEN: usize = 13;

/// Hashing scheme used for the hash segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    /// Two 32-bit rolling hashes packed into one 32-bit value.
    /// Kept for graphs persisted by earlier tooling.
    Legacy,
    /// XXH64 with seed 0
    #[default]
    Xxhash64,
}

impl FromStr for IdScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(IdScheme::Legacy),
            "xxhash64" | "xxhash" => Ok(IdScheme::Xxhash64),
            other => Err(format!("unknown id scheme: {}", other)),
        }
    }
}

/// Optional disambiguating parts of a node key
#[derive(Debug, Clone, Copy, Default)]
pub struct IdExtra<'a> {
    /// Sub-type, e.g. the owning entity of a field or an HTTP method
    pub type_hint: Option<&'a str>,
    pub file_path: Option<&'a str>,
}

impl<'a> IdExtra<'a> {
    pub fn file(file_path: &'a str) -> Self {
        Self {
            type_hint: None,
            file_path: Some(file_path),
        }
    }

    pub fn typed(type_hint: &'a str, file_path: &'a str) -> Self {
        Self {
            type_hint: Some(type_hint),
            file_path: Some(file_path),
        }
    }
}

/// Stateless id generator
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator {
    scheme: IdScheme,
}

impl IdGenerator {
    pub fn new(scheme: IdScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> IdScheme {
        self.scheme
    }

    /// Id of a node identified by `(kind, package, name, type, file_path)`
    pub fn node_id(
        &self,
        kind: NodeType,
        package: Option<&str>,
        name: &str,
        extra: IdExtra<'_>,
    ) -> String {
        let key = [
            kind.as_str(),
            package.unwrap_or(""),
            name,
            extra.type_hint.unwrap_or(""),
            extra.file_path.unwrap_or(""),
        ]
        .join("|");
        format!(
            "{}:{}:{}",
            kind.namespace(),
            sanitize_name(name),
            self.hash(&key)
        )
    }

    /// Id of a relationship identified by `(type, source, target)`
    pub fn relationship_id(&self, rel_type: RelationType, source: &str, target: &str) -> String {
        let key = [rel_type.as_str(), source, target].join("|");
        format!(
            "rel:{}:{}",
            rel_type.as_str().to_ascii_lowercase(),
            self.hash(&key)
        )
    }

    fn hash(&self, key: &str) -> String {
        match self.scheme {
            IdScheme::Legacy => legacy_hash(key),
            IdScheme::Xxhash64 => {
                let mut hasher = XxHash64::with_seed(0);
                hasher.write(key.as_bytes());
                let encoded = to_base36(hasher.finish());
                format!("{:0>width$}", encoded, width = XXHASH_HASH_LEN)
            }
        }
    }
}

/// Lowercase, collapse non-alphanumerics to `_`, trim, cap length
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_sep = true;
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_sep = false;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.chars().count() > MAX_NAME_SEGMENT {
        out = out.chars().take(MAX_NAME_SEGMENT).collect();
        while out.ends_with('_') {
            out.pop();
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

// ============================================================================
// Legacy two-hash scheme
// ============================================================================

/// Two rolling hashes over UTF-16 code units with 32-bit wrapping arithmetic:
/// `h1 = (h1 << 5) - h1 + c` and `h2 = ((h2 << 3) + h2) ^ c`, packed as
/// `(|h1| << 16) | (|h2| & 0xFFFF)`, base-36 encoded and cut to 8 chars.
fn legacy_hash(key: &str) -> String {
    let mut h1: i32 = 0;
    let mut h2: i32 = 0;
    for unit in key.encode_utf16() {
        let c = unit as i32;
        h1 = (h1 << 5).wrapping_sub(h1).wrapping_add(c);
        h2 = (h2 << 3).wrapping_add(h2) ^ c;
    }
    let combined: i32 = (h1.wrapping_abs() << 16) | (h2.wrapping_abs() & 0xFFFF);
    let encoded = if combined < 0 {
        format!("-{}", to_base36(combined.unsigned_abs() as u64))
    } else {
        to_base36(combined as u64)
    };
    encoded.chars().take(LEGACY_HASH_LEN).collect()
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(XXHASH_HASH_LEN);
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_node_id_is_deterministic() {
        let gen = IdGenerator::default();
        let a = gen.node_id(
            NodeType::SchemaEntity,
            Some("@repo/db"),
            "User",
            IdExtra::file("packages/db/src/schema/user.ts"),
        );
        let b = gen.node_id(
            NodeType::SchemaEntity,
            Some("@repo/db"),
            "User",
            IdExtra::file("packages/db/src/schema/user.ts"),
        );
        assert_eq!(a, b);
        assert!(a.starts_with("schema:user:"));
    }

    #[test]
    fn test_node_id_differs_by_file_and_package() {
        let gen = IdGenerator::default();
        let base = gen.node_id(NodeType::Function, None, "handler", IdExtra::file("a.ts"));
        let other_file = gen.node_id(NodeType::Function, None, "handler", IdExtra::file("b.ts"));
        let other_pkg = gen.node_id(
            NodeType::Function,
            Some("@repo/api"),
            "handler",
            IdExtra::file("a.ts"),
        );
        assert_ne!(base, other_file);
        assert_ne!(base, other_pkg);
    }

    #[test]
    fn test_empty_segments_keep_positions() {
        let gen = IdGenerator::default();
        // "a|" + "" vs "" + "|a" must not collapse to the same key
        let a = gen.node_id(NodeType::File, Some("a"), "x", IdExtra::default());
        let b = gen.node_id(
            NodeType::File,
            None,
            "x",
            IdExtra {
                type_hint: Some("a"),
                file_path: None,
            },
        );
        assert_ne!(a, b);
    }

    #[test]
    fn test_namespaces_per_kind() {
        let gen = IdGenerator::default();
        let cases = [
            (NodeType::Package, "package:"),
            (NodeType::File, "file:"),
            (NodeType::Document, "file:"),
            (NodeType::Api, "api:"),
            (NodeType::SchemaField, "schema:"),
            (NodeType::Import, "import:"),
            (NodeType::Export, "export:"),
            (NodeType::Class, "symbol:"),
        ];
        for (kind, prefix) in cases {
            let id = gen.node_id(kind, None, "thing", IdExtra::default());
            assert!(id.starts_with(prefix), "{} should start with {}", id, prefix);
        }
    }

    #[test]
    fn test_relationship_id() {
        let gen = IdGenerator::default();
        let a = gen.relationship_id(RelationType::HasField, "schema:user:1", "schema:email:2");
        let b = gen.relationship_id(RelationType::HasField, "schema:user:1", "schema:email:2");
        let reversed =
            gen.relationship_id(RelationType::HasField, "schema:email:2", "schema:user:1");
        assert_eq!(a, b);
        assert_ne!(a, reversed);
        assert!(a.starts_with("rel:has_field:"));
    }

    #[test]
    fn test_xxhash_segment_has_fixed_length() {
        let gen = IdGenerator::new(IdScheme::Xxhash64);
        for name in ["a", "User", "something_much_longer_than_usual"] {
            let id = gen.node_id(NodeType::Export, None, name, IdExtra::default());
            let hash = id.rsplit(':').next().unwrap();
            assert_eq!(hash.len(), XXHASH_HASH_LEN);
        }
    }

    #[test]
    fn test_no_collisions_over_ten_thousand_symbols() {
        for scheme in [IdScheme::Xxhash64, IdScheme::Legacy] {
            let gen = IdGenerator::new(scheme);
            let mut seen = HashSet::new();
            for file in 0..100 {
                let path = format!("packages/pkg{}/src/module_{}.ts", file % 7, file);
                for symbol in 0..100 {
                    let id = gen.node_id(
                        NodeType::Function,
                        None,
                        &format!("symbol{}", symbol),
                        IdExtra::file(&path),
                    );
                    assert!(seen.insert(id), "collision with scheme {:?}", scheme);
                }
            }
            assert_eq!(seen.len(), 10_000);
        }
    }

    #[test]
    fn test_legacy_hash_known_values() {
        // h1 = 97, h2 = 97 -> (97 << 16) | 97 = 6357089
        assert_eq!(legacy_hash("a"), to_base36(6_357_089));
        assert!(legacy_hash("a much longer canonical key|with|segments").len() <= LEGACY_HASH_LEN);
        assert_eq!(legacy_hash("same"), legacy_hash("same"));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("UserProfile"), "userprofile");
        assert_eq!(sanitize_name("@repo/db"), "repo_db");
        assert_eq!(sanitize_name("src/schema/user.ts"), "src_schema_user_ts");
        assert_eq!(sanitize_name("用户"), "用户");
        assert_eq!(sanitize_name("***"), "_");
        assert_eq!(sanitize_name(&"x".repeat(100)).len(), MAX_NAME_SEGMENT);
    }

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("legacy".parse::<IdScheme>().unwrap(), IdScheme::Legacy);
        assert_eq!("XXHASH64".parse::<IdScheme>().unwrap(), IdScheme::Xxhash64);
        assert!("md5".parse::<IdScheme>().is_err());
    }
}
