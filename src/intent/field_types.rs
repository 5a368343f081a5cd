//! Field-type inference from field names

use super::patterns::canonical_field;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    String,
    Text,
    Number,
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Email,
    Phone,
    Url,
    Enum,
    Reference,
    Array,
    Json,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "STRING",
            FieldType::Text => "TEXT",
            FieldType::Number => "NUMBER",
            FieldType::Integer => "INTEGER",
            FieldType::Decimal => "DECIMAL",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Date => "DATE",
            FieldType::DateTime => "DATE_TIME",
            FieldType::Email => "EMAIL",
            FieldType::Phone => "PHONE",
            FieldType::Url => "URL",
            FieldType::Enum => "ENUM",
            FieldType::Reference => "REFERENCE",
            FieldType::Array => "ARRAY",
            FieldType::Json => "JSON",
        }
    }

    /// Reference and array fields cost more to add
    pub fn is_composite(&self) -> bool {
        matches!(self, FieldType::Reference | FieldType::Array)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inferred shape of a new field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTypeInfo {
    pub field_type: FieldType,
    pub nullable: bool,
    pub validation: Vec<String>,
    pub serialization_hint: String,
}

impl FieldTypeInfo {
    fn new(field_type: FieldType, nullable: bool, validation: &[&str], hint: &str) -> Self {
        Self {
            field_type,
            nullable,
            validation: validation.iter().map(|v| v.to_string()).collect(),
            serialization_hint: hint.to_string(),
        }
    }
}

fn exact(compact: &str) -> Option<FieldTypeInfo> {
    let info = match compact {
        "birthday" | "birthdate" | "dob" | "dateofbirth" => FieldTypeInfo::new(
            FieldType::Date,
            true,
            &["date_format"],
            "ISO 8601 date (YYYY-MM-DD)",
        ),
        "age" => FieldTypeInfo::new(FieldType::Number, true, &["numeric_format", "min:0"], "integer"),
        "email" => FieldTypeInfo::new(FieldType::Email, false, &["email_format"], "lowercase string"),
        "phone" | "mobile" | "phonenumber" => {
            FieldTypeInfo::new(FieldType::Phone, true, &["phone_format"], "E.164 string")
        }
        "url" | "website" | "homepage" | "avatar" => {
            FieldTypeInfo::new(FieldType::Url, true, &["url_format"], "absolute URL string")
        }
        "price" | "amount" | "total" | "balance" => FieldTypeInfo::new(
            FieldType::Decimal,
            false,
            &["numeric_format", "min:0"],
            "decimal string",
        ),
        "quantity" | "stock" => {
            FieldTypeInfo::new(FieldType::Integer, false, &["numeric_format", "min:0"], "integer")
        }
        "password" => FieldTypeInfo::new(
            FieldType::String,
            false,
            &["min:8"],
            "hashed string, never serialized",
        ),
        "description" | "content" | "bio" | "notes" | "address" => {
            FieldTypeInfo::new(FieldType::Text, true, &[], "string")
        }
        "status" => FieldTypeInfo::new(FieldType::Enum, false, &["enum_values"], "string enum"),
        "gender" | "role" => FieldTypeInfo::new(FieldType::Enum, true, &["enum_values"], "string enum"),
        "name" | "title" => FieldTypeInfo::new(FieldType::String, false, &["max:255"], "string"),
        "nickname" => FieldTypeInfo::new(FieldType::String, true, &["max:255"], "string"),
        "tags" => FieldTypeInfo::new(FieldType::Array, true, &[], "array of strings"),
        "metadata" | "settings" | "preferences" => {
            FieldTypeInfo::new(FieldType::Json, true, &[], "JSON object")
        }
        _ => return None,
    };
    Some(info)
}

/// `name` ends with `suffix` as a snake_case or camelCase segment
fn has_suffix(name: &str, suffix: &str) -> bool {
    if name.len() <= suffix.len() {
        return false;
    }
    let lower = name.to_lowercase();
    if lower.ends_with(&format!("_{}", suffix)) {
        return true;
    }
    let mut chars = suffix.chars();
    let camel: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => return false,
    };
    name.ends_with(&camel)
}

/// `name` starts with `prefix` as a snake_case or camelCase segment
fn has_prefix(name: &str, prefix: &str) -> bool {
    let lower = name.to_lowercase();
    if lower.starts_with(&format!("{}_", prefix)) {
        return true;
    }
    name.starts_with(prefix)
        && name[prefix.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase())
}

/// Infer type, nullability, validation and serialization for a field name.
///
/// Chinese names are canonicalized first. Exact names are checked before
/// prefix and suffix rules; anything else is a nullable string.
pub fn infer(name: &str) -> FieldTypeInfo {
    let name = canonical_field(name).unwrap_or(name).trim();
    let compact: String = name
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .collect();

    if let Some(info) = exact(&compact) {
        return info;
    }

    if ["is", "has", "can", "should"].iter().any(|p| has_prefix(name, p)) {
        return FieldTypeInfo::new(FieldType::Boolean, false, &[], "boolean");
    }

    if has_suffix(name, "ids") {
        return FieldTypeInfo::new(FieldType::Array, true, &["reference_exists"], "array of ids");
    }
    if has_suffix(name, "id") {
        return FieldTypeInfo::new(
            FieldType::Reference,
            false,
            &["reference_exists"],
            "foreign key id",
        );
    }
    if has_suffix(name, "at") {
        return FieldTypeInfo::new(
            FieldType::DateTime,
            true,
            &["date_format"],
            "ISO 8601 timestamp",
        );
    }
    if has_suffix(name, "date") {
        return FieldTypeInfo::new(
            FieldType::Date,
            true,
            &["date_format"],
            "ISO 8601 date (YYYY-MM-DD)",
        );
    }
    if has_suffix(name, "email") {
        return FieldTypeInfo::new(FieldType::Email, true, &["email_format"], "lowercase string");
    }
    if has_suffix(name, "url") {
        return FieldTypeInfo::new(FieldType::Url, true, &["url_format"], "absolute URL string");
    }
    if has_suffix(name, "count") {
        return FieldTypeInfo::new(
            FieldType::Integer,
            false,
            &["numeric_format", "min:0"],
            "integer",
        );
    }

    FieldTypeInfo::new(FieldType::String, true, &[], "string")
}
