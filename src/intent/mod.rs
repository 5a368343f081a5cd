//! Intent classification
//!
//! Turns a free-text developer request (English or Chinese) into a typed
//! action, a target entity and field, and a confidence score.

pub mod field_types;
pub mod patterns;

pub use field_types::{infer as infer_field_type, FieldType, FieldTypeInfo};

use crate::extractor::helpers::to_pascal_case;
use patterns::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence of an unrecognized request
pub const UNKNOWN_CONFIDENCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectedAction {
    AddField,
    RemoveField,
    AddValidation,
    CreateApi,
    CreateUi,
    Unknown,
}

impl DetectedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedAction::AddField => "ADD_FIELD",
            DetectedAction::RemoveField => "REMOVE_FIELD",
            DetectedAction::AddValidation => "ADD_VALIDATION",
            DetectedAction::CreateApi => "CREATE_API",
            DetectedAction::CreateUi => "CREATE_UI",
            DetectedAction::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DetectedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of classifying one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedIntent {
    pub detected_action: DetectedAction,
    pub target_entity: Option<String>,
    pub field_name: Option<String>,
    pub confidence: f64,
    pub raw_input: String,
}

/// Pattern-table classifier. Stateless; the tables are compiled once.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> ClassifiedIntent {
        let text = text.trim();
        let target_entity = self.extract_entity(text);
        let field_name = self.extract_field(text);

        let (detected_action, confidence) = match self.detect_action(text) {
            Some((action, base)) => {
                let mut confidence = base;
                if target_entity.is_some() {
                    confidence += 0.1;
                }
                if field_name.is_some() {
                    confidence += 0.1;
                }
                if text.chars().count() > 20 {
                    confidence += 0.05;
                }
                (action, round2(confidence.min(1.0)))
            }
            None => (DetectedAction::Unknown, UNKNOWN_CONFIDENCE),
        };

        tracing::debug!(
            "Classified {:?} as {} (entity={:?}, field={:?}, confidence={})",
            text,
            detected_action,
            target_entity,
            field_name,
            confidence
        );

        ClassifiedIntent {
            detected_action,
            target_entity,
            field_name,
            confidence,
            raw_input: text.to_string(),
        }
    }

    /// First action whose pattern matches, in table order
    pub fn detect_action(&self, text: &str) -> Option<(DetectedAction, f64)> {
        ACTION_PATTERNS
            .iter()
            .find(|row| row.patterns.iter().any(|p| p.is_match(text)))
            .map(|row| (row.action, row.confidence_base))
    }

    /// Target entity, normalized to its canonical PascalCase name
    pub fn extract_entity(&self, text: &str) -> Option<String> {
        let usable = |word: &str| !ENTITY_STOP_WORDS.contains(&word.to_lowercase().as_str());
        let normalize = |word: &str| {
            canonical_entity(word)
                .map(|c| c.to_string())
                .unwrap_or_else(|| to_pascal_case(word))
        };

        // Chinese preposition followed by an identifier or a known synonym
        for m in ZH_PREPOSITION.find_iter(text) {
            let rest = &text[m.end()..];
            if let Some(word) = ZH_PREPOSITION_ENTITY
                .captures(&text[m.start()..])
                .filter(|c| c.get(0).is_some_and(|w| w.start() == 0))
                .and_then(|c| c.get(1))
                .map(|w| w.as_str())
                .filter(|w| usable(*w))
            {
                return Some(normalize(word));
            }
            if let Some(canonical) = entity_prefix(rest) {
                return Some(canonical.to_string());
            }
        }

        let captured = EN_PREPOSITION_ENTITY
            .captures_iter(text)
            .chain(PASCAL_CASE_WORD.captures_iter(text))
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .find(|w| usable(*w));
        if let Some(word) = captured {
            return Some(normalize(word));
        }

        scan_entity(text).map(|c| c.to_string())
    }

    /// Field name: synonym dictionary first, then the "add <x> field" forms
    pub fn extract_field(&self, text: &str) -> Option<String> {
        if let Some(canonical) = scan_field(text) {
            return Some(canonical.to_string());
        }
        EN_FIELD_FALLBACK
            .captures(text)
            .or_else(|| ZH_FIELD_FALLBACK.captures(text))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
