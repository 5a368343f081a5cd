//! Development context synthesis
//!
//! Combines a classified intent with the resolver's view of the target
//! entity into an actionable plan: a field suggestion, ordered
//! implementation steps, likely impacts and an effort estimate.

pub mod plan;

pub use plan::{Complexity, ImplementationStep, StepKind, TargetPaths};

use crate::intent::{infer_field_type, ClassifiedIntent, DetectedAction, FieldType};
use crate::neo4j::models::NodeType;
use crate::query::{EntitySummary, QueryResponse, RelatedFiles};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Suggested definition of a new field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSuggestion {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub nullable: bool,
    pub validation: Vec<String>,
    pub serialization_hint: String,
}

impl FieldSuggestion {
    pub fn for_name(name: &str) -> Self {
        let info = infer_field_type(name);
        Self {
            name: name.to_string(),
            field_type: info.field_type,
            nullable: info.nullable,
            validation: info.validation,
            serialization_hint: info.serialization_hint,
        }
    }
}

/// What the developer asked for, with scope and effort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentRequirement {
    pub intent: DetectedAction,
    pub confidence: f64,
    pub target_entity: Option<String>,
    pub field: Option<String>,
    pub scope: Vec<String>,
    pub complexity: Complexity,
    pub complexity_score: f64,
    pub estimated_effort_minutes: u32,
    pub raw_input: String,
}

/// Full answer to an `ask` request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevelopmentContext {
    pub requirement: DevelopmentRequirement,
    pub entity: Option<EntitySummary>,
    pub related_files: RelatedFiles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_suggestion: Option<FieldSuggestion>,
    pub implementation_steps: Vec<ImplementationStep>,
    pub potential_impacts: Vec<String>,
}

impl DevelopmentContext {
    /// Human-readable rendering for the terminal
    pub fn to_text(&self) -> String {
        let req = &self.requirement;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} {}{} (confidence {:.2})",
            req.intent,
            req.target_entity.as_deref().unwrap_or("<no entity>"),
            req.field
                .as_ref()
                .map(|f| format!(".{}", f))
                .unwrap_or_default(),
            req.confidence
        );
        let complexity = match req.complexity {
            Complexity::Simple => "simple",
            Complexity::Medium => "medium",
            Complexity::Complex => "complex",
        };
        let _ = writeln!(
            out,
            "Complexity: {} ({:.1}), about {} min; scope: {}",
            complexity,
            req.complexity_score,
            req.estimated_effort_minutes,
            req.scope.join(", ")
        );

        if let Some(entity) = &self.entity {
            let _ = writeln!(out, "Entity: {} [{}] {}", entity.name, entity.node_type, entity.file_path);
        }
        if let Some(field) = &self.field_suggestion {
            let _ = writeln!(
                out,
                "\nSuggested field: {}: {}{}",
                field.name,
                field.field_type,
                if field.nullable { " (nullable)" } else { "" }
            );
            if !field.validation.is_empty() {
                let _ = writeln!(out, "  validation: {}", field.validation.join(", "));
            }
        }

        let _ = writeln!(out, "\nSteps:");
        for step in &self.implementation_steps {
            let _ = writeln!(out, "  {}. {} ({})", step.order, step.description, step.file_path);
        }

        if !self.potential_impacts.is_empty() {
            let _ = writeln!(out, "\nImpacts:");
            for impact in &self.potential_impacts {
                let _ = writeln!(out, "  - {}", impact);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContextSynthesizer;

impl ContextSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Build the development context. `resolved` is the resolver's answer
    /// for the target entity, when one was looked up.
    pub fn synthesize(
        &self,
        intent: &ClassifiedIntent,
        resolved: Option<&QueryResponse>,
    ) -> DevelopmentContext {
        let results = resolved
            .filter(|r| r.success)
            .and_then(|r| r.results.as_ref());
        let entity_summary = results.and_then(|r| r.primary_target.clone());
        let related_files = results
            .map(|r| r.related_files.clone())
            .unwrap_or_default();

        let entity_name = intent
            .target_entity
            .clone()
            .or_else(|| entity_summary.as_ref().map(|e| e.name.clone()));
        let schema_file = entity_summary
            .as_ref()
            .filter(|e| e.node_type == NodeType::SchemaEntity)
            .map(|e| e.file_path.as_str());

        let field_suggestion = match (intent.detected_action, &intent.field_name) {
            (DetectedAction::AddField, Some(name)) => Some(FieldSuggestion::for_name(name)),
            _ => None,
        };

        let paths = TargetPaths::resolve(entity_name.as_deref(), schema_file, &related_files);
        let steps = plan::build_steps(
            intent.detected_action,
            entity_name.as_deref(),
            intent.field_name.as_deref(),
            &paths,
        );
        let scope = plan::scope_of(&steps);

        let (validation_count, composite) = field_suggestion
            .as_ref()
            .map(|f| (f.validation.len(), f.field_type.is_composite()))
            .unwrap_or((0, false));
        let complexity_score =
            plan::complexity_score(intent.detected_action, scope.len(), validation_count, composite);
        let complexity = Complexity::from_score(complexity_score);
        let estimated_effort_minutes = plan::estimate_minutes(complexity, scope.len());

        let potential_impacts = impacts(
            intent.detected_action,
            entity_name.as_deref(),
            intent.field_name.as_deref(),
            field_suggestion.as_ref(),
        );

        tracing::debug!(
            "Synthesized {} plan for {:?}: {} steps, {:?} ({} min)",
            intent.detected_action,
            entity_name,
            steps.len(),
            complexity,
            estimated_effort_minutes
        );

        DevelopmentContext {
            requirement: DevelopmentRequirement {
                intent: intent.detected_action,
                confidence: intent.confidence,
                target_entity: entity_name,
                field: intent.field_name.clone(),
                scope,
                complexity,
                complexity_score,
                estimated_effort_minutes,
                raw_input: intent.raw_input.clone(),
            },
            entity: entity_summary,
            related_files,
            field_suggestion,
            implementation_steps: steps,
            potential_impacts,
        }
    }
}

/// Heuristic impact notes for an intent, plus entity-specific add-ons
fn impacts(
    action: DetectedAction,
    entity: Option<&str>,
    field: Option<&str>,
    suggestion: Option<&FieldSuggestion>,
) -> Vec<String> {
    let field_label = field.unwrap_or("the field");
    let mut out: Vec<String> = match action {
        DetectedAction::AddField => vec![
            "Requires a database migration".to_string(),
            "API input and output types change".to_string(),
            "Frontend forms and displays must be updated".to_string(),
        ],
        DetectedAction::RemoveField => vec![
            "Requires a database migration that drops data".to_string(),
            format!("Clients reading `{}` will break", field_label),
            "Frontend forms and displays must be updated".to_string(),
        ],
        DetectedAction::AddValidation => vec![
            "Existing records may violate the new rules".to_string(),
            "API clients may start receiving validation errors".to_string(),
        ],
        DetectedAction::CreateApi => vec![
            "The new endpoint must be registered in the router".to_string(),
            "Authorization rules must cover the new endpoint".to_string(),
        ],
        DetectedAction::CreateUi => vec![
            "The new component should follow the existing design system".to_string(),
            "Routing or navigation may need updating".to_string(),
        ],
        DetectedAction::Unknown => vec![
            "Impact unclear; review the entity and its related files first".to_string(),
        ],
    };

    if let Some(s) = suggestion.filter(|s| !s.nullable) {
        out.push(format!(
            "Existing {} rows need a default or backfill for the non-nullable `{}`",
            entity.unwrap_or("entity"),
            s.name
        ));
    }

    match entity {
        Some("User") => out.push("Touches User: check authentication and session handling".into()),
        Some(e @ ("Order" | "Payment")) => {
            out.push(format!("Touches {}: check billing and payment flows", e))
        }
        Some("Product") => out.push("Touches Product: check catalog listings and search".into()),
        _ => {}
    }
    out
}
