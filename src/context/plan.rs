//! Implementation steps, scope and effort estimation

use crate::extractor::helpers::to_snake_case;
use crate::intent::DetectedAction;
use crate::query::RelatedFiles;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    SchemaEdit,
    DatabaseMigration,
    ApiUpdate,
    UiUpdate,
    TestAddition,
    SchemaReview,
}

impl StepKind {
    /// Layer of the codebase the step touches
    pub fn scope_layer(&self) -> Option<&'static str> {
        match self {
            StepKind::SchemaEdit => Some("database"),
            StepKind::DatabaseMigration => Some("migration"),
            StepKind::ApiUpdate => Some("api"),
            StepKind::UiUpdate => Some("ui"),
            StepKind::TestAddition => Some("tests"),
            StepKind::SchemaReview => None,
        }
    }
}

/// Step kinds for an intent, in execution order
pub fn steps_for(action: DetectedAction) -> &'static [StepKind] {
    use StepKind::*;
    match action {
        DetectedAction::AddField | DetectedAction::RemoveField => {
            &[SchemaEdit, DatabaseMigration, ApiUpdate, UiUpdate, TestAddition]
        }
        DetectedAction::AddValidation => &[SchemaEdit, ApiUpdate, UiUpdate, TestAddition],
        DetectedAction::CreateApi => &[SchemaEdit, ApiUpdate, TestAddition],
        DetectedAction::CreateUi => &[UiUpdate, TestAddition],
        DetectedAction::Unknown => &[SchemaReview],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationStep {
    pub order: u32,
    pub kind: StepKind,
    pub file_path: String,
    pub description: String,
}

/// Where each layer of a change lives
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPaths {
    pub schema: String,
    pub migration: String,
    pub api: String,
    pub ui: String,
    pub test: String,
}

impl TargetPaths {
    /// Resolved files first, conventional monorepo locations otherwise
    pub fn resolve(entity: Option<&str>, schema_file: Option<&str>, files: &RelatedFiles) -> Self {
        let stem = entity
            .map(to_snake_case)
            .unwrap_or_else(|| "entity".to_string());
        let pascal = entity.unwrap_or("Entity");

        let schema = schema_file
            .map(|s| s.to_string())
            .or_else(|| files.schemas.first().cloned())
            .unwrap_or_else(|| format!("packages/db/src/schema/{}.ts", stem));
        let migration = files.migrations.first().cloned().unwrap_or_else(|| {
            match schema.rsplit_once('/') {
                Some((dir, _)) => format!("{}/migrations", dir),
                None => "migrations".to_string(),
            }
        });

        Self {
            migration,
            schema,
            api: files
                .apis
                .first()
                .cloned()
                .unwrap_or_else(|| format!("packages/api/src/router/{}.ts", stem)),
            ui: files
                .ui_components
                .first()
                .cloned()
                .unwrap_or_else(|| format!("apps/web/src/components/{}Form.tsx", pascal)),
            test: files
                .tests
                .first()
                .cloned()
                .unwrap_or_else(|| format!("packages/api/src/__tests__/{}.test.ts", stem)),
        }
    }

    pub fn for_kind(&self, kind: StepKind) -> &str {
        match kind {
            StepKind::SchemaEdit | StepKind::SchemaReview => self.schema.as_str(),
            StepKind::DatabaseMigration => self.migration.as_str(),
            StepKind::ApiUpdate => self.api.as_str(),
            StepKind::UiUpdate => self.ui.as_str(),
            StepKind::TestAddition => self.test.as_str(),
        }
    }
}

fn describe(action: DetectedAction, kind: StepKind, entity: &str, field: &str) -> String {
    use StepKind::*;
    match (action, kind) {
        (DetectedAction::AddField, SchemaEdit) => format!("Add `{}` to the {} schema", field, entity),
        (DetectedAction::AddField, DatabaseMigration) => {
            format!("Generate and apply a migration adding `{}`", field)
        }
        (DetectedAction::AddField, ApiUpdate) => format!(
            "Accept and return `{}` in {} procedures and input validation",
            field, entity
        ),
        (DetectedAction::AddField, UiUpdate) => {
            format!("Show and edit `{}` in {} forms and views", field, entity)
        }
        (DetectedAction::AddField, TestAddition) => {
            format!("Cover `{}` in {} tests", field, entity)
        }
        (DetectedAction::RemoveField, SchemaEdit) => {
            format!("Remove `{}` from the {} schema", field, entity)
        }
        (DetectedAction::RemoveField, DatabaseMigration) => {
            format!("Generate a migration dropping `{}`", field)
        }
        (DetectedAction::RemoveField, ApiUpdate) => {
            format!("Remove `{}` from {} API inputs and outputs", field, entity)
        }
        (DetectedAction::RemoveField, UiUpdate) => {
            format!("Remove `{}` from {} forms and views", field, entity)
        }
        (DetectedAction::RemoveField, TestAddition) => {
            format!("Update {} tests that reference `{}`", entity, field)
        }
        (DetectedAction::AddValidation, SchemaEdit) => {
            format!("Add validation rules for `{}` to the {} schema", field, entity)
        }
        (DetectedAction::AddValidation, ApiUpdate) => {
            format!("Enforce the new rules in {} API input validation", entity)
        }
        (DetectedAction::AddValidation, UiUpdate) => {
            format!("Surface validation errors in {} forms", entity)
        }
        (DetectedAction::AddValidation, TestAddition) => {
            format!("Test valid and invalid {} input", entity)
        }
        (DetectedAction::CreateApi, SchemaEdit) => {
            format!("Define input and output schemas for the new {} endpoint", entity)
        }
        (DetectedAction::CreateApi, ApiUpdate) => {
            format!("Implement the {} endpoint and register it in the router", entity)
        }
        (DetectedAction::CreateApi, TestAddition) => format!("Add endpoint tests for {}", entity),
        (DetectedAction::CreateUi, UiUpdate) => format!("Build the {} component", entity),
        (DetectedAction::CreateUi, TestAddition) => format!("Add component tests for {}", entity),
        (_, SchemaReview) => format!(
            "Review the {} schema and related files to scope the change",
            entity
        ),
        (_, kind) => format!("Update {} ({:?})", entity, kind),
    }
}

/// Ordered steps for an intent
pub fn build_steps(
    action: DetectedAction,
    entity: Option<&str>,
    field: Option<&str>,
    paths: &TargetPaths,
) -> Vec<ImplementationStep> {
    let entity = entity.unwrap_or("the entity");
    let field = field.unwrap_or("the field");
    steps_for(action)
        .iter()
        .enumerate()
        .map(|(i, kind)| ImplementationStep {
            order: i as u32 + 1,
            kind: *kind,
            file_path: paths.for_kind(*kind).to_string(),
            description: describe(action, *kind, entity, field),
        })
        .collect()
}

/// Distinct layers touched by the steps, in step order
pub fn scope_of(steps: &[ImplementationStep]) -> Vec<String> {
    let mut scope: Vec<String> = Vec::new();
    for layer in steps.iter().filter_map(|s| s.kind.scope_layer()) {
        if !scope.iter().any(|s| s == layer) {
            scope.push(layer.to_string());
        }
    }
    scope
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    pub fn from_score(score: f64) -> Self {
        if score <= 2.0 {
            Complexity::Simple
        } else if score <= 4.0 {
            Complexity::Medium
        } else {
            Complexity::Complex
        }
    }

    pub fn base_minutes(&self) -> u32 {
        match self {
            Complexity::Simple => 15,
            Complexity::Medium => 45,
            Complexity::Complex => 120,
        }
    }
}

fn intent_weight(action: DetectedAction) -> f64 {
    match action {
        DetectedAction::AddField | DetectedAction::AddValidation => 1.0,
        DetectedAction::RemoveField => 2.0,
        DetectedAction::CreateUi | DetectedAction::CreateApi => 3.0,
        DetectedAction::Unknown => 4.0,
    }
}

/// Complexity score of a change
pub fn complexity_score(
    action: DetectedAction,
    scope_len: usize,
    validation_count: usize,
    composite_type: bool,
) -> f64 {
    let mut score = intent_weight(action) + 0.5 * scope_len as f64;
    if validation_count > 2 {
        score += 1.0;
    }
    if composite_type {
        score += 1.0;
    }
    score
}

/// Base minutes for the complexity plus ten per scope item beyond the first
pub fn estimate_minutes(complexity: Complexity, scope_len: usize) -> u32 {
    complexity.base_minutes() + 10 * scope_len.saturating_sub(1) as u32
}
