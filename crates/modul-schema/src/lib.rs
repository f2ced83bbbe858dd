//! Modul-Schema: versioned schemas and total-coverage adapters
//!
//! [`adapt`] maps a normalized payload onto the [`DocumentModel`] of the
//! requested variant. It cannot fail: every field the renderer reads gets a
//! value, and anything surprising about the payload comes back as an
//! [`AdapterWarning`] next to the model.

pub mod common;
pub mod deep_learning;
pub mod dimensions;
pub mod fields;
pub mod legacy;
pub mod registry;
pub mod standard;
pub mod timing;

use chrono::NaiveDate;
use fields::{Cursor, Diagnostics};
use modul_core::{
    AdapterWarning, DocumentModel, DocumentVariant, FormInput, Payload, SchoolProfile, TimeBudget,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

pub use registry::{SchemaEntry, SchemaRegistry};

/// Everything the adapter needs besides the payload itself
#[derive(Debug, Clone)]
pub struct AdaptContext {
    /// Date printed in the signature block
    pub today: NaiveDate,
    pub school: SchoolProfile,
    /// Budget the form asked for; enables the time audit
    pub budget: Option<TimeBudget>,
    pub hints: FormHints,
}

impl AdaptContext {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            school: SchoolProfile::default(),
            budget: None,
            hints: FormHints::default(),
        }
    }

    pub fn with_school(mut self, school: SchoolProfile) -> Self {
        self.school = school;
        self
    }

    pub fn with_budget(mut self, budget: TimeBudget) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_form(mut self, form: &FormInput) -> Self {
        self.hints = FormHints::from(form);
        self
    }
}

/// Form values used when the payload leaves an identity field empty
#[derive(Debug, Clone, Default)]
pub struct FormHints {
    pub teacher_name: String,
    pub subject: String,
    pub grade: String,
    pub semester: String,
    pub topic: String,
    pub element: String,
    pub practice: String,
    pub facilities: String,
}

impl From<&FormInput> for FormHints {
    fn from(form: &FormInput) -> Self {
        Self {
            teacher_name: form.teacher_name.trim().to_string(),
            subject: form.subject.trim().to_string(),
            grade: form.grade.trim().to_string(),
            semester: form.semester.trim().to_string(),
            topic: form.topic.trim().to_string(),
            element: form.element.trim().to_string(),
            practice: form.pedagogical_practice.trim().to_string(),
            facilities: form.contextual.facilities.trim().to_string(),
        }
    }
}

/// Adapted model plus non-fatal findings
#[derive(Debug, Clone, Serialize)]
pub struct Adapted {
    pub model: DocumentModel,
    pub warnings: Vec<AdapterWarning>,
}

/// Map a payload onto the requested variant. Never fails.
pub fn adapt(payload: &Payload, variant: DocumentVariant, ctx: &AdaptContext) -> Adapted {
    let mut diag = Diagnostics::new();

    let model = match (variant, payload) {
        (DocumentVariant::Legacy, Payload::Text(text)) => {
            DocumentModel::Legacy(legacy::adapt_text(text, ctx))
        }
        (DocumentVariant::Legacy, Payload::Json(value)) => {
            DocumentModel::Legacy(legacy::adapt_json(value, ctx, &mut diag))
        }
        (_, Payload::Text(_)) => {
            diag.push(AdapterWarning::RootNotObject {
                found: "text".to_string(),
            });
            structured(variant, &fields::NULL, ctx, &mut diag)
        }
        (_, Payload::Json(value)) => {
            let root = if value.is_object() {
                value
            } else {
                diag.push(AdapterWarning::RootNotObject {
                    found: fields::kind(value).to_string(),
                });
                &fields::NULL
            };
            structured(variant, root, ctx, &mut diag)
        }
    };

    let warnings = diag.into_warnings();
    for warning in &warnings {
        warn!(variant = %variant, warning = %warning, "Adapter warning");
    }
    debug!(variant = %variant, warnings = warnings.len(), "Adapted payload");

    Adapted { model, warnings }
}

fn structured(
    variant: DocumentVariant,
    root: &Value,
    ctx: &AdaptContext,
    diag: &mut Diagnostics,
) -> DocumentModel {
    let cursor = Cursor::new(root);
    let declared = cursor.get("schemaVersion").value().as_str();
    if let Some(warning) = SchemaRegistry::new().check(declared, variant) {
        diag.push(warning);
    }

    match variant {
        DocumentVariant::DeepLearning => {
            DocumentModel::DeepLearning(deep_learning::adapt(cursor, ctx, diag))
        }
        DocumentVariant::StandardModule => {
            DocumentModel::StandardModule(standard::adapt(cursor, ctx, diag))
        }
        DocumentVariant::Legacy => DocumentModel::Legacy(legacy::adapt_json(root, ctx, diag)),
    }
}

/// All-default model of a variant, as produced for an unusable payload
pub fn empty_model(variant: DocumentVariant, ctx: &AdaptContext) -> DocumentModel {
    adapt(&Payload::Json(Value::Null), variant, ctx).model
}
