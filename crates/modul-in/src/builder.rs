//! Request Builder: FormInput + variant → GenerationRequest
//!
//! Validation runs first and is the only fallible step: numeric fields must
//! be positive integers (optionally followed by a unit word) and every
//! catalog selection must resolve. The prompt itself is a pure handlebars
//! render over a flat data object in which the derived time figures are
//! computed exactly once.

use crate::catalog::{Catalog, Dimension, Practice};
use chrono::Datelike;
use lazy_static::lazy_static;
use modul_core::{
    DocumentVariant, EscapeMode, FormInput, GenerationRequest, ModulError, SchoolProfile,
    TemplateRenderer, TimeBudget,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

lazy_static! {
    /// "2", "45 menit", "2 JP", "3 Pertemuan"
    static ref NUMERIC_FIELD: Regex =
        Regex::new(r"(?i)^\s*(\d{1,6})\s*(jp|jam|menit|mnt|pertemuan)?\.?\s*$").unwrap();
}

static PROMPTS: Lazy<Result<TemplateRenderer, String>> = Lazy::new(|| {
    TemplateRenderer::from_yaml(include_str!("../prompts/prompts.yaml"), EscapeMode::None)
});

/// School-level values the prompt states but the form does not collect
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub school: String,
    pub principal: String,
    pub year: String,
}

impl PromptContext {
    pub fn new(school: &SchoolProfile, year: i32) -> Self {
        Self {
            school: school.name.clone(),
            principal: school.principal_name.clone(),
            year: year.to_string(),
        }
    }
}

impl Default for PromptContext {
    fn default() -> Self {
        Self::new(&SchoolProfile::default(), chrono::Local::now().year())
    }
}

/// Form that passed validation, with catalog entries resolved
#[derive(Debug, Clone)]
pub struct ValidatedForm<'a> {
    pub form: &'a FormInput,
    pub budget: TimeBudget,
    pub dimensions: Vec<&'a Dimension>,
    pub practice: Option<&'a Practice>,
}

pub struct RequestBuilder<'a> {
    catalog: &'a Catalog,
    context: PromptContext,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(catalog: &'a Catalog, context: PromptContext) -> Self {
        Self { catalog, context }
    }

    pub fn validate<'f>(
        &self,
        form: &'f FormInput,
        variant: DocumentVariant,
    ) -> Result<ValidatedForm<'f>, ModulError>
    where
        'a: 'f,
    {
        for (field, value) in [
            ("teacherName", &form.teacher_name),
            ("subject", &form.subject),
            ("grade", &form.grade),
            ("topic", &form.topic),
        ] {
            if value.trim().is_empty() {
                return Err(ModulError::invalid_input(field, "wajib diisi"));
            }
        }

        let budget = time_budget(form)?;

        let mut dimensions: Vec<&'f Dimension> = Vec::new();
        for name in form.dimensions.iter().filter(|n| !n.trim().is_empty()) {
            let dimension = self.catalog.dimension(name).ok_or_else(|| {
                ModulError::invalid_input(
                    "dimensions",
                    format!("'{}' bukan dimensi profil lulusan yang dikenal", name),
                )
            })?;
            if !dimensions.iter().any(|d| d.name == dimension.name) {
                dimensions.push(dimension);
            }
        }

        let practice = match form.pedagogical_practice.trim() {
            "" if variant == DocumentVariant::Legacy => None,
            "" => {
                return Err(ModulError::invalid_input(
                    "pedagogicalPractice",
                    "wajib dipilih untuk modul terstruktur",
                ))
            }
            name => Some(self.catalog.practice(name).ok_or_else(|| {
                ModulError::invalid_input(
                    "pedagogicalPractice",
                    format!("'{}' bukan praktik pedagogis yang dikenal", name),
                )
            })?),
        };

        Ok(ValidatedForm {
            form,
            budget,
            dimensions,
            practice,
        })
    }

    pub fn build(
        &self,
        form: &FormInput,
        variant: DocumentVariant,
    ) -> Result<GenerationRequest, ModulError> {
        let validated = self.validate(form, variant)?;
        let data = self.prompt_data(&validated, variant);

        let renderer = PROMPTS
            .as_ref()
            .map_err(|e| ModulError::Config(format!("prompt templates: {}", e)))?;
        let prompt = renderer
            .render(template_name(variant), &data)
            .map_err(ModulError::Config)?;

        debug!(
            variant = %variant,
            total_minutes = validated.budget.total_minutes(),
            prompt_chars = prompt.chars().count(),
            "Built generation request"
        );

        Ok(GenerationRequest::new(
            variant,
            tidy(&prompt),
            Some(validated.budget),
        ))
    }

    fn prompt_data(&self, validated: &ValidatedForm<'_>, variant: DocumentVariant) -> Value {
        let form = validated.form;
        let budget = validated.budget;

        let dimension_entry = |d: &Dimension| json!({"name": d.name, "description": d.description});
        let contextual: Vec<Value> = form
            .contextual
            .provided()
            .into_iter()
            .map(|(label, value)| json!({"label": label, "value": value}))
            .collect();

        json!({
            "schema_id": variant.schema_id(),
            "school": self.context.school,
            "principal": self.context.principal,
            "year": self.context.year,
            "teacher_name": form.teacher_name.trim(),
            "subject": form.subject.trim(),
            "grade": form.grade.trim(),
            "semester": form.semester.trim(),
            "topic": form.topic.trim(),
            "element": form.element.trim(),
            "learning_outcome": form.learning_outcome.trim(),
            "learning_goals": form.learning_goals.trim(),
            "initial_assessment": form.initial_assessment.trim(),
            "facilities": form.contextual.facilities.trim(),
            "meetings": budget.meetings,
            "hours_per_meeting": budget.hours_per_meeting,
            "minutes_per_hour": budget.minutes_per_hour,
            "minutes_per_meeting": budget.minutes_per_meeting(),
            "total_minutes": budget.total_minutes(),
            "dimensions_selected": !validated.dimensions.is_empty(),
            "dimensions": validated.dimensions.iter().map(|d| dimension_entry(d)).collect::<Vec<_>>(),
            "dimension_catalog": self.catalog.dimensions.iter().map(dimension_entry).collect::<Vec<_>>(),
            "practice": validated.practice.map(|p| json!({"name": p.name, "stages": p.stages})),
            "contextual": contextual,
        })
    }
}

/// Build a request against the built-in catalog and default school profile.
pub fn build_request(
    form: &FormInput,
    variant: DocumentVariant,
) -> Result<GenerationRequest, ModulError> {
    RequestBuilder::new(Catalog::builtin()?, PromptContext::default()).build(form, variant)
}

/// Meetings × hours-per-meeting × minutes-per-hour, each a positive integer.
pub fn time_budget(form: &FormInput) -> Result<TimeBudget, ModulError> {
    let budget = TimeBudget {
        meetings: parse_positive("meetings", &form.meetings)?,
        hours_per_meeting: parse_positive("hoursPerMeeting", &form.hours_per_meeting)?,
        minutes_per_hour: parse_positive("duration", &form.duration)?,
    };
    budget
        .hours_per_meeting
        .checked_mul(budget.minutes_per_hour)
        .and_then(|m| m.checked_mul(budget.meetings))
        .ok_or_else(|| ModulError::invalid_input("duration", "alokasi waktu terlalu besar"))?;
    Ok(budget)
}

pub fn parse_positive(field: &str, raw: &str) -> Result<u32, ModulError> {
    let caps = NUMERIC_FIELD.captures(raw).ok_or_else(|| {
        ModulError::invalid_input(field, format!("'{}' bukan bilangan bulat positif", raw.trim()))
    })?;
    let value: u32 = caps[1]
        .parse()
        .map_err(|_| ModulError::invalid_input(field, "angka tidak valid"))?;
    if value == 0 {
        return Err(ModulError::invalid_input(field, "harus lebih dari 0"));
    }
    Ok(value)
}

fn template_name(variant: DocumentVariant) -> &'static str {
    match variant {
        DocumentVariant::Legacy => "legacy",
        DocumentVariant::DeepLearning => "deep_learning",
        DocumentVariant::StandardModule => "standard",
    }
}

/// Collapse the blank-line runs left behind by conditional blocks.
fn tidy(prompt: &str) -> String {
    let mut out = String::with_capacity(prompt.len());
    let mut blank_run = 0;
    for line in prompt.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
