//! Data Model: FormInput → GenerationRequest → Payload
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Form record as collected by the multi-step form.
///
/// Numeric fields stay textual here: the form sends whatever the teacher
/// typed ("2", "45 Menit") and validation happens in the request builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormInput {
    pub teacher_name: String,
    pub subject: String,
    pub grade: String,
    pub semester: String,
    pub topic: String,
    pub element: String,
    /// Minutes per lesson hour (JP)
    #[serde(deserialize_with = "string_or_number")]
    pub duration: String,
    #[serde(deserialize_with = "string_or_number")]
    pub meetings: String,
    #[serde(deserialize_with = "string_or_number")]
    pub hours_per_meeting: String,
    pub learning_outcome: String,
    pub learning_goals: String,
    #[serde(alias = "deepLearningDimensions")]
    pub dimensions: Vec<String>,
    pub pedagogical_practice: String,
    pub initial_assessment: String,
    #[serde(flatten)]
    pub contextual: ContextualFields,
}

/// Optional context the teacher may add; empty strings mean "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextualFields {
    pub student_characteristics: String,
    pub cross_disciplinary: String,
    pub learning_environment: String,
    pub digital_tools: String,
    pub partnerships: String,
    #[serde(alias = "saranaPrasarana")]
    pub facilities: String,
}

impl ContextualFields {
    /// (label, value) pairs for every non-blank field, in form order.
    pub fn provided(&self) -> Vec<(&'static str, &str)> {
        [
            ("Karakteristik Peserta Didik", self.student_characteristics.as_str()),
            ("Lintas Disiplin Ilmu", self.cross_disciplinary.as_str()),
            ("Lingkungan Pembelajaran", self.learning_environment.as_str()),
            ("Pemanfaatan Digital", self.digital_tools.as_str()),
            ("Kemitraan Pembelajaran", self.partnerships.as_str()),
            ("Sarana dan Prasarana", self.facilities.as_str()),
        ]
        .into_iter()
        .map(|(label, value)| (label, value.trim()))
        .filter(|(_, value)| !value.is_empty())
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.provided().is_empty()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
        Raw::Null(()) => String::new(),
    })
}

/// Named document schema shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentVariant {
    Legacy,
    DeepLearning,
    StandardModule,
}

impl DocumentVariant {
    pub const ALL: [DocumentVariant; 3] = [
        DocumentVariant::Legacy,
        DocumentVariant::DeepLearning,
        DocumentVariant::StandardModule,
    ];

    /// Versioned schema id this variant is generated and adapted against
    pub fn schema_id(&self) -> &'static str {
        match self {
            Self::Legacy => "modul.legacy.v1",
            Self::DeepLearning => "modul.deep-learning.v2",
            Self::StandardModule => "modul.standard.v3",
        }
    }

    pub fn response_format(&self) -> ResponseFormat {
        match self {
            Self::Legacy => ResponseFormat::Text,
            Self::DeepLearning | Self::StandardModule => ResponseFormat::Json,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::DeepLearning => "deepLearning",
            Self::StandardModule => "standardModule",
        }
    }
}

impl fmt::Display for DocumentVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentVariant {
    type Err = crate::ModulError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "legacy" | "markdown" | "text" => Ok(Self::Legacy),
            "deeplearning" | "dl" => Ok(Self::DeepLearning),
            "standardmodule" | "standard" => Ok(Self::StandardModule),
            _ => Err(crate::ModulError::invalid_input(
                "variant",
                format!("unknown document variant '{}'", s),
            )),
        }
    }
}

/// Response-format directive sent with the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Text,
    Json,
}

/// Validated time arithmetic shared by the prompt and the time audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBudget {
    pub meetings: u32,
    pub hours_per_meeting: u32,
    pub minutes_per_hour: u32,
}

impl TimeBudget {
    pub fn minutes_per_meeting(&self) -> u32 {
        self.hours_per_meeting.saturating_mul(self.minutes_per_hour)
    }

    pub fn total_minutes(&self) -> u32 {
        self.minutes_per_meeting().saturating_mul(self.meetings)
    }

    pub fn total_hours(&self) -> u32 {
        self.hours_per_meeting.saturating_mul(self.meetings)
    }

    /// "2 x 45 menit" style label used in identity tables
    pub fn allocation_label(&self) -> String {
        format!(
            "{} JP x {} pertemuan ({} menit)",
            self.hours_per_meeting,
            self.meetings,
            self.total_minutes()
        )
    }
}

/// Immutable prompt plus response-format directive
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    variant: DocumentVariant,
    prompt: String,
    response_format: ResponseFormat,
    budget: Option<TimeBudget>,
}

impl GenerationRequest {
    pub fn new(variant: DocumentVariant, prompt: String, budget: Option<TimeBudget>) -> Self {
        Self {
            variant,
            prompt,
            response_format: variant.response_format(),
            budget,
        }
    }

    pub fn variant(&self) -> DocumentVariant {
        self.variant
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn response_format(&self) -> ResponseFormat {
        self.response_format
    }

    pub fn budget(&self) -> Option<TimeBudget> {
        self.budget
    }
}

/// Normalized generator output, before schema adaptation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Payload {
    Text(String),
    Json(serde_json::Value),
}

impl Payload {
    pub fn as_bytes_for_hash(&self) -> Vec<u8> {
        match self {
            Payload::Text(text) => text.as_bytes().to_vec(),
            Payload::Json(value) => serde_json::to_vec(value).unwrap_or_default(),
        }
    }
}
