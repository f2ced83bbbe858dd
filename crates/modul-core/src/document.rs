//! DocumentModel: the validated, total-default lesson document
//!
//! Every field here has a concrete value after adaptation. Scalars that the
//! generator omitted hold [`crate::PLACEHOLDER`], lists are empty, and
//! alternate historical shapes are resolved into explicit enum variants, so
//! the renderer never has to ask whether something is present.
use crate::data_model::DocumentVariant;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "camelCase")]
pub enum DocumentModel {
    Legacy(LegacyDocument),
    DeepLearning(DeepLearningModule),
    StandardModule(StandardModule),
}

impl DocumentModel {
    pub fn variant(&self) -> DocumentVariant {
        match self {
            Self::Legacy(_) => DocumentVariant::Legacy,
            Self::DeepLearning(_) => DocumentVariant::DeepLearning,
            Self::StandardModule(_) => DocumentVariant::StandardModule,
        }
    }

    /// Subject name used for export file names; placeholder when unknown.
    pub fn subject(&self) -> &str {
        match self {
            Self::Legacy(doc) => doc.subject.as_str(),
            Self::DeepLearning(doc) => doc.general.subject.as_str(),
            Self::StandardModule(doc) => doc.identity.subject.as_str(),
        }
    }
}

// ============================================================================
// Shared sections
// ============================================================================

/// Graduate-profile dimensions in one of their two observed shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "items", rename_all = "camelCase")]
pub enum ProfileDimensions {
    /// `["Kreativitas", "Kolaborasi"]`
    Listed(Vec<String>),
    /// `[{"dimensi": "Kreativitas", "deskripsi": "..."}]`
    Described(Vec<DescribedDimension>),
}

impl Default for ProfileDimensions {
    fn default() -> Self {
        Self::Listed(Vec::new())
    }
}

impl ProfileDimensions {
    pub fn len(&self) -> usize {
        match self {
            Self::Listed(items) => items.len(),
            Self::Described(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension names regardless of shape
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Listed(items) => items.iter().map(String::as_str).collect(),
            Self::Described(items) => items.iter().map(|d| d.dimension.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribedDimension {
    pub dimension: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    pub title: String,
    pub goal: String,
    pub indicators: Vec<RubricIndicator>,
    pub notes: Vec<String>,
}

/// One assessed aspect with its four achievement levels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricIndicator {
    pub aspect: String,
    pub beginning: String,
    pub developing: String,
    pub proficient: String,
    pub advanced: String,
}

/// Appendix sections, kept as Markdown-lite text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appendix {
    pub worksheet: String,
    pub reading_material: String,
    pub glossary: String,
    pub bibliography: String,
}

impl Appendix {
    /// (heading, body) pairs in display order
    pub fn sections(&self) -> [(&'static str, &str); 4] {
        [
            ("Lembar Kerja Peserta Didik (LKPD)", self.worksheet.as_str()),
            ("Bahan Bacaan Guru & Peserta Didik", self.reading_material.as_str()),
            ("Glosarium", self.glossary.as_str()),
            ("Daftar Pustaka", self.bibliography.as_str()),
        ]
    }
}

/// Two-party signature block, dated at adapt time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub left: SignatureParty,
    pub right: SignatureParty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureParty {
    /// Lines above the signing space ("Mengetahui,", "Kepala Sekolah")
    pub heading: Vec<String>,
    pub name: String,
    /// "NIP. ....." line, when the variant prints one
    pub id_line: Option<String>,
}

// ============================================================================
// Legacy narrative variant
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyDocument {
    pub subject: String,
    /// Markdown-lite body as produced by the generator, fences stripped
    pub body: String,
}

// ============================================================================
// Deep-learning module
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepLearningModule {
    pub schema_version: String,
    pub general: GeneralInfo,
    pub dimensions: ProfileDimensions,
    pub design: LearningDesign,
    pub meetings: Vec<MeetingExperience>,
    pub assessment: AssessmentPlan,
    pub rubric: Rubric,
    pub appendix: Appendix,
    pub signature: Signature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralInfo {
    pub school: String,
    pub author: String,
    pub subject: String,
    /// Derived "Kelas X (Fase E) / Ganjil"
    pub class_semester: String,
    pub time_allocation: String,
    pub learners: String,
    pub material: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningDesign {
    pub learning_outcome: String,
    pub cross_disciplinary: String,
    pub learning_goals: String,
    pub topic: String,
    pub pedagogical_practice: String,
    pub partnerships: String,
    pub environment: String,
    pub digital_tools: String,
}

impl LearningDesign {
    pub fn rows(&self) -> [(&'static str, &str); 8] {
        [
            ("Capaian Pembelajaran", self.learning_outcome.as_str()),
            ("Lintas Disiplin Ilmu", self.cross_disciplinary.as_str()),
            ("Tujuan Pembelajaran", self.learning_goals.as_str()),
            ("Topik Pembelajaran", self.topic.as_str()),
            ("Praktik Pedagogis", self.pedagogical_practice.as_str()),
            ("Kemitraan Pembelajaran", self.partnerships.as_str()),
            ("Lingkungan Pembelajaran", self.environment.as_str()),
            ("Pemanfaatan Digital", self.digital_tools.as_str()),
        ]
    }
}

/// Learning experience of a single meeting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingExperience {
    pub number: u32,
    pub opening: Phase,
    pub understand: CoreStage,
    pub apply: CoreStage,
    pub reflect: CoreStage,
    pub closing: Phase,
}

impl MeetingExperience {
    /// Every phase duration string of the meeting, in order
    pub fn durations(&self) -> [&str; 5] {
        [
            self.opening.duration.as_str(),
            self.understand.duration.as_str(),
            self.apply.duration.as_str(),
            self.reflect.duration.as_str(),
            self.closing.duration.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub principle: String,
    pub description: String,
    pub duration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreStage {
    pub principle: String,
    pub activities: Vec<String>,
    pub duration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentPlan {
    pub initial: String,
    pub process: String,
    pub summative: String,
    pub detail: String,
}

// ============================================================================
// Standard module
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardModule {
    pub schema_version: String,
    pub identity: Identity,
    pub initial_competence: String,
    pub profile: ProfileDimensions,
    pub needs_mapping: NeedsMapping,
    pub social_emotional: Vec<SocialEmotionalCompetence>,
    pub facilities: Facilities,
    pub learning_model: LearningModel,
    pub core: CoreCompetence,
    pub activities: Vec<MeetingActivities>,
    pub assessments: Vec<AssessmentRow>,
    pub rubric: Rubric,
    pub appendix: Appendix,
    pub signature: Signature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub author: String,
    pub school: String,
    pub year: String,
    pub subject: String,
    /// Derived "Kelas XI (Fase F) / Genap"
    pub class_semester: String,
    pub material: String,
    pub time_allocation: String,
    pub meeting_count: String,
    pub hours_per_meeting: String,
}

impl Identity {
    pub fn rows(&self) -> [(&'static str, &str); 9] {
        [
            ("Nama Penyusun", self.author.as_str()),
            ("Satuan Pendidikan", self.school.as_str()),
            ("Tahun Penyusunan", self.year.as_str()),
            ("Mata Pelajaran", self.subject.as_str()),
            ("Kelas / Semester", self.class_semester.as_str()),
            ("Materi", self.material.as_str()),
            ("Alokasi Waktu", self.time_allocation.as_str()),
            ("Jumlah Pertemuan", self.meeting_count.as_str()),
            ("Jam per Pertemuan", self.hours_per_meeting.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum NeedsMapping {
    /// `{identifikasi, hasilPemetaan}`
    Summary { identification: String, result: String },
    /// `[{kategori, deskripsi, strategi}]`
    Table { rows: Vec<NeedsRow> },
    #[default]
    Absent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedsRow {
    pub category: String,
    pub description: String,
    pub strategy: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialEmotionalCompetence {
    pub competence: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facilities {
    pub media: Vec<String>,
    pub tools: Vec<String>,
    pub sources: Vec<String>,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum LearningModel {
    Structured {
        mode: String,
        approach: String,
        model: String,
        method: String,
    },
    Plain { text: String },
}

impl Default for LearningModel {
    fn default() -> Self {
        Self::Plain {
            text: crate::PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreCompetence {
    pub phase: String,
    pub element: String,
    pub learning_outcome: String,
    pub material: String,
    pub competence: String,
    /// Lead sentence before the goal list; empty when the list came bare
    pub goals_intro: String,
    pub goals: Vec<String>,
    pub meaningful_understanding: String,
    pub trigger_questions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingActivities {
    pub number: u32,
    pub steps: Vec<ActivityStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStep {
    pub stage: String,
    pub activities: Vec<String>,
    pub duration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRow {
    pub kind: String,
    pub technique: String,
    pub instrument: String,
}
