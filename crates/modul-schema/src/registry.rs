//! Schema Registry: versioned schema ids per document variant
use modul_core::{AdapterWarning, DocumentVariant};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub id: String,
    pub variant: DocumentVariant,
    pub semver: String,
    pub description: String,
    /// Older ids whose payloads the same adapter still reads
    pub compatible_with: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRegistry {
    pub entries: Vec<SchemaEntry>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            entries: vec![
                entry(
                    DocumentVariant::Legacy,
                    "1.0.0",
                    "Free-text Markdown module",
                    &[],
                ),
                entry(
                    DocumentVariant::DeepLearning,
                    "2.0.0",
                    "Deep-learning module with per-meeting learning experience",
                    &["modul.deep-learning.v1"],
                ),
                entry(
                    DocumentVariant::StandardModule,
                    "3.0.0",
                    "Standard module with identity, core competence and activities",
                    &["modul.standard.v2"],
                ),
            ],
        }
    }

    pub fn entry(&self, variant: DocumentVariant) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.variant == variant)
    }

    /// Whether a payload's declared id can be adapted as `variant`.
    ///
    /// An absent id is accepted; payloads from before versioning carry none.
    pub fn check(&self, declared: Option<&str>, variant: DocumentVariant) -> Option<AdapterWarning> {
        let declared = declared?.trim();
        let accepted = self.entry(variant).is_some_and(|e| {
            e.id == declared || e.compatible_with.iter().any(|c| c == declared)
        });
        if declared.is_empty() || accepted {
            None
        } else {
            Some(AdapterWarning::UnknownSchemaVersion {
                found: declared.to_string(),
                expected: variant.schema_id().to_string(),
            })
        }
    }
}

fn entry(
    variant: DocumentVariant,
    semver: &str,
    description: &str,
    compatible_with: &[&str],
) -> SchemaEntry {
    SchemaEntry {
        id: variant.schema_id().to_string(),
        variant,
        semver: semver.to_string(),
        description: description.to_string(),
        compatible_with: compatible_with.iter().map(|s| s.to_string()).collect(),
    }
}
