//! Enumerated catalogs: profile dimensions and pedagogical practices.
//!
//! The built-in catalog is embedded from `catalogs/catalog.yaml`; a custom
//! one can be loaded with [`Catalog::load`] in the same format.

use modul_core::ModulError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static BUILTIN: Lazy<Result<Catalog, String>> =
    Lazy::new(|| Catalog::from_yaml(include_str!("../catalogs/catalog.yaml")));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub version: String,
    pub dimensions: Vec<Dimension>,
    pub practices: Vec<Practice>,
}

/// Graduate-profile dimension with its fixed description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub description: String,
}

/// Pedagogical practice with its fixed, ordered syntax
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Practice {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub stages: Vec<String>,
}

impl Catalog {
    /// The catalog shipped with the crate
    pub fn builtin() -> Result<&'static Catalog, ModulError> {
        BUILTIN
            .as_ref()
            .map_err(|e| ModulError::Config(format!("built-in catalog: {}", e)))
    }

    pub fn load(path: &str) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read catalog file: {}", e))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        let catalog: Catalog =
            serde_yaml::from_str(yaml).map_err(|e| format!("Failed to parse catalog YAML: {}", e))?;
        if let Some(empty) = catalog.practices.iter().find(|p| p.stages.is_empty()) {
            return Err(format!("Practice '{}' has no stages", empty.id));
        }
        Ok(catalog)
    }

    /// Look up a dimension by name or alias, ignoring case and spacing.
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        let key = catalog_key(name);
        self.dimensions
            .iter()
            .find(|d| matches_key(&key, &d.name, &d.aliases))
    }

    /// Look up a practice by id, full name or alias.
    pub fn practice(&self, name: &str) -> Option<&Practice> {
        let key = catalog_key(name);
        self.practices
            .iter()
            .find(|p| catalog_key(&p.id) == key || matches_key(&key, &p.name, &p.aliases))
    }

    pub fn dimension_names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn practice_names(&self) -> Vec<&str> {
        self.practices.iter().map(|p| p.name.as_str()).collect()
    }
}

fn matches_key(key: &str, name: &str, aliases: &[String]) -> bool {
    catalog_key(name) == key || aliases.iter().any(|a| catalog_key(a) == key)
}

/// Lowercase alphanumerics only: "Problem-Based  Learning" → "problembasedlearning"
fn catalog_key(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.dimensions.len(), 8);
        assert_eq!(catalog.practices.len(), 6);
    }

    #[test]
    fn test_practice_lookup_by_alias() {
        let catalog = Catalog::builtin().unwrap();

        let pbl = catalog.practice("Problem-Based Learning").unwrap();
        assert_eq!(pbl.id, "pbl");
        assert_eq!(pbl.stages.len(), 5);

        let pjbl = catalog
            .practice("Pembelajaran Berbasis Proyek (Project-Based Learning)")
            .unwrap();
        assert_eq!(pjbl.id, "pjbl");
        assert_eq!(pjbl.stages.len(), 6);

        assert!(catalog.practice("Flipped Classroom").is_none());
    }

    #[test]
    fn test_dimension_lookup_ignores_case() {
        let catalog = Catalog::builtin().unwrap();
        let dim = catalog.dimension("keimanan dan ketakwaan kepada tuhan yme").unwrap();
        assert_eq!(dim.name, "Keimanan dan Ketakwaan terhadap Tuhan YME");
        assert!(catalog.dimension("Kecerdasan Buatan").is_none());
    }

    #[test]
    fn test_practice_without_stages_rejected() {
        let yaml = r#"
version: "1.0"
dimensions: []
practices:
  - id: empty
    name: Empty
    stages: []
"#;
        assert!(Catalog::from_yaml(yaml).is_err());
    }
}
