//! Application configuration
//!
//! Loaded from YAML (`MODUL_CONFIG`) with every field defaulted, then
//! overlaid with the environment. The generation credential is carried as an
//! explicit value and handed to the client constructor.

use crate::error::ModulError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generation: GenerationSettings,
    pub school: SchoolProfile,
    pub export: ExportSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Output cap for the free-text variant
    pub max_tokens_text: u32,
    /// Output cap for full structured modules
    pub max_tokens_json: u32,
    pub timeout_secs: u64,
    #[serde(skip_serializing)]
    pub api_key: ApiKey,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            max_tokens_text: 4096,
            max_tokens_json: 8192,
            timeout_secs: 120,
            api_key: ApiKey::default(),
        }
    }
}

impl GenerationSettings {
    /// Output token cap for a response format
    pub fn max_tokens_for(&self, format: crate::ResponseFormat) -> u32 {
        match format {
            crate::ResponseFormat::Text => self.max_tokens_text,
            crate::ResponseFormat::Json => self.max_tokens_json,
        }
    }
}

/// Credential whose Debug output never shows the secret
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("ApiKey(<unset>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchoolProfile {
    pub name: String,
    pub principal_name: String,
    /// Place printed before the signature date
    pub city: String,
    /// Letterhead image fetched at export time
    pub header_image_url: Option<String>,
    pub locale: String,
}

impl Default for SchoolProfile {
    fn default() -> Self {
        Self {
            name: "SMK Kartanegara Wates Kab. Kediri".to_string(),
            principal_name: "Pujiono, S.Pd.".to_string(),
            city: "Wates".to_string(),
            header_image_url: None,
            locale: "id_ID".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub pdf_margin_mm: f32,
    /// Display width of the letterhead in Word documents
    pub docx_header_width_px: u32,
    pub image_dpi: f32,
    pub base_font_pt: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            pdf_margin_mm: 10.0,
            docx_header_width_px: 650,
            image_dpi: 300.0,
            base_font_pt: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub addr: String,
    /// Sessions idle longer than this are dropped; 0 keeps them until deleted
    pub session_ttl_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8788".to_string(),
            session_ttl_secs: 3600,
        }
    }
}

impl AppConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ModulError> {
        serde_yaml::from_str(yaml).map_err(|e| ModulError::Config(format!("invalid YAML: {}", e)))
    }

    pub fn load(path: &str) -> Result<Self, ModulError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ModulError::Config(format!("cannot read {}: {}", path, e)))?;
        Self::from_yaml(&content)
    }

    /// File named by `MODUL_CONFIG` (or defaults), overlaid with
    /// `GROQ_API_KEY` and `MODUL_ADDR`.
    pub fn from_env() -> Result<Self, ModulError> {
        let mut config = match std::env::var("MODUL_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::load(&path)?,
            _ => Self::default(),
        };
        config.apply_overrides(
            std::env::var("GROQ_API_KEY").ok(),
            std::env::var("MODUL_ADDR").ok(),
        );
        Ok(config)
    }

    fn apply_overrides(&mut self, api_key: Option<String>, addr: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.generation.api_key = ApiKey::new(key);
        }
        if let Some(addr) = addr.filter(|a| !a.trim().is_empty()) {
            self.server.addr = addr;
        }
    }

    pub fn max_tokens_for(&self, format: crate::ResponseFormat) -> u32 {
        self.generation.max_tokens_for(format)
    }
}
