//! Modul Core: data model, error taxonomy and shared plumbing
//!
//! Everything the pipeline stages pass between each other lives here so the
//! request builder, schema adapter, renderer and session never depend on each
//! other's internals.
//!
//! # Pipeline Flow
//!
//! ```text
//! FormInput → Request Builder → Generation Client → Normalizer → Adapter → Renderer → Export
//!               (modul-in)        (modul-client)     (modul-in)  (schema)  (modul-out) (modul-out)
//! ```

pub mod config;
pub mod data_model;
pub mod document;
pub mod error;
pub mod templates;
pub mod trace;

pub use config::{
    ApiKey, AppConfig, ExportSettings, GenerationSettings, SchoolProfile, ServerSettings,
};
pub use data_model::{
    ContextualFields, DocumentVariant, FormInput, GenerationRequest, Payload, ResponseFormat,
    TimeBudget,
};
pub use document::DocumentModel;
pub use error::{AdapterWarning, ExportFailure, GenerationFailure, ModulError};
pub use templates::{EscapeMode, TemplateRenderer, TemplatesFile};
pub use trace::{StageRecord, StageTrace};

/// Engine version reported by the API health endpoint
pub const MODUL_VERSION: &str = "1.0.0";

/// Placeholder rendered for any scalar the generator left empty
pub const PLACEHOLDER: &str = "-";
