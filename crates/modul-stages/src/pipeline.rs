//! Generation pipeline: form → request → raw text → payload → model → view
//!
//! Each stage is timed and content-hashed into a [`StageTrace`]. Only the
//! generate stage is non-deterministic; everything after it is a pure
//! function of the raw text, so a trace pins down where output diverged.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use modul_client::GenerationClient;
use modul_core::{
    AdapterWarning, AppConfig, DocumentModel, DocumentVariant, FormInput, GenerationRequest,
    ModulError, StageTrace,
};
use modul_in::{normalize, Catalog, PromptContext, RequestBuilder};
use modul_out::{render, ExportFormat, RenderedView};
use modul_schema::{adapt, AdaptContext};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub const BUILD_STAGE: &str = "build.request.v1";
pub const NORMALIZE_STAGE: &str = "normalize.payload.v1";
pub const RENDER_STAGE: &str = "render.view.v1";

/// A finished generation: adapted model, its view and how it was produced
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    pub variant: DocumentVariant,
    pub model: DocumentModel,
    pub view: RenderedView,
    pub warnings: Vec<AdapterWarning>,
    pub trace: StageTrace,
    pub generated_at: DateTime<Utc>,
}

impl RenderedDocument {
    pub fn file_name(&self, format: ExportFormat) -> String {
        modul_out::file_name(&self.view, format)
    }
}

/// Request plus the adapter context derived from the same form
#[derive(Debug, Clone)]
pub struct Prepared {
    pub request: GenerationRequest,
    pub context: AdaptContext,
    pub trace: StageTrace,
}

pub struct Pipeline {
    client: Arc<dyn GenerationClient>,
    catalog: &'static Catalog,
    config: AppConfig,
    today: Option<NaiveDate>,
}

impl Pipeline {
    pub fn new(client: Arc<dyn GenerationClient>, config: AppConfig) -> Result<Self, ModulError> {
        Ok(Self {
            client,
            catalog: Catalog::builtin()?,
            config,
            today: None,
        })
    }

    pub fn with_catalog(mut self, catalog: &'static Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Pin the signature date instead of reading the clock
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Validate the form and build the prompt. Pure; fails only on `InvalidInput`.
    pub fn prepare(
        &self,
        form: &FormInput,
        variant: DocumentVariant,
    ) -> Result<Prepared, ModulError> {
        let started = Instant::now();
        let today = self.today();
        let builder = RequestBuilder::new(
            self.catalog,
            PromptContext::new(&self.config.school, today.year()),
        );
        let request = builder.build(form, variant)?;

        let mut context = AdaptContext::new(today)
            .with_school(self.config.school.clone())
            .with_form(form);
        if let Some(budget) = request.budget() {
            context = context.with_budget(budget);
        }

        let mut trace = StageTrace::new();
        let form_bytes = serde_json::to_vec(form).unwrap_or_default();
        trace.record(
            BUILD_STAGE,
            &form_bytes,
            request.prompt().as_bytes(),
            true,
            started,
        );
        Ok(Prepared {
            request,
            context,
            trace,
        })
    }

    /// Call the generation service. The only suspension point of a run.
    pub async fn generate(&self, prepared: &mut Prepared) -> Result<String, ModulError> {
        let started = Instant::now();
        let raw = self.client.generate(&prepared.request).await?;
        prepared.trace.record(
            &format!("generate.{}", self.client.model()),
            prepared.request.prompt().as_bytes(),
            raw.as_bytes(),
            false,
            started,
        );
        Ok(raw)
    }

    /// Normalize, adapt and render raw generator output.
    pub fn finish(&self, prepared: Prepared, raw: &str) -> Result<RenderedDocument, ModulError> {
        let Prepared {
            request,
            context,
            mut trace,
        } = prepared;
        let variant = request.variant();

        let started = Instant::now();
        let payload = normalize(raw, request.response_format())?;
        let payload_bytes = payload.as_bytes_for_hash();
        trace.record(NORMALIZE_STAGE, raw.as_bytes(), &payload_bytes, true, started);

        let started = Instant::now();
        let adapted = adapt(&payload, variant, &context);
        let model_bytes = serde_json::to_vec(&adapted.model).unwrap_or_default();
        trace.record(
            &format!("adapt.{}", variant.schema_id()),
            &payload_bytes,
            &model_bytes,
            true,
            started,
        );

        let started = Instant::now();
        let view = render(&adapted.model);
        let view_bytes = serde_json::to_vec(&view).unwrap_or_default();
        trace.record(RENDER_STAGE, &model_bytes, &view_bytes, true, started);

        info!(
            variant = %variant,
            trace_id = %trace.trace_id,
            pipeline = %trace.pipeline_id(),
            warnings = adapted.warnings.len(),
            total_ms = trace.total_ms(),
            "module rendered"
        );
        debug!(trace = ?trace.stages, "stage trace");

        Ok(RenderedDocument {
            variant,
            model: adapted.model,
            view,
            warnings: adapted.warnings,
            trace,
            generated_at: Utc::now(),
        })
    }

    /// Whole run without session bookkeeping
    pub async fn run(
        &self,
        form: &FormInput,
        variant: DocumentVariant,
    ) -> Result<RenderedDocument, ModulError> {
        let mut prepared = self.prepare(form, variant)?;
        let raw = self.generate(&mut prepared).await?;
        self.finish(prepared, &raw)
    }
}
