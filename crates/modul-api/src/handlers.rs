//! API Handlers
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use modul_core::{DocumentVariant, ExportFailure, FormInput, ModulError, MODUL_VERSION};
use modul_out::ExportFormat;
use modul_stages::{RenderedDocument, Session, Submission};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Modul(ModulError),
    SessionNotFound(Uuid),
    /// A generation is already running for the session
    Busy,
    /// The session was reset while this generation was pending
    Abandoned,
}

impl From<ModulError> for ApiError {
    fn from(err: ModulError) -> Self {
        Self::Modul(err)
    }
}

/// HTTP status for each error kind
pub fn status_for(err: &ModulError) -> StatusCode {
    match err {
        ModulError::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ModulError::GenerationFailed(_) | ModulError::MalformedResponse { .. } => {
            StatusCode::BAD_GATEWAY
        }
        ModulError::ExportFailed(ExportFailure::NothingToExport | ExportFailure::Stale) => {
            StatusCode::CONFLICT
        }
        ModulError::ExportFailed(_) | ModulError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Modul(err) => (
                status_for(err),
                json!({
                    "code": err.code(),
                    "message": err.to_string(),
                    "userMessage": err.user_message(),
                    "retryable": err.is_retryable(),
                }),
            ),
            ApiError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                json!({
                    "code": "session_not_found",
                    "message": format!("no session {}", id),
                    "userMessage": "Sesi tidak ditemukan. Muat ulang halaman.",
                    "retryable": false,
                }),
            ),
            ApiError::Busy => (
                StatusCode::CONFLICT,
                json!({
                    "code": "busy",
                    "message": "generation already in progress",
                    "userMessage": "Modul ajar sedang dibuat, tunggu hingga selesai.",
                    "retryable": true,
                }),
            ),
            ApiError::Abandoned => (
                StatusCode::CONFLICT,
                json!({
                    "code": "abandoned",
                    "message": "session was reset before generation finished",
                    "userMessage": "Sesi telah diatur ulang, hasil pembuatan diabaikan.",
                    "retryable": true,
                }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub variant: String,
    pub form: FormInput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub variant: DocumentVariant,
    pub subject: String,
    pub warnings: usize,
    pub trace_id: String,
    pub pipeline: String,
    pub generated_at: DateTime<Utc>,
}

impl From<&RenderedDocument> for DocumentSummary {
    fn from(doc: &RenderedDocument) -> Self {
        Self {
            variant: doc.variant,
            subject: doc.view.subject.clone(),
            warnings: doc.warnings.len(),
            trace_id: doc.trace.trace_id.clone(),
            pipeline: doc.trace.pipeline_id(),
            generated_at: doc.generated_at,
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

pub async fn catalog(State(state): State<AppState>) -> Json<Value> {
    let catalog = state.pipeline.catalog();
    let variants: Vec<Value> = DocumentVariant::ALL
        .iter()
        .map(|v| {
            json!({
                "id": v,
                "schema": v.schema_id(),
                "responseFormat": v.response_format(),
            })
        })
        .collect();
    Json(json!({
        "version": catalog.version,
        "dimensions": catalog.dimensions,
        "practices": catalog.practices,
        "variants": variants,
        "exportFormats": ExportFormat::ALL,
    }))
}

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let session = Session::new(state.pipeline.clone(), state.images.clone());
    let status = session.status().await;
    state
        .sessions
        .write()
        .await
        .insert(session.id(), std::sync::Arc::new(session));
    state.metrics.sessions.inc();
    info!(session = %status.id, "session created");
    (StatusCode::CREATED, Json(json!(status)))
}

pub async fn session_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let session = state.session(id).await?;
    Ok(Json(json!(session.status().await)))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.remove_session(id).await?;
    info!(session = %id, "session deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<Value>, ApiError> {
    let variant: DocumentVariant = body.variant.parse()?;
    let session = state.session(id).await?;
    let metrics = &state.metrics;

    match session.submit(&body.form, variant).await {
        Ok(Submission::Rendered(doc)) => {
            metrics.generations_started.inc();
            metrics.generations_succeeded.inc();
            Ok(Json(json!({
                "session": session.status().await,
                "document": DocumentSummary::from(doc.as_ref()),
                "warnings": doc.warnings,
            })))
        }
        Ok(Submission::Ignored) => Err(ApiError::Busy),
        Ok(Submission::Abandoned) => {
            metrics.generations_started.inc();
            Err(ApiError::Abandoned)
        }
        Err(err) => {
            if !matches!(err, ModulError::InvalidInput { .. }) {
                metrics.generations_started.inc();
            }
            metrics
                .generations_failed
                .with_label_values(&[err.code()])
                .inc();
            Err(err.into())
        }
    }
}

pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let session = state.session(id).await?;
    session.reset().await;
    Ok(Json(json!(session.status().await)))
}

pub async fn document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let session = state.session(id).await?;
    let doc = session
        .document()
        .await
        .ok_or(ModulError::ExportFailed(ExportFailure::NothingToExport))?;
    let value = serde_json::to_value(doc.as_ref())
        .map_err(|e| ModulError::Config(format!("serialize document: {}", e)))?;
    Ok(Json(value))
}

pub async fn export(
    State(state): State<AppState>,
    Path((id, format)): Path<(Uuid, String)>,
) -> Result<Response, ApiError> {
    let format: ExportFormat = format.parse()?;
    let session = state.session(id).await?;

    match session.export(format).await {
        Ok(artifact) => {
            state
                .metrics
                .exports
                .with_label_values(&[format.extension(), "ok"])
                .inc();
            let disposition = match format {
                ExportFormat::Html => "inline",
                _ => "attachment",
            };
            let headers = [
                (header::CONTENT_TYPE, artifact.mime.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("{}; filename=\"{}\"", disposition, artifact.file_name),
                ),
            ];
            Ok((headers, artifact.bytes).into_response())
        }
        Err(err) => {
            state
                .metrics
                .exports
                .with_label_values(&[format.extension(), err.code()])
                .inc();
            Err(err.into())
        }
    }
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": MODUL_VERSION,
            "model": state.pipeline.model(),
            "sessions": state.sessions.read().await.len(),
        })),
    )
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
