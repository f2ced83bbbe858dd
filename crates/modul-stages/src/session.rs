//! Session state machine
//!
//! ```text
//! Idle ──submit──▶ Requesting{token} ──ok──▶ Rendered
//!   ▲                  │   ▲                   │
//!   │                  err └──────submit───────┤
//!   │                  ▼                       │
//!   └──────reset─── Failed ◀───────────────────┘
//! ```
//!
//! Every submission and every reset advances the session token. A result
//! is installed only if the token it started under is still current, so a
//! reset abandons an in-flight generation and a regenerate invalidates
//! exports that were started against the previous document.

use crate::pipeline::{Pipeline, RenderedDocument};
use modul_client::HeaderImageSource;
use modul_core::{DocumentVariant, ExportFailure, FormInput, ModulError};
use modul_out::{export, ExportArtifact, ExportFormat, HeaderImage};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum SessionState {
    Idle,
    Requesting {
        token: u64,
        variant: DocumentVariant,
    },
    Rendered(Arc<RenderedDocument>),
    Failed(FailureInfo),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting { .. } => "requesting",
            Self::Rendered(_) => "rendered",
            Self::Failed(_) => "failed",
        }
    }
}

/// What the form view needs to know about a failed generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureInfo {
    pub code: &'static str,
    pub message: String,
    pub user_message: String,
    pub retryable: bool,
}

impl From<&ModulError> for FailureInfo {
    fn from(err: &ModulError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            user_message: err.user_message(),
            retryable: err.is_retryable(),
        }
    }
}

/// Outcome of a submission that did not fail
#[derive(Debug, Clone)]
pub enum Submission {
    Rendered(Arc<RenderedDocument>),
    /// A generation was already in flight; nothing was queued
    Ignored,
    /// The session was reset or resubmitted while this one was pending
    Abandoned,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub id: Uuid,
    pub state: &'static str,
    pub token: u64,
    pub variant: Option<DocumentVariant>,
    pub warnings: usize,
    pub error: Option<FailureInfo>,
}

struct Inner {
    state: SessionState,
    token: u64,
    header: Option<Arc<HeaderImage>>,
    last_active: Instant,
}

pub struct Session {
    id: Uuid,
    pipeline: Arc<Pipeline>,
    images: Option<Arc<dyn HeaderImageSource>>,
    inner: Mutex<Inner>,
}

impl Session {
    pub fn new(pipeline: Arc<Pipeline>, images: Option<Arc<dyn HeaderImageSource>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pipeline,
            images,
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                token: 0,
                header: None,
                last_active: Instant::now(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Time since the last submit, reset or export; zero while generating
    pub async fn idle_for(&self) -> Duration {
        let inner = self.inner.lock().await;
        match inner.state {
            SessionState::Requesting { .. } => Duration::ZERO,
            _ => inner.last_active.elapsed(),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        let inner = self.inner.lock().await;
        let (variant, warnings, error) = match &inner.state {
            SessionState::Idle => (None, 0, None),
            SessionState::Requesting { variant, .. } => (Some(*variant), 0, None),
            SessionState::Rendered(doc) => (Some(doc.variant), doc.warnings.len(), None),
            SessionState::Failed(failure) => (None, 0, Some(failure.clone())),
        };
        SessionStatus {
            id: self.id,
            state: inner.state.name(),
            token: inner.token,
            variant,
            warnings,
            error,
        }
    }

    /// Current document, if the last generation succeeded
    pub async fn document(&self) -> Option<Arc<RenderedDocument>> {
        match &self.inner.lock().await.state {
            SessionState::Rendered(doc) => Some(doc.clone()),
            _ => None,
        }
    }

    /// Generate a document from the form.
    ///
    /// Invalid input is rejected before the state changes. Once accepted,
    /// the previous document is discarded and a failure leaves the session
    /// in `Failed` so the form can be edited and resubmitted.
    pub async fn submit(
        &self,
        form: &FormInput,
        variant: DocumentVariant,
    ) -> Result<Submission, ModulError> {
        let (mut prepared, token) = {
            let mut inner = self.inner.lock().await;
            if let SessionState::Requesting { token, .. } = inner.state {
                info!(session = %self.id, token, "generation in flight, submission ignored");
                return Ok(Submission::Ignored);
            }
            inner.last_active = Instant::now();
            let prepared = self.pipeline.prepare(form, variant)?;
            inner.token += 1;
            inner.state = SessionState::Requesting {
                token: inner.token,
                variant,
            };
            (prepared, inner.token)
        };
        info!(session = %self.id, token, variant = %variant, "generation started");

        let outcome = match self.pipeline.generate(&mut prepared).await {
            Ok(raw) => self.pipeline.finish(prepared, &raw),
            Err(e) => Err(e),
        };

        let mut inner = self.inner.lock().await;
        inner.last_active = Instant::now();
        if inner.token != token {
            info!(
                session = %self.id,
                token,
                current = inner.token,
                "result of abandoned generation discarded"
            );
            return Ok(Submission::Abandoned);
        }
        match outcome {
            Ok(document) => {
                let document = Arc::new(document);
                inner.state = SessionState::Rendered(document.clone());
                Ok(Submission::Rendered(document))
            }
            Err(e) => {
                warn!(session = %self.id, code = e.code(), error = %e, "generation failed");
                inner.state = SessionState::Failed(FailureInfo::from(&e));
                Err(e)
            }
        }
    }

    /// Drop the document, the letterhead cache and interest in any pending result.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.token += 1;
        inner.state = SessionState::Idle;
        inner.header = None;
        inner.last_active = Instant::now();
        info!(session = %self.id, token = inner.token, "session reset");
    }

    /// Export the current document.
    ///
    /// Works on a snapshot; if the session moves on while the export runs
    /// the result is refused as stale. A missing or broken letterhead only
    /// drops the image.
    pub async fn export(&self, format: ExportFormat) -> Result<ExportArtifact, ModulError> {
        let (document, token) = {
            let mut inner = self.inner.lock().await;
            inner.last_active = Instant::now();
            match &inner.state {
                SessionState::Rendered(doc) => (doc.clone(), inner.token),
                _ => return Err(ExportFailure::NothingToExport.into()),
            }
        };

        let header = if format.uses_header_image() {
            self.header_image(token).await
        } else {
            None
        };

        // pdf and docx assembly is CPU-bound
        let pipeline = self.pipeline.clone();
        let artifact = tokio::task::spawn_blocking(move || {
            export(
                &document.view,
                format,
                header.as_deref(),
                &pipeline.config().export,
            )
        })
        .await
        .map_err(|e| ModulError::from(ExportFailure::Task(e.to_string())))
        .and_then(|result| result)
        .map_err(|e| {
            error!(session = %self.id, format = %format, error = %e, "export failed");
            e
        })?;

        if self.inner.lock().await.token != token {
            warn!(session = %self.id, format = %format, "document replaced during export");
            return Err(ExportFailure::Stale.into());
        }
        Ok(artifact)
    }

    async fn header_image(&self, token: u64) -> Option<Arc<HeaderImage>> {
        let source = self.images.as_ref()?;
        if let Some(cached) = self.inner.lock().await.header.clone() {
            return Some(cached);
        }

        match source.fetch().await.and_then(HeaderImage::decode) {
            Ok(image) => {
                let image = Arc::new(image);
                let mut inner = self.inner.lock().await;
                if inner.token == token {
                    inner.header.get_or_insert_with(|| image.clone());
                }
                Some(image)
            }
            Err(e) => {
                warn!(
                    session = %self.id,
                    location = source.location(),
                    error = %e,
                    "header image unavailable, exporting without it"
                );
                None
            }
        }
    }
}
