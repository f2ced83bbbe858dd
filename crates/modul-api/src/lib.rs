//! Modul Ajar API /v1: REST endpoints
pub mod handlers;
pub mod metrics;
pub mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use handlers::ApiError;
use metrics::Metrics;
use modul_client::{source_for, GroqClient, HeaderImageSource};
use modul_core::{AppConfig, ModulError};
use modul_stages::{Pipeline, Session};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub images: Option<Arc<dyn HeaderImageSource>>,
    pub sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        pipeline: Pipeline,
        images: Option<Arc<dyn HeaderImageSource>>,
    ) -> Result<Self, ModulError> {
        let metrics = Metrics::new().map_err(|e| ModulError::Config(format!("metrics: {}", e)))?;
        Ok(Self {
            pipeline: Arc::new(pipeline),
            images,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            metrics: Arc::new(metrics),
        })
    }

    /// Groq client and letterhead source built from configuration
    pub fn from_config(config: AppConfig) -> Result<Self, ModulError> {
        let client = GroqClient::new(config.generation.clone())?;
        let timeout = Duration::from_secs(config.generation.timeout_secs);
        let images = config
            .school
            .header_image_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(|url| source_for(url, timeout))
            .transpose()?;
        if config.generation.api_key.is_empty() {
            tracing::warn!("GROQ_API_KEY is not set; generation requests will fail");
        }
        Self::new(Pipeline::new(Arc::new(client), config)?, images)
    }

    /// Forget a session; a pending generation for it is abandoned.
    pub async fn remove_session(&self, id: Uuid) -> Result<(), ApiError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(ApiError::SessionNotFound(id))?;
        self.metrics.sessions.dec();
        session.reset().await;
        Ok(())
    }

    /// Drop sessions idle for at least `ttl`; returns how many went.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let snapshot: Vec<(Uuid, Arc<Session>)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, s)| (*id, s.clone()))
            .collect();

        let mut stale = Vec::new();
        for (id, session) in snapshot {
            if session.idle_for().await >= ttl {
                stale.push(id);
            }
        }

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        for id in &stale {
            sessions.remove(id);
        }
        let evicted = before - sessions.len();
        self.metrics.sessions.sub(evicted as i64);
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "idle sessions evicted");
        }
        evicted
    }

    pub async fn session(&self, id: Uuid) -> Result<Arc<Session>, ApiError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ApiError::SessionNotFound(id))
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/catalog", get(handlers::catalog))
        .route("/v1/sessions", post(handlers::create_session))
        .route(
            "/v1/sessions/{id}",
            get(handlers::session_status).delete(handlers::delete_session),
        )
        .route("/v1/sessions/{id}/generate", post(handlers::generate))
        .route("/v1/sessions/{id}/reset", post(handlers::reset))
        .route("/v1/sessions/{id}/document", get(handlers::document))
        .route("/v1/sessions/{id}/export/{format}", get(handlers::export))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(axum::middleware::from_fn(middleware::no_store))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = config.server.addr.clone();
    let ttl = config.server.session_ttl_secs;
    let state = AppState::from_config(config)?;
    if ttl > 0 {
        tokio::spawn(sweep_sessions(state.clone(), Duration::from_secs(ttl)));
    }
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Modul Ajar API listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn sweep_sessions(state: AppState, ttl: Duration) {
    let mut interval = tokio::time::interval((ttl / 4).max(Duration::from_secs(1)));
    loop {
        interval.tick().await;
        state.evict_idle(ttl).await;
    }
}
