//! Prometheus counters for generations and exports, served at `/metrics`.
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub generations_started: IntCounter,
    pub generations_succeeded: IntCounter,
    /// Labelled by error code
    pub generations_failed: IntCounterVec,
    /// Labelled by format and outcome
    pub exports: IntCounterVec,
    pub sessions: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("modul".to_string()), None)?;

        let generations_started =
            IntCounter::new("generations_started_total", "Generations accepted by a session")?;
        let generations_succeeded =
            IntCounter::new("generations_succeeded_total", "Generations that rendered a document")?;
        let generations_failed = IntCounterVec::new(
            Opts::new("generations_failed_total", "Generations that failed, by error code"),
            &["code"],
        )?;
        let exports = IntCounterVec::new(
            Opts::new("exports_total", "Export requests by format and outcome"),
            &["format", "outcome"],
        )?;
        let sessions = IntGauge::new("sessions", "Open sessions")?;

        registry.register(Box::new(generations_started.clone()))?;
        registry.register(Box::new(generations_succeeded.clone()))?;
        registry.register(Box::new(generations_failed.clone()))?;
        registry.register(Box::new(exports.clone()))?;
        registry.register(Box::new(sessions.clone()))?;

        Ok(Self {
            registry,
            generations_started,
            generations_succeeded,
            generations_failed,
            exports,
            sessions,
        })
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        encode(&self.registry)
    }
}

pub fn encode(registry: &Registry) -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).to_string())
}
