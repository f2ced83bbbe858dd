//! Stage trace: per-generation timing and content hashes
use serde::Serialize;
use std::time::Instant;

/// One pipeline stage as it ran
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub id: String,
    pub in_hash: String,
    pub out_hash: String,
    pub deterministic: bool,
    pub latency_ms: u64,
}

/// Ordered stage records for one generation
#[derive(Debug, Clone, Serialize)]
pub struct StageTrace {
    pub trace_id: String,
    pub stages: Vec<StageRecord>,
}

impl Default for StageTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTrace {
    pub fn new() -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            stages: Vec::new(),
        }
    }

    /// Record a stage that started at `started`.
    pub fn record(
        &mut self,
        id: &str,
        input: &[u8],
        output: &[u8],
        deterministic: bool,
        started: Instant,
    ) {
        self.stages.push(StageRecord {
            id: id.to_string(),
            in_hash: hash_bytes(input),
            out_hash: hash_bytes(output),
            deterministic,
            latency_ms: started.elapsed().as_millis() as u64,
        });
    }

    /// "build→generate→normalize" style summary
    pub fn pipeline_id(&self) -> String {
        self.stages
            .iter()
            .map(|s| s.id.split('.').next().unwrap_or("?"))
            .collect::<Vec<_>>()
            .join("→")
    }

    pub fn total_ms(&self) -> u64 {
        self.stages.iter().map(|s| s.latency_ms).sum()
    }
}

pub fn hash_bytes(data: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(data))
}
