//! Session scenarios with stand-in generation and letterhead services.

use async_trait::async_trait;
use chrono::NaiveDate;
use modul_client::{GenerationClient, HeaderImageSource};
use modul_core::{
    AppConfig, DocumentVariant, ExportFailure, FormInput, GenerationFailure, GenerationRequest,
    ModulError,
};
use modul_out::{ExportFormat, TableClass};
use modul_stages::{Pipeline, Session, SessionState, Submission};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

fn fixtures_dir() -> std::path::PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    std::path::Path::new(&manifest_dir).join("../../testing/fixtures")
}

fn fixture(path: &str) -> String {
    std::fs::read_to_string(fixtures_dir().join(path)).unwrap()
}

fn budi() -> FormInput {
    serde_json::from_value(serde_json::json!({
        "teacherName": "Budi",
        "subject": "Matematika",
        "grade": "Kelas X (Fase E)",
        "topic": "Persamaan Kuadrat",
        "meetings": "2",
        "hoursPerMeeting": "2",
        "duration": "45",
        "dimensions": ["Kreativitas", "Kolaborasi"]
    }))
    .unwrap()
}

/// Generation stand-in: optional gate, canned reply, captured prompts
struct StubClient {
    reply: Result<String, GenerationFailure>,
    gate: Option<Arc<Notify>>,
    prompts: Mutex<Vec<String>>,
}

impl StubClient {
    fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            gate: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(failure: GenerationFailure) -> Self {
        Self {
            reply: Err(failure),
            gate: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl GenerationClient for StubClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ModulError> {
        self.prompts.lock().unwrap().push(request.prompt().to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.reply.clone().map_err(ModulError::from)
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}

/// Letterhead stand-in counting fetches
struct StubImages {
    bytes: Option<Vec<u8>>,
    fetches: AtomicUsize,
}

impl StubImages {
    fn letterhead() -> Self {
        Self {
            bytes: Some(std::fs::read(fixtures_dir().join("images/letterhead.png")).unwrap()),
            fetches: AtomicUsize::new(0),
        }
    }

    fn unreachable() -> Self {
        Self {
            bytes: None,
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HeaderImageSource for StubImages {
    async fn fetch(&self) -> Result<Vec<u8>, ModulError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.bytes
            .clone()
            .ok_or_else(|| ExportFailure::Image("connection refused".into()).into())
    }

    fn location(&self) -> &str {
        "stub://kop.png"
    }
}

fn session(client: Arc<StubClient>, images: Option<Arc<StubImages>>) -> Arc<Session> {
    let pipeline = Pipeline::new(client, AppConfig::default())
        .unwrap()
        .with_date(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
    let images = images.map(|i| i as Arc<dyn HeaderImageSource>);
    Arc::new(Session::new(Arc::new(pipeline), images))
}

async fn wait_for_requesting(session: &Session) {
    while !matches!(session.state().await, SessionState::Requesting { .. }) {
        tokio::task::yield_now().await;
    }
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_budi_deep_learning_end_to_end() {
    let client = Arc::new(StubClient::replying(fixture("payloads/deep_learning_budi.json")));
    let images = Arc::new(StubImages::unreachable());
    let session = session(client.clone(), Some(images.clone()));

    let submission = session
        .submit(&budi(), DocumentVariant::DeepLearning)
        .await
        .unwrap();
    let document = match submission {
        Submission::Rendered(doc) => doc,
        other => panic!("expected rendered document, got {:?}", other),
    };

    let prompt = client.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("total 180 menit"));
    assert!(prompt.contains("Kreativitas"));
    assert!(prompt.contains("Kolaborasi"));
    assert!(!prompt.contains("Kemandirian"));

    let profile = document.view.table_after("Dimensi Profil Lulusan").unwrap();
    assert_eq!(profile.class, TableClass::Content);
    assert_eq!(profile.rows.len(), 2);
    assert_eq!(document.trace.pipeline_id(), "build→generate→normalize→adapt→render");

    // letterhead fetch fails, export still succeeds without it
    let pdf = session.export(ExportFormat::Pdf).await.unwrap();
    assert!(pdf.bytes.starts_with(b"%PDF"));
    assert_eq!(pdf.file_name, "modul-ajar-Matematika.pdf");
    assert_eq!(images.fetches.load(Ordering::SeqCst), 1);

    let status = session.status().await;
    assert_eq!(status.state, "rendered");
    assert_eq!(status.variant, Some(DocumentVariant::DeepLearning));
}

#[tokio::test]
async fn test_standard_module_exports_every_format() {
    let client = Arc::new(StubClient::replying(fixture("payloads/standard_budi.json")));
    let session = session(client, Some(Arc::new(StubImages::letterhead())));
    session
        .submit(&budi(), DocumentVariant::StandardModule)
        .await
        .unwrap();

    for format in ExportFormat::ALL {
        let artifact = session.export(format).await.unwrap();
        assert_eq!(artifact.format, format);
        assert!(artifact.file_name.starts_with("Modul_Ajar_Standar_Matematika."));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_exports_share_one_document() {
    let client = Arc::new(StubClient::replying(fixture("payloads/standard_budi.json")));
    let session = session(client, Some(Arc::new(StubImages::letterhead())));
    session
        .submit(&budi(), DocumentVariant::StandardModule)
        .await
        .unwrap();

    let (pdf, docx, text) = tokio::join!(
        session.export(ExportFormat::Pdf),
        session.export(ExportFormat::Docx),
        session.export(ExportFormat::Text),
    );
    assert!(pdf.unwrap().bytes.starts_with(b"%PDF"));
    assert!(docx.unwrap().bytes.starts_with(b"PK"));
    assert!(!text.unwrap().bytes.is_empty());
    assert_eq!(session.status().await.state, "rendered");
}

#[tokio::test]
async fn test_legacy_markdown_flow() {
    let client = Arc::new(StubClient::replying(fixture("payloads/legacy_budi.md")));
    let session = session(client, None);
    session.submit(&budi(), DocumentVariant::Legacy).await.unwrap();

    let text = session.export(ExportFormat::Text).await.unwrap();
    let text = String::from_utf8(text.bytes).unwrap();
    assert!(text.contains("MODUL AJAR"));
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_malformed_json_never_builds_a_document() {
    let client = Arc::new(StubClient::replying("```json\n{not valid}\n```"));
    let session = session(client, None);

    let err = session
        .submit(&budi(), DocumentVariant::DeepLearning)
        .await
        .unwrap_err();
    assert!(matches!(err, ModulError::MalformedResponse { .. }));
    assert!(session.document().await.is_none());

    match session.state().await {
        SessionState::Failed(failure) => {
            assert_eq!(failure.code, "malformed_response");
            assert!(failure.retryable);
        }
        other => panic!("expected failed state, got {:?}", other),
    }
    assert!(matches!(
        session.export(ExportFormat::Pdf).await,
        Err(ModulError::ExportFailed(ExportFailure::NothingToExport))
    ));
}

#[tokio::test]
async fn test_generation_failure_is_surfaced() {
    let client = Arc::new(StubClient::failing(GenerationFailure::RateLimited(
        "quota".into(),
    )));
    let session = session(client, None);

    let err = session
        .submit(&budi(), DocumentVariant::StandardModule)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "generation_failed");
    assert_eq!(session.status().await.state, "failed");
}

#[tokio::test]
async fn test_invalid_form_keeps_previous_document() {
    let client = Arc::new(StubClient::replying(fixture("payloads/deep_learning_budi.json")));
    let session = session(client.clone(), None);
    session
        .submit(&budi(), DocumentVariant::DeepLearning)
        .await
        .unwrap();

    let mut bad = budi();
    bad.hours_per_meeting = "0".into();
    let err = session
        .submit(&bad, DocumentVariant::DeepLearning)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_input");
    assert!(session.document().await.is_some());
    assert_eq!(client.prompts.lock().unwrap().len(), 1);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_submission_while_busy_is_ignored() {
    let gate = Arc::new(Notify::new());
    let client = Arc::new(
        StubClient::replying(fixture("payloads/deep_learning_budi.json")).gated(gate.clone()),
    );
    let session = session(client.clone(), None);

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit(&budi(), DocumentVariant::DeepLearning).await }
    });
    wait_for_requesting(&session).await;

    let second = session
        .submit(&budi(), DocumentVariant::DeepLearning)
        .await
        .unwrap();
    assert!(matches!(second, Submission::Ignored));

    gate.notify_one();
    let first = first.await.unwrap().unwrap();
    assert!(matches!(first, Submission::Rendered(_)));
    assert_eq!(client.prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reset_abandons_pending_result() {
    let gate = Arc::new(Notify::new());
    let client = Arc::new(
        StubClient::replying(fixture("payloads/deep_learning_budi.json")).gated(gate.clone()),
    );
    let session = session(client, None);

    let pending = tokio::spawn({
        let session = session.clone();
        async move { session.submit(&budi(), DocumentVariant::DeepLearning).await }
    });
    wait_for_requesting(&session).await;

    session.reset().await;
    gate.notify_one();

    let outcome = pending.await.unwrap().unwrap();
    assert!(matches!(outcome, Submission::Abandoned));
    assert!(session.document().await.is_none());
    assert_eq!(session.status().await.state, "idle");
}

#[tokio::test]
async fn test_pending_generation_is_never_idle() {
    let gate = Arc::new(Notify::new());
    let client = Arc::new(
        StubClient::replying(fixture("payloads/deep_learning_budi.json")).gated(gate.clone()),
    );
    let session = session(client, None);

    let pending = tokio::spawn({
        let session = session.clone();
        async move { session.submit(&budi(), DocumentVariant::DeepLearning).await }
    });
    wait_for_requesting(&session).await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(session.idle_for().await, std::time::Duration::ZERO);

    gate.notify_one();
    pending.await.unwrap().unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(session.idle_for().await >= std::time::Duration::from_millis(20));
}

#[tokio::test]
async fn test_letterhead_cached_until_reset() {
    let client = Arc::new(StubClient::replying(fixture("payloads/deep_learning_budi.json")));
    let images = Arc::new(StubImages::letterhead());
    let session = session(client, Some(images.clone()));
    session
        .submit(&budi(), DocumentVariant::DeepLearning)
        .await
        .unwrap();

    session.export(ExportFormat::Pdf).await.unwrap();
    session.export(ExportFormat::Docx).await.unwrap();
    session.export(ExportFormat::Text).await.unwrap();
    assert_eq!(images.fetches.load(Ordering::SeqCst), 1);

    session.reset().await;
    session
        .submit(&budi(), DocumentVariant::DeepLearning)
        .await
        .unwrap();
    session.export(ExportFormat::Html).await.unwrap();
    assert_eq!(images.fetches.load(Ordering::SeqCst), 2);
}
