//! Client behaviour against a local stand-in for the generation service.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use modul_client::{
    FileImageSource, GenerationClient, GroqClient, HeaderImageSource, HttpImageSource,
    MAX_IMAGE_BYTES,
};
use modul_core::{
    ApiKey, DocumentVariant, ExportFailure, GenerationFailure, GenerationRequest,
    GenerationSettings, ModulError,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Seen {
    body: Arc<Mutex<Option<Value>>>,
    auth: Arc<Mutex<Option<String>>>,
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Chat endpoint answering every call with `status` and `reply`
async fn completions(status: StatusCode, reply: Value) -> (String, Seen) {
    let seen = Seen::default();
    let router = Router::new()
        .route(
            "/v1/chat/completions",
            post(
                move |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| {
                    let reply = reply.clone();
                    async move {
                        *seen.body.lock().unwrap() = Some(body);
                        *seen.auth.lock().unwrap() = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        (status, Json(reply))
                    }
                },
            ),
        )
        .with_state(seen.clone());
    let base = serve(router).await;
    (format!("{}/v1", base), seen)
}

fn client(base_url: &str, key: &str) -> GroqClient {
    GroqClient::new(GenerationSettings {
        base_url: base_url.to_string(),
        api_key: ApiKey::new(key),
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap()
}

fn request(variant: DocumentVariant) -> GenerationRequest {
    GenerationRequest::new(variant, "Buatkan modul ajar".to_string(), None)
}

fn generation_failure(err: ModulError) -> GenerationFailure {
    match err {
        ModulError::GenerationFailed(failure) => failure,
        other => panic!("expected generation failure, got {:?}", other),
    }
}

// ============================================================================
// Generation
// ============================================================================

#[tokio::test]
async fn test_generate_returns_raw_content() {
    let (base, seen) = completions(
        StatusCode::OK,
        json!({
            "choices": [{"message": {"role": "assistant", "content": "```json\n{}\n```"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 8, "total_tokens": 128}
        }),
    )
    .await;

    let text = client(&base, "gsk_test")
        .generate(&request(DocumentVariant::StandardModule))
        .await
        .unwrap();
    assert_eq!(text, "```json\n{}\n```");

    let body = seen.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["temperature"].as_f64().unwrap() as f32, 0.7);
    assert_eq!(body["response_format"]["type"], "json_object");
    assert_eq!(body["messages"][0]["content"], "Buatkan modul ajar");
    assert_eq!(seen.auth.lock().unwrap().as_deref(), Some("Bearer gsk_test"));
}

#[tokio::test]
async fn test_rejections_map_to_failure_kinds() {
    let (base, _) = completions(
        StatusCode::UNAUTHORIZED,
        json!({"error": {"message": "Invalid API Key"}}),
    )
    .await;
    let err = client(&base, "gsk_wrong")
        .generate(&request(DocumentVariant::Legacy))
        .await
        .unwrap_err();
    assert!(!err.is_retryable());
    assert_eq!(
        generation_failure(err),
        GenerationFailure::Auth("Invalid API Key".into())
    );

    let (base, _) = completions(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"message": "Rate limit reached"}}),
    )
    .await;
    let err = client(&base, "gsk_test")
        .generate(&request(DocumentVariant::Legacy))
        .await
        .unwrap_err();
    assert!(matches!(generation_failure(err), GenerationFailure::RateLimited(_)));

    let (base, _) = completions(StatusCode::BAD_GATEWAY, json!({"oops": true})).await;
    let err = client(&base, "gsk_test")
        .generate(&request(DocumentVariant::Legacy))
        .await
        .unwrap_err();
    assert!(matches!(
        generation_failure(err),
        GenerationFailure::Http { status: 502, .. }
    ));
}

#[tokio::test]
async fn test_truncated_completion_is_failure() {
    let (base, _) = completions(
        StatusCode::OK,
        json!({"choices": [{"message": {"content": "{\"informasiUmum\":"}, "finish_reason": "length"}]}),
    )
    .await;
    let err = client(&base, "gsk_test")
        .generate(&request(DocumentVariant::DeepLearning))
        .await
        .unwrap_err();
    assert_eq!(generation_failure(err), GenerationFailure::Truncated);
}

#[tokio::test]
async fn test_missing_key_fails_before_network() {
    // Nothing listens on port 9; a network attempt would be a Network failure.
    let err = client("http://127.0.0.1:9/v1", "")
        .generate(&request(DocumentVariant::Legacy))
        .await
        .unwrap_err();
    assert!(matches!(generation_failure(err), GenerationFailure::Auth(_)));
}

#[tokio::test]
async fn test_unreachable_service_is_network_failure() {
    let err = client("http://127.0.0.1:9/v1", "gsk_test")
        .generate(&request(DocumentVariant::Legacy))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(generation_failure(err), GenerationFailure::Network(_)));
}

// ============================================================================
// Header image
// ============================================================================

#[tokio::test]
async fn test_http_image_source() {
    let router = Router::new()
        .route("/kop.png", get(|| async { vec![0x89u8, b'P', b'N', b'G'] }))
        .route("/missing.png", get(|| async { StatusCode::NOT_FOUND }));
    let base = serve(router).await;

    let ok = HttpImageSource::new(format!("{}/kop.png", base), Duration::from_secs(5)).unwrap();
    assert_eq!(ok.fetch().await.unwrap(), vec![0x89, b'P', b'N', b'G']);

    let missing =
        HttpImageSource::new(format!("{}/missing.png", base), Duration::from_secs(5)).unwrap();
    assert!(matches!(
        missing.fetch().await,
        Err(ModulError::ExportFailed(ExportFailure::Image(_)))
    ));
}

#[tokio::test]
async fn test_oversized_image_is_refused() {
    let router = Router::new().route(
        "/besar.png",
        get(|| async { vec![0u8; MAX_IMAGE_BYTES + 1] }),
    );
    let base = serve(router).await;

    let source = HttpImageSource::new(format!("{}/besar.png", base), Duration::from_secs(5)).unwrap();
    match source.fetch().await {
        Err(ModulError::ExportFailed(ExportFailure::Image(detail))) => {
            assert!(detail.contains("exceeds"), "{}", detail)
        }
        other => panic!("expected image failure, got {:?}", other.map(|b| b.len())),
    }
}

#[tokio::test]
async fn test_file_image_source() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let fixtures = std::path::Path::new(&manifest_dir).join("../../testing/fixtures/images");

    let source = FileImageSource::new(fixtures.join("letterhead.png"));
    let bytes = source.fetch().await.unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));

    let missing = FileImageSource::new(fixtures.join("nope.png"));
    assert!(missing.fetch().await.is_err());
}
