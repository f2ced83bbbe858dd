use crate::GenerationClient;
use async_trait::async_trait;
use modul_core::error::{excerpt, EXCERPT_CHARS};
use modul_core::{
    GenerationFailure, GenerationRequest, GenerationSettings, ModulError, ResponseFormat,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Chat-completions client for Groq and other OpenAI-compatible services
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: Client,
    endpoint: String,
    settings: GenerationSettings,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<JsonMode>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct JsonMode {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GroqClient {
    pub fn new(settings: GenerationSettings) -> Result<Self, ModulError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ModulError::Config(format!("http client: {}", e)))?;
        let endpoint = format!("{}/chat/completions", settings.base_url.trim_end_matches('/'));
        Ok(Self {
            http,
            endpoint,
            settings,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest) -> ChatCompletionRequest<'a> {
        let format = request.response_format();
        ChatCompletionRequest {
            model: &self.settings.model,
            messages: [ChatMessage {
                role: "user",
                content: request.prompt(),
            }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens_for(format),
            response_format: match format {
                ResponseFormat::Json => Some(JsonMode {
                    kind: "json_object",
                }),
                ResponseFormat::Text => None,
            },
        }
    }
}

#[async_trait]
impl GenerationClient for GroqClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ModulError> {
        if self.settings.api_key.is_empty() {
            return Err(GenerationFailure::Auth("API key is not configured".to_string()).into());
        }

        let started = Instant::now();
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.settings.api_key.expose())
            .json(&self.body(request))
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(network_error)?;
        if !(200..300).contains(&status) {
            warn!(
                status,
                body = %excerpt(&text, EXCERPT_CHARS),
                "generation request rejected"
            );
            return Err(classify_status(status, &text).into());
        }

        let completion: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| GenerationFailure::Http {
                status,
                body: format!("unreadable completion ({}): {}", e, excerpt(&text, EXCERPT_CHARS)),
            })?;
        if let Some(usage) = &completion.usage {
            info!(
                model = %self.settings.model,
                variant = %request.variant(),
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "generation completed"
            );
        }

        completion_text(completion).map_err(|failure| {
            warn!(%failure, variant = %request.variant(), "generation unusable");
            failure.into()
        })
    }

    fn model(&self) -> &str {
        &self.settings.model
    }
}

/// Map a non-success status to a failure kind, keeping the service's message.
fn classify_status(status: u16, body: &str) -> GenerationFailure {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| excerpt(body, EXCERPT_CHARS));
    match status {
        401 | 403 => GenerationFailure::Auth(message),
        429 => GenerationFailure::RateLimited(message),
        _ => GenerationFailure::Http {
            status,
            body: message,
        },
    }
}

fn completion_text(completion: ChatCompletionResponse) -> Result<String, GenerationFailure> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or(GenerationFailure::Empty)?;
    if choice.finish_reason.as_deref() == Some("length") {
        return Err(GenerationFailure::Truncated);
    }
    match choice.message.content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(GenerationFailure::Empty),
    }
}

fn network_error(e: reqwest::Error) -> ModulError {
    let detail = if e.is_timeout() {
        format!("timed out: {}", e)
    } else {
        e.to_string()
    };
    GenerationFailure::Network(detail).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use modul_core::{ApiKey, DocumentVariant};

    fn client() -> GroqClient {
        GroqClient::new(GenerationSettings {
            api_key: ApiKey::new("gsk_test"),
            ..Default::default()
        })
        .unwrap()
    }

    fn completion(value: serde_json::Value) -> ChatCompletionResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_json_variants_request_json_mode() {
        let client = client();
        let request = GenerationRequest::new(DocumentVariant::DeepLearning, "buat".into(), None);
        let body = serde_json::to_value(client.body(&request)).unwrap();

        assert_eq!(body["model"], "llama-3.3-70b-versatile");
        assert_eq!(body["max_tokens"], 8192);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "buat");
    }

    #[test]
    fn test_legacy_request_is_plain_text() {
        let client = client();
        let request = GenerationRequest::new(DocumentVariant::Legacy, "buat".into(), None);
        let body = serde_json::to_value(client.body(&request)).unwrap();

        assert_eq!(body["max_tokens"], 4096);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = GroqClient::new(GenerationSettings {
            base_url: "http://localhost:9000/v1/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9000/v1/chat/completions");
    }

    #[test]
    fn test_status_classification() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        assert_eq!(
            classify_status(401, body),
            GenerationFailure::Auth("Invalid API Key".into())
        );
        assert!(matches!(
            classify_status(429, "slow down"),
            GenerationFailure::RateLimited(m) if m == "slow down"
        ));
        assert_eq!(
            classify_status(503, "upstream"),
            GenerationFailure::Http {
                status: 503,
                body: "upstream".into()
            }
        );
    }

    #[test]
    fn test_completion_text_failures() {
        let truncated = completion(serde_json::json!({
            "choices": [{"message": {"content": "{\"a\":"}, "finish_reason": "length"}]
        }));
        assert_eq!(completion_text(truncated), Err(GenerationFailure::Truncated));

        let blank = completion(serde_json::json!({
            "choices": [{"message": {"content": "  \n"}, "finish_reason": "stop"}]
        }));
        assert_eq!(completion_text(blank), Err(GenerationFailure::Empty));

        let none = completion(serde_json::json!({ "choices": [] }));
        assert_eq!(completion_text(none), Err(GenerationFailure::Empty));

        let ok = completion(serde_json::json!({
            "choices": [{"message": {"content": "# Modul"}, "finish_reason": "stop"}]
        }));
        assert_eq!(completion_text(ok).unwrap(), "# Modul");
    }
}
