use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{GenerationRequest, LlmClient};
use super::LlmError;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
                response_mime_type: request.json_output.then_some("application/json"),
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    LlmError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => LlmError::RateLimited(body),
                503 => LlmError::Unavailable(body),
                code => LlmError::Provider { status: code, body },
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    #[derive(Clone, Default)]
    struct Captured {
        path: Arc<Mutex<Option<String>>>,
        body: Arc<Mutex<Option<serde_json::Value>>>,
        key: Arc<Mutex<Option<String>>>,
    }

    /// Serve `reply` for every generateContent call on a loopback port.
    async fn spawn_stub(status: StatusCode, reply: serde_json::Value) -> (String, Captured) {
        let captured = Captured::default();
        let app = Router::new()
            .route(
                "/models/:call",
                post(
                    move |State(cap): State<Captured>,
                          Path(call): Path<String>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| {
                        let reply = reply.clone();
                        async move {
                            *cap.path.lock().unwrap() = Some(call);
                            *cap.body.lock().unwrap() = Some(body);
                            *cap.key.lock().unwrap() = headers
                                .get("x-goog-api-key")
                                .and_then(|v| v.to_str().ok())
                                .map(String::from);
                            (status, Json(reply))
                        }
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), captured)
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client =
            GeminiClient::new("http://127.0.0.1:9", Some("  ".into()), "gemini-test", 5).unwrap();
        assert!(!client.has_api_key());
        let err = client
            .generate(&GenerationRequest::new("hi"))
            .await
            .unwrap_err();
        assert_eq!(err, LlmError::MissingApiKey);
    }

    #[tokio::test]
    async fn concatenates_parts_and_sends_generation_config() {
        let (base, captured) = spawn_stub(
            StatusCode::OK,
            serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]
            }),
        )
        .await;
        let client = GeminiClient::new(&base, Some("k-123".into()), "gemini-test", 5).unwrap();

        let request = GenerationRequest::new("analyze")
            .temperature(0.7)
            .max_output_tokens(4096)
            .json();
        let text = client.generate(&request).await.unwrap();
        assert_eq!(text, "{\"a\":1}");

        assert_eq!(
            captured.path.lock().unwrap().as_deref(),
            Some("gemini-test:generateContent")
        );
        assert_eq!(captured.key.lock().unwrap().as_deref(), Some("k-123"));
        let body = captured.body.lock().unwrap().clone().unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "analyze");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 4096);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[tokio::test]
    async fn plain_request_omits_mime_type() {
        let (base, captured) = spawn_stub(
            StatusCode::OK,
            serde_json::json!({"candidates": [{"content": {"parts": [{"text": "ok"}]}}]}),
        )
        .await;
        let client = GeminiClient::new(&base, Some("k".into()), "m", 5).unwrap();
        client.generate(&GenerationRequest::new("x")).await.unwrap();

        let body = captured.body.lock().unwrap().clone().unwrap();
        assert!(body["generationConfig"].get("responseMimeType").is_none());
        assert!(body["generationConfig"].get("temperature").is_none());
    }

    #[tokio::test]
    async fn status_429_maps_to_rate_limited() {
        let (base, _) = spawn_stub(
            StatusCode::TOO_MANY_REQUESTS,
            serde_json::json!({"error": {"code": 429}}),
        )
        .await;
        let client = GeminiClient::new(&base, Some("k".into()), "m", 5).unwrap();
        let err = client.generate(&GenerationRequest::new("x")).await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimited(_)));
    }

    #[tokio::test]
    async fn status_503_maps_to_unavailable() {
        let (base, _) =
            spawn_stub(StatusCode::SERVICE_UNAVAILABLE, serde_json::json!({})).await;
        let client = GeminiClient::new(&base, Some("k".into()), "m", 5).unwrap();
        let err = client.generate(&GenerationRequest::new("x")).await.unwrap_err();
        assert!(matches!(err, LlmError::Unavailable(_)));
    }

    #[tokio::test]
    async fn other_errors_keep_status() {
        let (base, _) = spawn_stub(StatusCode::BAD_REQUEST, serde_json::json!({})).await;
        let client = GeminiClient::new(&base, Some("k".into()), "m", 5).unwrap();
        let err = client.generate(&GenerationRequest::new("x")).await.unwrap_err();
        assert!(matches!(err, LlmError::Provider { status: 400, .. }));
    }

    #[tokio::test]
    async fn no_candidates_is_empty_response() {
        let (base, _) = spawn_stub(StatusCode::OK, serde_json::json!({"candidates": []})).await;
        let client = GeminiClient::new(&base, Some("k".into()), "m", 5).unwrap();
        let err = client.generate(&GenerationRequest::new("x")).await.unwrap_err();
        assert_eq!(err, LlmError::EmptyResponse);
    }

    #[test]
    fn trims_trailing_slash() {
        let client = GeminiClient::new("http://localhost:1/v1beta/", None, "m", 5).unwrap();
        assert_eq!(client.base_url, "http://localhost:1/v1beta");
        assert_eq!(client.model_name(), "m");
    }
}
