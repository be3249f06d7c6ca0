use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::TranscriptSegment;

use super::ExtractionError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const WHISPER_MODEL: &str = "whisper-1";

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Whole seconds, from the end of the last segment.
    pub fn duration_secs(&self) -> Option<u64> {
        self.segments.last().map(|s| s.end.max(0.0).round() as u64)
    }
}

/// Speech-to-text for audio and video uploads.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> Result<Transcript, ExtractionError>;
}

/// OpenAI Whisper transcription client.
pub struct WhisperClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl WhisperClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ExtractionError::Transcription(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
        })
    }
}

#[derive(Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<TranscriptSegment>,
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> Result<Transcript, ExtractionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ExtractionError::MissingTranscriptionKey)?;

        let size = bytes.len();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|e| ExtractionError::Transcription(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", WHISPER_MODEL)
            .text("response_format", "verbose_json");

        tracing::debug!(file_name, size, "Sending file for transcription");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ExtractionError::Transcription(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Transcription(format!(
                "status {}: {body}",
                status.as_u16()
            )));
        }

        let parsed: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| ExtractionError::Transcription(e.to_string()))?;

        Ok(Transcript {
            text: parsed.text,
            segments: parsed.segments,
        })
    }
}

/// Returns a fixed transcript and records the file names it was given.
#[cfg(test)]
pub struct StaticTranscriber {
    pub transcript: Transcript,
    pub seen: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl StaticTranscriber {
    pub fn new(text: &str, segments: Vec<TranscriptSegment>) -> Self {
        Self {
            transcript: Transcript {
                text: text.to_string(),
                segments,
            },
            seen: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Transcriber for StaticTranscriber {
    async fn transcribe(
        &self,
        _bytes: Vec<u8>,
        file_name: &str,
        _mime: &str,
    ) -> Result<Transcript, ExtractionError> {
        self.seen.lock().unwrap().push(file_name.to_string());
        Ok(self.transcript.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Multipart, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    type Fields = Arc<Mutex<Vec<(String, String)>>>;

    async fn spawn_stub(status: StatusCode, reply: serde_json::Value) -> (String, Fields) {
        let fields: Fields = Arc::default();
        let app = Router::new()
            .route(
                "/audio/transcriptions",
                post(
                    move |State(fields): State<Fields>, headers: HeaderMap, mut multipart: Multipart| {
                        let reply = reply.clone();
                        async move {
                            let auth = headers
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or_default()
                                .to_string();
                            fields.lock().unwrap().push(("authorization".into(), auth));
                            while let Some(field) = multipart.next_field().await.unwrap() {
                                let name = field.name().unwrap_or_default().to_string();
                                let file_name = field.file_name().map(String::from);
                                let value = match file_name {
                                    Some(file_name) => file_name,
                                    None => field.text().await.unwrap(),
                                };
                                fields.lock().unwrap().push((name, value));
                            }
                            (status, Json(reply))
                        }
                    },
                ),
            )
            .with_state(fields.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), fields)
    }

    #[tokio::test]
    async fn sends_whisper_form_and_parses_segments() {
        let (base, fields) = spawn_stub(
            StatusCode::OK,
            serde_json::json!({
                "text": "Welcome to the course.",
                "segments": [
                    {"id": 0, "start": 0.0, "end": 4.2, "text": "Welcome"},
                    {"id": 1, "start": 4.2, "end": 61.6, "text": " to the course."}
                ]
            }),
        )
        .await;
        let client = WhisperClient::new(&base, Some("sk-test".into()), 5).unwrap();

        let transcript = client
            .transcribe(vec![1, 2, 3], "intro.mp3", "audio/mpeg")
            .await
            .unwrap();

        assert_eq!(transcript.text, "Welcome to the course.");
        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.duration_secs(), Some(62));

        let fields = fields.lock().unwrap().clone();
        assert!(fields.contains(&("authorization".into(), "Bearer sk-test".into())));
        assert!(fields.contains(&("file".into(), "intro.mp3".into())));
        assert!(fields.contains(&("model".into(), "whisper-1".into())));
        assert!(fields.contains(&("response_format".into(), "verbose_json".into())));
    }

    #[tokio::test]
    async fn error_status_is_transcription_error() {
        let (base, _) = spawn_stub(StatusCode::UNAUTHORIZED, serde_json::json!({"error": "bad key"})).await;
        let client = WhisperClient::new(&base, Some("sk-bad".into()), 5).unwrap();
        let err = client.transcribe(vec![0], "a.wav", "audio/wav").await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = WhisperClient::new("http://127.0.0.1:9", None, 5).unwrap();
        let err = client.transcribe(vec![0], "a.wav", "audio/wav").await.unwrap_err();
        assert!(matches!(err, ExtractionError::MissingTranscriptionKey));
    }

    #[test]
    fn duration_absent_without_segments() {
        let transcript = Transcript {
            text: "hi".into(),
            segments: vec![],
        };
        assert_eq!(transcript.duration_secs(), None);
    }
}
