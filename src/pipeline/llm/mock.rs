use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::types::{GenerationRequest, LlmClient};
use super::LlmError;

type Responder = Box<dyn Fn(&GenerationRequest) -> Result<String, LlmError> + Send + Sync>;

/// Mock LLM client for testing and offline development.
///
/// Answers from a scripted queue first, then from the responder.
/// Every request is recorded.
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    responder: Responder,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: AtomicUsize,
}

impl MockLlmClient {
    /// Always answer with `response`.
    pub fn new(response: &str) -> Self {
        let response = response.to_string();
        Self::from_fn(move |_| Ok(response.clone()))
    }

    /// Always fail with `error`.
    pub fn failing(error: LlmError) -> Self {
        Self::from_fn(move |_| Err(error.clone()))
    }

    pub fn from_fn(
        f: impl Fn(&GenerationRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: Box::new(f),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue results returned (in order) before falling back to the responder.
    pub fn with_script(self, script: Vec<Result<String, LlmError>>) -> Self {
        if let Ok(mut queue) = self.script.lock() {
            queue.extend(script);
        }
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let scripted = self.script.lock().ok().and_then(|mut q| q.pop_front());
        match scripted {
            Some(result) => result,
            None => (self.responder)(request),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_configured_response() {
        let client = MockLlmClient::new("test response");
        let result = client.generate(&GenerationRequest::new("p")).await.unwrap();
        assert_eq!(result, "test response");
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn script_runs_before_responder() {
        let client = MockLlmClient::new("steady")
            .with_script(vec![Err(LlmError::RateLimited("slow down".into())), Ok("first".into())]);
        let req = GenerationRequest::new("p");

        assert!(matches!(client.generate(&req).await, Err(LlmError::RateLimited(_))));
        assert_eq!(client.generate(&req).await.unwrap(), "first");
        assert_eq!(client.generate(&req).await.unwrap(), "steady");
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn records_requests() {
        let client = MockLlmClient::failing(LlmError::EmptyResponse);
        let _ = client.generate(&GenerationRequest::new("one").json()).await;
        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].json_output);
    }
}
