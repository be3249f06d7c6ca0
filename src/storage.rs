//! Object storage for uploaded offer files.
//!
//! [`LocalObjectStore`] keeps objects under the data directory;
//! [`SupabaseStorage`] talks to the Supabase Storage REST API.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::pipeline::extraction::format::file_extension;

const SUFFIX_LEN: usize = 7;
const CACHE_CONTROL_SECS: u64 = 3600;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Storage provider returned error (status {status}): {body}")]
    Provider { status: u16, body: String },
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path`. Existing objects are never overwritten.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, StorageError>;

    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Time-limited URL for downloading `path`.
    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, StorageError>;

    /// Remove `path`. Removing a missing object succeeds.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}

/// `<workspace>/<offer>/<unix-millis>-<7 random chars>.<ext>`
pub fn build_storage_path(workspace_id: &Uuid, offer_id: &Uuid, file_name: &str, mime: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!(
        "{workspace_id}/{offer_id}/{}-{suffix}.{}",
        Utc::now().timestamp_millis(),
        file_extension(file_name, mime)
    )
}

/// Reject absolute paths and parent-directory components.
fn validate_object_path(path: &str) -> Result<(), StorageError> {
    let p = Path::new(path);
    let safe = !path.is_empty()
        && !path.contains('\\')
        && p.components().all(|c| matches!(c, Component::Normal(_)));
    if safe {
        Ok(())
    } else {
        Err(StorageError::InvalidPath(path.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════
// Local filesystem
// ═══════════════════════════════════════════════════════════

pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        validate_object_path(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
        {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(path.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok(path.to_string())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, StorageError> {
        let target = self.resolve(path)?;
        if !tokio::fs::try_exists(&target).await? {
            return Err(StorageError::NotFound(path.to_string()));
        }
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        Ok(format!("file://{}?expires={expires}", target.display()))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Supabase Storage
// ═══════════════════════════════════════════════════════════

/// Supabase Storage REST client authenticated with the service-role key.
pub struct SupabaseStorage {
    base_url: String,
    service_key: String,
    bucket: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl SupabaseStorage {
    pub fn new(
        base_url: &str,
        service_key: &str,
        bucket: &str,
        timeout_secs: u64,
    ) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StorageError::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            bucket: bucket.to_string(),
            client,
        })
    }

    fn object_url(&self, kind: &str, path: &str) -> String {
        format!("{}/storage/v1/{kind}/{}/{path}", self.base_url, self.bucket)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<reqwest::Response, StorageError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            404 => StorageError::NotFound(path.to_string()),
            409 => StorageError::AlreadyExists(path.to_string()),
            code => StorageError::Provider { status: code, body },
        })
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_object_path(path)?;
        let request = self
            .client
            .post(self.object_url("object", path))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, format!("max-age={CACHE_CONTROL_SECS}"))
            .header("x-upsert", "false")
            .body(bytes);
        self.send(request, path).await?;
        Ok(path.to_string())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        validate_object_path(path)?;
        let request = self.client.get(self.object_url("object/authenticated", path));
        let response = self.send(request, path).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, StorageError> {
        validate_object_path(path)?;
        let request = self
            .client
            .post(self.object_url("object/sign", path))
            .json(&serde_json::json!({ "expiresIn": ttl.as_secs() }));
        let response = self.send(request, path).await?;
        let signed: SignedUrlResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))?;
        Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        validate_object_path(path)?;
        let request = self
            .client
            .delete(format!("{}/storage/v1/object/{}", self.base_url, self.bucket))
            .json(&serde_json::json!({ "prefixes": [path] }));
        self.send(request, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::body::Bytes;
    use axum::extract::{OriginalUri, State};
    use axum::http::{HeaderMap, Method, StatusCode};
    use axum::routing::any;
    use axum::{Json, Router};

    #[test]
    fn storage_path_layout() {
        let ws = Uuid::new_v4();
        let offer = Uuid::new_v4();
        let path = build_storage_path(&ws, &offer, "Sales Deck.pdf", "application/pdf");

        let parts: Vec<&str> = path.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], ws.to_string());
        assert_eq!(parts[1], offer.to_string());
        let (stem, ext) = parts[2].rsplit_once('.').unwrap();
        assert_eq!(ext, "pdf");
        let (millis, suffix) = stem.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 7);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn rejects_unsafe_paths() {
        assert!(validate_object_path("a/b/c.pdf").is_ok());
        assert!(validate_object_path("../etc/passwd").is_err());
        assert!(validate_object_path("/abs/path").is_err());
        assert!(validate_object_path("a/../../b").is_err());
        assert!(validate_object_path("").is_err());
    }

    #[tokio::test]
    async fn local_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        let stored = store
            .upload("ws/offer/1-abc.txt", b"hello".to_vec(), "text/plain")
            .await
            .unwrap();
        assert_eq!(stored, "ws/offer/1-abc.txt");
        assert_eq!(store.download(&stored).await.unwrap(), b"hello");

        let url = store.signed_url(&stored, Duration::from_secs(7200)).await.unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.contains("?expires="));

        store.delete(&stored).await.unwrap();
        assert!(matches!(
            store.download(&stored).await,
            Err(StorageError::NotFound(_))
        ));
        store.delete(&stored).await.unwrap();
    }

    #[tokio::test]
    async fn local_store_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        store.upload("a/b.txt", b"one".to_vec(), "text/plain").await.unwrap();

        let err = store.upload("a/b.txt", b"two".to_vec(), "text/plain").await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(store.download("a/b.txt").await.unwrap(), b"one");
    }

    #[tokio::test]
    async fn local_signed_url_requires_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let err = store.signed_url("missing.pdf", Duration::from_secs(60)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[derive(Clone, Default)]
    struct Seen {
        requests: Arc<Mutex<Vec<(Method, String, Option<String>, Vec<u8>)>>>,
    }

    async fn spawn_stub() -> (String, Seen) {
        let seen = Seen::default();
        let app = Router::new()
            .route(
                "/*rest",
                any(
                    |State(seen): State<Seen>,
                     method: Method,
                     OriginalUri(uri): OriginalUri,
                     headers: HeaderMap,
                     body: Bytes| async move {
                        let key = headers
                            .get("apikey")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        let path = uri.path().to_string();
                        seen.requests
                            .lock()
                            .unwrap()
                            .push((method.clone(), path.clone(), key, body.to_vec()));

                        if path.contains("/object/sign/") {
                            (
                                StatusCode::OK,
                                Json(serde_json::json!({
                                    "signedURL": "/object/sign/offer-files/ws/o/f.pdf?token=abc"
                                })),
                            )
                        } else if path.ends_with("missing.pdf") {
                            (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "not found"})))
                        } else {
                            (StatusCode::OK, Json(serde_json::json!({"Key": "offer-files/ws/o/f.pdf"})))
                        }
                    },
                ),
            )
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    #[tokio::test]
    async fn supabase_requests_use_rest_layout() {
        let (base, seen) = spawn_stub().await;
        let store = SupabaseStorage::new(&base, "service-key", "offer-files", 5).unwrap();

        store
            .upload("ws/o/f.pdf", b"%PDF".to_vec(), "application/pdf")
            .await
            .unwrap();
        let url = store.signed_url("ws/o/f.pdf", Duration::from_secs(7200)).await.unwrap();
        store.delete("ws/o/f.pdf").await.unwrap();

        assert_eq!(
            url,
            format!("{base}/storage/v1/object/sign/offer-files/ws/o/f.pdf?token=abc")
        );

        let requests = seen.requests.lock().unwrap().clone();
        assert_eq!(requests[0].0, Method::POST);
        assert_eq!(requests[0].1, "/storage/v1/object/offer-files/ws/o/f.pdf");
        assert_eq!(requests[0].2.as_deref(), Some("service-key"));
        assert_eq!(requests[0].3, b"%PDF");

        let sign_body: serde_json::Value = serde_json::from_slice(&requests[1].3).unwrap();
        assert_eq!(sign_body["expiresIn"], 7200);

        assert_eq!(requests[2].0, Method::DELETE);
        assert_eq!(requests[2].1, "/storage/v1/object/offer-files");
        let delete_body: serde_json::Value = serde_json::from_slice(&requests[2].3).unwrap();
        assert_eq!(delete_body["prefixes"][0], "ws/o/f.pdf");
    }

    #[tokio::test]
    async fn supabase_404_is_not_found() {
        let (base, _) = spawn_stub().await;
        let store = SupabaseStorage::new(&base, "k", "offer-files", 5).unwrap();
        let err = store.download("ws/o/missing.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
