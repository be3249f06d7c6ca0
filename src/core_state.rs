//! Shared process state.
//!
//! `CoreState` is built once in `run()` and shared behind an `Arc` by the
//! HTTP layer and the extraction worker. Every external client sits behind a
//! trait object so tests can substitute their own.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::pipeline::extraction::{ExtractionQueue, Transcriber, WhisperClient};
use crate::pipeline::llm::{GeminiClient, LlmClient};
use crate::pipeline::report::{ReportGenerator, Sleeper, TokioSleeper};
use crate::storage::{LocalObjectStore, ObjectStore, SupabaseStorage};

/// External clients the pipelines depend on.
pub struct Services {
    pub llm: Arc<dyn LlmClient>,
    pub transcriber: Arc<dyn Transcriber>,
    pub store: Arc<dyn ObjectStore>,
    pub sleeper: Arc<dyn Sleeper>,
}

impl Services {
    /// Production clients. Supabase storage is used only when both URL and
    /// service key are configured.
    pub fn from_config(config: &Config) -> Result<Self, CoreError> {
        let llm = GeminiClient::new(
            &config.gemini_base_url,
            config.google_api_key.clone(),
            &config.gemini_model,
            config.llm_timeout_secs,
        )
        .map_err(|e| CoreError::Setup(format!("Gemini client: {e}")))?;

        let transcriber = WhisperClient::new(
            &config.openai_base_url,
            config.openai_api_key.clone(),
            config.llm_timeout_secs,
        )
        .map_err(|e| CoreError::Setup(format!("transcription client: {e}")))?;

        let store: Arc<dyn ObjectStore> = match config.supabase() {
            Some((url, key)) => {
                tracing::info!(url, bucket = %config.storage_bucket, "Using Supabase object storage");
                Arc::new(
                    SupabaseStorage::new(url, key, &config.storage_bucket, config.llm_timeout_secs)
                        .map_err(|e| CoreError::Setup(format!("Supabase storage: {e}")))?,
                )
            }
            None => {
                let root = config.objects_dir();
                tracing::info!(root = %root.display(), "Using local object storage");
                Arc::new(LocalObjectStore::new(root))
            }
        };

        Ok(Self {
            llm: Arc::new(llm),
            transcriber: Arc::new(transcriber),
            store,
            sleeper: Arc::new(TokioSleeper),
        })
    }
}

pub struct CoreState {
    pub config: Config,
    db_path: PathBuf,
    llm: Arc<dyn LlmClient>,
    transcriber: Arc<dyn Transcriber>,
    store: Arc<dyn ObjectStore>,
    sleeper: Arc<dyn Sleeper>,
    extraction_queue: ExtractionQueue,
    /// Reports with a generation in flight.
    generating: Mutex<HashSet<Uuid>>,
}

impl CoreState {
    pub fn new(config: Config, services: Services, extraction_queue: ExtractionQueue) -> Self {
        let db_path = config.database_path();
        Self {
            config,
            db_path,
            llm: services.llm,
            transcriber: services.transcriber,
            store: services.store,
            sleeper: services.sleeper,
            extraction_queue,
            generating: Mutex::new(HashSet::new()),
        }
    }

    /// Open a connection to the application database.
    ///
    /// Connections are cheap and must not be held across an `.await`.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    pub fn llm(&self) -> &dyn LlmClient {
        self.llm.as_ref()
    }

    pub fn transcriber(&self) -> &dyn Transcriber {
        self.transcriber.as_ref()
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn extraction_queue(&self) -> &ExtractionQueue {
        &self.extraction_queue
    }

    /// Report generator configured with the process fan-out and sleeper.
    pub fn report_generator(&self) -> ReportGenerator {
        ReportGenerator::new(self.llm.clone())
            .with_fan_out(self.config.fan_out())
            .with_sleeper(self.sleeper.clone())
    }

    /// Claim `report_id` for generation.
    ///
    /// Returns `None` when a generation of the same report is already running.
    /// The claim is released when the guard drops.
    pub fn begin_generation(&self, report_id: Uuid) -> Result<Option<GenerationGuard<'_>>, CoreError> {
        let mut generating = self.generating.lock().map_err(|_| CoreError::LockPoisoned)?;
        if !generating.insert(report_id) {
            return Ok(None);
        }
        Ok(Some(GenerationGuard {
            core: self,
            report_id,
        }))
    }

    pub fn is_generating(&self, report_id: &Uuid) -> bool {
        self.generating
            .lock()
            .map(|g| g.contains(report_id))
            .unwrap_or(false)
    }
}

/// In-flight report generation. Dropping releases the claim.
pub struct GenerationGuard<'a> {
    core: &'a CoreState,
    report_id: Uuid,
}

impl Drop for GenerationGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut generating) = self.core.generating.lock() {
            generating.remove(&self.report_id);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock poisoned")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Failed to initialise {0}")]
    Setup(String),
}

/// Fully wired state over a temporary data directory.
#[cfg(test)]
pub(crate) struct TestCore {
    pub core: Arc<CoreState>,
    pub sleeper: Arc<crate::pipeline::report::RecordingSleeper>,
    pub queue_rx: tokio::sync::mpsc::UnboundedReceiver<Uuid>,
    _dir: tempfile::TempDir,
}

#[cfg(test)]
pub(crate) fn test_core(llm: Arc<dyn LlmClient>) -> TestCore {
    use crate::pipeline::extraction::StaticTranscriber;

    test_core_with(
        llm,
        Arc::new(StaticTranscriber::new("", Vec::new())),
    )
}

#[cfg(test)]
pub(crate) fn test_core_with(llm: Arc<dyn LlmClient>, transcriber: Arc<dyn Transcriber>) -> TestCore {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        data_dir: Some(dir.path().to_path_buf()),
        max_upload_mb: 1,
        ..Config::default()
    };
    let sleeper = Arc::new(crate::pipeline::report::RecordingSleeper::default());
    let services = Services {
        llm,
        transcriber,
        store: Arc::new(LocalObjectStore::new(config.objects_dir())),
        sleeper: sleeper.clone(),
    };
    let (queue, queue_rx) = ExtractionQueue::channel();
    let core = Arc::new(CoreState::new(config, services, queue));
    TestCore {
        core,
        sleeper,
        queue_rx,
        _dir: dir,
    }
}
