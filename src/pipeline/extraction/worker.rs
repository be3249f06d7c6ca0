//! Background extraction worker.
//!
//! Uploads push file ids onto an [`ExtractionQueue`]; a single worker task
//! drains it so the HTTP request returns as soon as the row is `pending`.
//! Pattern mirrors the API server: spawn, return a handle with a shutdown
//! channel.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::orchestrator::process_file_extraction;
use super::ExtractionError;
use crate::core_state::CoreState;
use crate::db::repository::{list_file_ids_by_status, reset_extraction_status, reset_report_status};
use crate::models::enums::{ExtractionStatus, ReportStatus};

#[derive(Clone)]
pub struct ExtractionQueue {
    tx: mpsc::UnboundedSender<Uuid>,
}

impl ExtractionQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Uuid>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, file_id: Uuid) -> Result<(), ExtractionError> {
        self.tx.send(file_id).map_err(|_| ExtractionError::QueueClosed)
    }
}

/// Handle to the running worker.
pub struct ExtractionWorker {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ExtractionWorker {
    /// Stop after the file currently being processed, then wait for the task.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.handle.await {
            tracing::error!("Extraction worker task failed: {e}");
        }
    }
}

pub fn start_extraction_worker(
    core: Arc<CoreState>,
    mut rx: mpsc::UnboundedReceiver<Uuid>,
) -> ExtractionWorker {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        tracing::info!("Extraction worker started");
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                next = rx.recv() => match next {
                    Some(file_id) => {
                        // Failures are recorded on the row by the orchestrator
                        if let Err(e) = process_file_extraction(&core, file_id).await {
                            tracing::warn!(file_id = %file_id, error = %e, "Extraction job ended with error");
                        }
                    }
                    None => break,
                },
            }
        }
        tracing::info!("Extraction worker stopped");
    });

    ExtractionWorker {
        shutdown_tx: Some(shutdown_tx),
        handle,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileSummary {
    pub files_reset: usize,
    pub reports_reset: usize,
    pub files_enqueued: usize,
}

/// Recover work abandoned by a previous process.
///
/// `processing` files go back to `pending`, `generating` reports back to
/// `draft`, and every pending file is queued again.
pub fn reconcile_stalled_work(core: &CoreState) -> Result<ReconcileSummary, ExtractionError> {
    let conn = core.open_db()?;
    let files_reset =
        reset_extraction_status(&conn, ExtractionStatus::Processing, ExtractionStatus::Pending)?;
    let reports_reset = reset_report_status(&conn, ReportStatus::Generating, ReportStatus::Draft)?;

    let pending = list_file_ids_by_status(&conn, ExtractionStatus::Pending)?;
    for file_id in &pending {
        core.extraction_queue().enqueue(*file_id)?;
    }

    let summary = ReconcileSummary {
        files_reset,
        reports_reset,
        files_enqueued: pending.len(),
    };
    if summary != ReconcileSummary::default() {
        tracing::info!(
            files_reset,
            reports_reset,
            files_enqueued = summary.files_enqueued,
            "Recovered stalled work"
        );
    }
    Ok(summary)
}
