//! Progress tracking for long-running batch generation jobs.
//!
//! Batch runs execute outside the request/response cycle; callers observe
//! them only by polling the store. The components here form the write
//! path of that store:
//! - `ProgressState`: a clonable handle holding the MPSC sender, injected
//!   into the Actix application state in `main.rs`.
//! - `BatchEvent`/`BatchUpdate`: messages a running batch job sends to
//!   report state changes.
//! - `start_progress_updater`: a long-running task that drains the channel
//!   and applies each event to SQLite.
//!
//! Routing every mutation through one task keeps a single writer per
//! batch while any number of status polls read concurrently.

use crate::config::AppConfig;
use crate::db;
use common::model::certificate::Certificate;
use log::error;
use tokio::sync::mpsc;

/// Handle used by HTTP handlers and batch jobs to reach the progress
/// writer. Cheap to clone; shared as `web::Data`.
#[derive(Clone)]
pub struct ProgressState {
    pub tx: mpsc::Sender<BatchEvent>,
}

/// One progress event from a running batch job.
#[derive(Debug)]
pub struct BatchEvent {
    pub batch_id: String,
    pub update: BatchUpdate,
}

/// State change reported by a batch worker.
#[derive(Debug)]
pub enum BatchUpdate {
    /// Row processing is about to begin.
    Started,
    /// One row has been attempted. Carries the certificate record for the
    /// row (success or failure) and the counters after this row.
    Row {
        certificate: Certificate,
        processed: u32,
        generated: u32,
    },
    /// Every row was attempted and the archive was finalized.
    Completed { zip_path: String },
    /// The run aborted outside the per-row loop.
    Failed { error: String },
}

/// Starts the central progress updater task.
///
/// Spawned once from `main.rs`; listens until every sender is gone.
pub async fn start_progress_updater(config: AppConfig, mut rx: mpsc::Receiver<BatchEvent>) {
    while let Some(event) = rx.recv().await {
        if let Err(e) = apply(&config, &event) {
            error!("Failed to persist update for batch {}: {}", event.batch_id, e);
        }
    }
}

fn apply(config: &AppConfig, event: &BatchEvent) -> Result<(), String> {
    let conn = db::open(config).map_err(|e| e.to_string())?;
    match &event.update {
        BatchUpdate::Started => {
            db::batches::mark_processing(&conn, &event.batch_id).map_err(|e| e.to_string())?;
        }
        BatchUpdate::Row {
            certificate,
            processed,
            generated,
        } => {
            db::certificates::insert(&conn, certificate).map_err(|e| e.to_string())?;
            db::batches::record_progress(&conn, &event.batch_id, *processed, *generated)
                .map_err(|e| e.to_string())?;
        }
        BatchUpdate::Completed { zip_path } => {
            db::batches::mark_completed(&conn, &event.batch_id, zip_path)
                .map_err(|e| e.to_string())?;
        }
        BatchUpdate::Failed { error } => {
            db::batches::mark_failed(&conn, &event.batch_id, error).map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}
