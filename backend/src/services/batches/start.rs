//! # Batch Generation Service
//!
//! This module provides the `POST /api/batches/generate` endpoint, which
//! initiates a background job producing one PDF certificate per dataset
//! row.
//!
//! ## Workflow:
//!
//! 1.  **HTTP Request**: The `process` handler receives a multipart form
//!     with a `json` field (`template_id`, optional batch `name`, the
//!     column → placeholder `mappings`) and a `file` field carrying the
//!     spreadsheet.
//!
//! 2.  **Validation**: `schedule_batch` stores the upload, checks that the
//!     referenced template exists and belongs to the caller, and parses the
//!     dataset. Any failure here rejects the request synchronously, removes
//!     the uploaded file again, and no batch record is created.
//!
//! 3.  **Acceptance**: A batch row is inserted with status `pending` and
//!     the handler answers `202 Accepted` with the batch id. From this
//!     point on, outcomes are visible only through the polling endpoints.
//!
//! 4.  **Background Processing**: `spawn_batch_run` starts a Tokio task
//!     that runs `run_batch_blocking` on the blocking thread pool. A
//!     per-run MPSC listener forwards the worker's `BatchUpdate`s to the
//!     central progress updater, which persists them.
//!
//! 5.  **Row Loop**: For each row the worker resolves the recipient name
//!     and placeholder values, fills the native document, converts it to
//!     PDF through the external engine, drops the intermediate, and emits
//!     a certificate record. A failing row is recorded as a failed
//!     certificate and the loop moves on — one bad row never aborts the
//!     batch. Rows run strictly sequentially: the conversion engine is a
//!     shared external process, and the progress counters must advance in
//!     row order.
//!
//! 6.  **Archive**: After the last row the surviving PDFs are packed into
//!     `certificates_batch_{batch_id}.zip` and the batch completes. An
//!     error escaping the row loop instead fails the batch and cleans up
//!     its working directory and the uploaded dataset file.

use crate::auth::{self, Identity};
use crate::config::AppConfig;
use crate::db;
use crate::job_controller::state::{BatchEvent, BatchUpdate, ProgressState};
use crate::pipeline::convert::DocumentConverter;
use crate::pipeline::dataset::{self, Dataset};
use crate::pipeline::{archive, filename, filler, mapper};
use crate::services::multipart::read_upload_form;
use actix_multipart::Multipart;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use chrono::Utc;
use common::model::batch::{Batch, BatchStatus};
use common::model::certificate::{Certificate, CertificateStatus};
use common::model::template::Template;
use common::requests::GenerateRequest;
use log::{info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Spreadsheet formats accepted for the dataset upload.
const DATASET_EXTENSIONS: &[&str] = &["csv", "xlsx", "xlsm", "xls", "ods"];

enum ScheduleError {
    Invalid(String),
    NotFound(String),
    Forbidden,
    Internal(String),
}

/// The Actix web handler for `POST /api/batches/generate`.
///
/// On success the response carries the batch id; the caller polls the
/// status endpoint for everything that happens afterwards.
pub(crate) async fn process(
    req: HttpRequest,
    config: web::Data<AppConfig>,
    progress: web::Data<ProgressState>,
    converter: web::Data<Arc<dyn DocumentConverter>>,
    payload: Multipart,
) -> Result<HttpResponse, Error> {
    let identity = auth::identify(&req)?;
    let scheduled = schedule_batch(
        identity,
        &config,
        &progress,
        converter.get_ref().clone(),
        payload,
    )
    .await;

    Ok(match scheduled {
        Ok(batch_id) => HttpResponse::Accepted().json(serde_json::json!({
            "message": "Certificate generation started. Poll the batch status for updates.",
            "batch_id": batch_id,
        })),
        Err(ScheduleError::Invalid(message)) => HttpResponse::BadRequest().body(message),
        Err(ScheduleError::NotFound(message)) => HttpResponse::NotFound().body(message),
        Err(ScheduleError::Forbidden) => HttpResponse::Forbidden().body("Access denied"),
        Err(ScheduleError::Internal(message)) => {
            HttpResponse::InternalServerError().body(message)
        }
    })
}

/// Validate the request, create the batch record and hand off to the
/// background run. Every early return removes the uploaded dataset file.
async fn schedule_batch(
    identity: Identity,
    config: &AppConfig,
    progress: &ProgressState,
    converter: Arc<dyn DocumentConverter>,
    payload: Multipart,
) -> Result<String, ScheduleError> {
    let batch_id = Uuid::new_v4().to_string();
    let form = read_upload_form::<GenerateRequest>(
        payload,
        &config.datasets_dir(),
        &batch_id,
        DATASET_EXTENSIONS,
    )
    .await
    .map_err(ScheduleError::Invalid)?;
    let dataset_path = form.file_path;
    let request = form.meta;

    let conn = match db::open(config) {
        Ok(conn) => conn,
        Err(e) => {
            let _ = fs::remove_file(&dataset_path);
            return Err(ScheduleError::Internal(e.to_string()));
        }
    };

    let template = match db::templates::get(&conn, &request.template_id) {
        Ok(Some(template)) => template,
        Ok(None) => {
            let _ = fs::remove_file(&dataset_path);
            return Err(ScheduleError::NotFound(
                "Selected template not found".to_string(),
            ));
        }
        Err(e) => {
            let _ = fs::remove_file(&dataset_path);
            return Err(ScheduleError::Internal(e.to_string()));
        }
    };
    if template.owner_id != identity.0 {
        let _ = fs::remove_file(&dataset_path);
        return Err(ScheduleError::Forbidden);
    }

    let dataset = match dataset::load_dataset(&dataset_path) {
        Ok(dataset) => dataset,
        Err(e) => {
            let _ = fs::remove_file(&dataset_path);
            return Err(ScheduleError::Invalid(e.to_string()));
        }
    };

    let now = Utc::now();
    let batch = Batch {
        id: batch_id.clone(),
        owner_id: identity.0.clone(),
        template_id: template.id.clone(),
        name: request
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| template.name.clone()),
        status: BatchStatus::Pending,
        total_certificates: dataset.rows.len() as u32,
        processed_certificates: 0,
        generated_certificates: 0,
        mappings: request.mappings.clone(),
        zip_path: None,
        error: None,
        created_at: now,
        updated_at: now,
    };
    if let Err(e) = db::batches::insert(&conn, &batch) {
        let _ = fs::remove_file(&dataset_path);
        return Err(ScheduleError::Internal(e.to_string()));
    }

    info!(
        "Batch {}: starting generation of {} certificates",
        batch_id,
        dataset.rows.len()
    );
    spawn_batch_run(
        config.clone(),
        progress.clone(),
        converter,
        batch_id.clone(),
        identity.0,
        template,
        dataset,
        request.mappings,
        dataset_path,
    );

    Ok(batch_id)
}

/// Launch the background run for an accepted batch.
///
/// The spawned task owns the whole lifecycle: it relays worker updates to
/// the central progress writer while the blocking row loop runs, then
/// finalizes the batch as completed or failed.
#[allow(clippy::too_many_arguments)]
pub fn spawn_batch_run(
    config: AppConfig,
    progress: ProgressState,
    converter: Arc<dyn DocumentConverter>,
    batch_id: String,
    owner_id: String,
    template: Template,
    dataset: Dataset,
    mappings: HashMap<String, String>,
    dataset_path: PathBuf,
) {
    tokio::spawn(async move {
        // Dedicated channel for this run; the listener forwards worker
        // updates to the central progress writer.
        let (run_tx, mut run_rx) = mpsc::channel::<BatchUpdate>(100);

        let forward_tx = progress.tx.clone();
        let listener_batch_id = batch_id.clone();
        let listener = tokio::spawn(async move {
            while let Some(update) = run_rx.recv().await {
                let _ = forward_tx
                    .send(BatchEvent {
                        batch_id: listener_batch_id.clone(),
                        update,
                    })
                    .await;
            }
        });

        let worker_config = config.clone();
        let worker_batch_id = batch_id.clone();
        let handle = tokio::task::spawn_blocking(move || {
            run_batch_blocking(
                run_tx,
                &worker_config,
                converter.as_ref(),
                &worker_batch_id,
                &owner_id,
                &template,
                &dataset,
                &mappings,
            )
        });

        let outcome = handle.await;
        // The worker dropped its sender when it returned; wait for the
        // listener to drain the remaining row events before finalizing so
        // the terminal update cannot overtake them.
        let _ = listener.await;

        let final_update = match outcome {
            Ok(Ok(zip_path)) => {
                info!("Batch {}: all certificates processed and zipped", batch_id);
                BatchUpdate::Completed { zip_path }
            }
            Ok(Err(error)) => {
                warn!("Batch {} failed: {}", batch_id, error);
                cleanup_failed_run(&config, &batch_id, &dataset_path);
                BatchUpdate::Failed { error }
            }
            Err(join_error) => {
                let error = format!("Batch worker crashed: {}", join_error);
                warn!("Batch {} failed: {}", batch_id, error);
                cleanup_failed_run(&config, &batch_id, &dataset_path);
                BatchUpdate::Failed { error }
            }
        };
        let _ = progress
            .tx
            .send(BatchEvent {
                batch_id,
                update: final_update,
            })
            .await;
    });
}

/// The synchronous batch run, executed on a blocking worker thread.
///
/// Row failures are absorbed and recorded as failed certificates; only
/// infrastructure errors escape as `Err` and fail the whole batch.
/// Returns the archive path on success.
#[allow(clippy::too_many_arguments)]
fn run_batch_blocking(
    tx: mpsc::Sender<BatchUpdate>,
    config: &AppConfig,
    converter: &dyn DocumentConverter,
    batch_id: &str,
    owner_id: &str,
    template: &Template,
    dataset: &Dataset,
    mappings: &HashMap<String, String>,
) -> Result<String, String> {
    let _ = tx.blocking_send(BatchUpdate::Started);

    let template_path = PathBuf::from(&template.file_path);
    if !template_path.exists() {
        return Err(format!(
            "Template file {} is missing",
            template_path.display()
        ));
    }
    let batch_dir = config.batch_dir(batch_id);
    fs::create_dir_all(&batch_dir)
        .map_err(|e| format!("Failed to create batch directory: {}", e))?;

    let mut generated: Vec<PathBuf> = Vec::new();
    for (i, row) in dataset.rows.iter().enumerate() {
        let recipient = mapper::recipient_name(row, mappings, &dataset.headers, i);
        let stem = filename::row_file_stem(&recipient, i);
        let native_path = batch_dir.join(format!("{}.{}", stem, template.template_type.extension()));
        let pdf_path = batch_dir.join(format!("{}.pdf", stem));

        let outcome = generate_row(
            converter,
            &template_path,
            row,
            mappings,
            &native_path,
            &pdf_path,
        );

        // A certificate record is emitted whether the attempt succeeded
        // or failed; failures are absorbed and the loop continues.
        let certificate = match outcome {
            Ok(()) => {
                generated.push(pdf_path.clone());
                info!(
                    "Batch {}: generated certificate for {} ({}/{})",
                    batch_id,
                    recipient,
                    i + 1,
                    dataset.rows.len()
                );
                Certificate {
                    id: Uuid::new_v4().to_string(),
                    owner_id: owner_id.to_string(),
                    batch_id: batch_id.to_string(),
                    recipient_name: recipient,
                    row_data: row.clone(),
                    status: CertificateStatus::Generated,
                    pdf_path: Some(pdf_path.to_string_lossy().into_owned()),
                    error: None,
                    created_at: Utc::now(),
                }
            }
            Err(error) => {
                warn!("Batch {}: row {} failed: {}", batch_id, i + 1, error);
                Certificate {
                    id: Uuid::new_v4().to_string(),
                    owner_id: owner_id.to_string(),
                    batch_id: batch_id.to_string(),
                    recipient_name: recipient,
                    row_data: row.clone(),
                    status: CertificateStatus::Failed,
                    pdf_path: None,
                    error: Some(error),
                    created_at: Utc::now(),
                }
            }
        };

        let _ = tx.blocking_send(BatchUpdate::Row {
            certificate,
            processed: (i + 1) as u32,
            generated: generated.len() as u32,
        });
    }

    let zip_path = batch_dir.join(format!("certificates_batch_{}.zip", batch_id));
    let added = archive::build_archive(&generated, &zip_path)
        .map_err(|e| format!("Failed to build archive: {}", e))?;
    info!("Batch {}: archived {} certificates", batch_id, added);

    Ok(zip_path.to_string_lossy().into_owned())
}

/// Produce one certificate: fill the native document, convert it to PDF,
/// then drop the intermediate.
fn generate_row(
    converter: &dyn DocumentConverter,
    template_path: &Path,
    row: &HashMap<String, String>,
    mappings: &HashMap<String, String>,
    native_path: &Path,
    pdf_path: &Path,
) -> Result<(), String> {
    let fields = mapper::resolve_fields(row, mappings);
    filler::fill_document(template_path, &fields, native_path).map_err(|e| e.to_string())?;
    converter
        .convert(native_path, pdf_path)
        .map_err(|e| e.to_string())?;
    fs::remove_file(native_path).map_err(|e| e.to_string())?;
    Ok(())
}

/// Best-effort removal of a failed run's traces: the batch working
/// directory and the uploaded dataset file.
fn cleanup_failed_run(config: &AppConfig, batch_id: &str, dataset_path: &Path) {
    let batch_dir = config.batch_dir(batch_id);
    if batch_dir.exists() {
        if let Err(e) = fs::remove_dir_all(&batch_dir) {
            warn!(
                "Could not remove working directory {}: {}",
                batch_dir.display(),
                e
            );
        }
    }
    if dataset_path.exists() {
        if let Err(e) = fs::remove_file(dataset_path) {
            warn!(
                "Could not remove uploaded dataset {}: {}",
                dataset_path.display(),
                e
            );
        }
    }
}
