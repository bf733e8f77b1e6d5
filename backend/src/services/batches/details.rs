use crate::auth;
use crate::config::AppConfig;
use crate::db;
use actix_web::error::ErrorInternalServerError;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use common::jobs::{BatchDetails, CertificateSummary};
use common::model::batch::BatchStatus;
use std::path::Path;

/// Full batch view: metadata, template name and one summary per
/// certificate, plus whether the archive is ready to download.
pub(crate) async fn process(
    req: HttpRequest,
    config: web::Data<AppConfig>,
    batch_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let identity = auth::identify(&req)?;
    let conn = db::open(&config).map_err(ErrorInternalServerError)?;
    let batch = db::batches::get(&conn, &batch_id).map_err(ErrorInternalServerError)?;

    let batch = match batch {
        None => return Ok(HttpResponse::NotFound().body("Batch not found")),
        Some(batch) if batch.owner_id != identity.0 => {
            return Ok(HttpResponse::Forbidden().body("Access denied"))
        }
        Some(batch) => batch,
    };

    let template_name = db::templates::get(&conn, &batch.template_id)
        .map_err(ErrorInternalServerError)?
        .map(|template| template.name)
        .unwrap_or_else(|| "Unknown template".to_string());

    let certificates = db::certificates::list_for_batch(&conn, &batch.id)
        .map_err(ErrorInternalServerError)?
        .into_iter()
        .map(|certificate| CertificateSummary {
            id: certificate.id,
            recipient_name: certificate.recipient_name,
            status: certificate.status,
            error: certificate.error,
        })
        .collect();

    let archive_available = batch.status == BatchStatus::Completed
        && batch
            .zip_path
            .as_deref()
            .map(|path| Path::new(path).exists())
            .unwrap_or(false);

    Ok(HttpResponse::Ok().json(BatchDetails {
        id: batch.id,
        name: batch.name,
        template_name,
        status: batch.status,
        processed: batch.processed_certificates,
        generated: batch.generated_certificates,
        total: batch.total_certificates,
        archive_available,
        error: batch.error,
        certificates,
        created_at: batch.created_at,
        updated_at: batch.updated_at,
    }))
}
