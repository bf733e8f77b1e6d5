use crate::auth;
use crate::config::AppConfig;
use crate::db;
use actix_web::error::ErrorInternalServerError;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use common::jobs::BatchProgress;

/// Polling endpoint: current status plus the progress counters.
pub(crate) async fn process(
    req: HttpRequest,
    config: web::Data<AppConfig>,
    batch_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let identity = auth::identify(&req)?;
    let conn = db::open(&config).map_err(ErrorInternalServerError)?;
    let batch = db::batches::get(&conn, &batch_id).map_err(ErrorInternalServerError)?;

    Ok(match batch {
        None => HttpResponse::NotFound().body("Batch not found"),
        Some(batch) if batch.owner_id != identity.0 => {
            HttpResponse::Forbidden().body("Access denied")
        }
        Some(batch) => HttpResponse::Ok().json(BatchProgress {
            status: batch.status,
            processed: batch.processed_certificates,
            generated: batch.generated_certificates,
            total: batch.total_certificates,
        }),
    })
}
