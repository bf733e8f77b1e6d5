use crate::auth;
use crate::config::AppConfig;
use crate::db;
use actix_files::NamedFile;
use actix_web::error::ErrorInternalServerError;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use common::model::batch::BatchStatus;
use std::path::Path;

/// Stream the finished archive of a completed batch.
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

    let zip_path = match (&batch.status, &batch.zip_path) {
        (BatchStatus::Completed, Some(path)) => path.clone(),
        _ => {
            return Ok(HttpResponse::BadRequest()
                .body("Batch is not yet completed or its archive is not available"))
        }
    };
    if !Path::new(&zip_path).exists() {
        return Ok(HttpResponse::NotFound().body("Archive file not found on server"));
    }

    let file = NamedFile::open(&zip_path).map_err(ErrorInternalServerError)?;
    Ok(file
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(format!(
                "certificates_batch_{}.zip",
                batch.id
            ))],
        })
        .into_response(&req))
}
