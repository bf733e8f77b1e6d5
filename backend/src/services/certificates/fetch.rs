use crate::auth;
use crate::config::AppConfig;
use crate::db;
use actix_files::NamedFile;
use actix_web::error::ErrorInternalServerError;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use common::model::certificate::CertificateStatus;
use std::path::Path;

pub(crate) async fn download(
    req: HttpRequest,
    config: web::Data<AppConfig>,
    certificate_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    serve(req, config, &certificate_id, DispositionType::Attachment).await
}

pub(crate) async fn view(
    req: HttpRequest,
    config: web::Data<AppConfig>,
    certificate_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    serve(req, config, &certificate_id, DispositionType::Inline).await
}

async fn serve(
    req: HttpRequest,
    config: web::Data<AppConfig>,
    certificate_id: &str,
    disposition: DispositionType,
) -> Result<HttpResponse, Error> {
    let identity = auth::identify(&req)?;
    let conn = db::open(&config).map_err(ErrorInternalServerError)?;
    let certificate =
        db::certificates::get(&conn, certificate_id).map_err(ErrorInternalServerError)?;

    let certificate = match certificate {
        None => return Ok(HttpResponse::NotFound().body("Certificate not found")),
        Some(certificate) if certificate.owner_id != identity.0 => {
            return Ok(HttpResponse::Forbidden().body("Access denied"))
        }
        Some(certificate) => certificate,
    };

    let pdf_path = match (&certificate.status, &certificate.pdf_path) {
        (CertificateStatus::Generated, Some(path)) => path.clone(),
        _ => return Ok(HttpResponse::BadRequest().body("Certificate is not available")),
    };
    if !Path::new(&pdf_path).exists() {
        return Ok(HttpResponse::NotFound().body("Certificate file not found on server"));
    }

    let file = NamedFile::open(&pdf_path).map_err(ErrorInternalServerError)?;
    Ok(file
        .set_content_disposition(ContentDisposition {
            disposition,
            parameters: vec![DispositionParam::Filename(format!(
                "{}.pdf",
                certificate.recipient_name
            ))],
        })
        .into_response(&req))
}
