use crate::auth;
use crate::config::AppConfig;
use crate::db;
use actix_web::error::ErrorInternalServerError;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use log::warn;
use std::fs;
use std::io::ErrorKind;

pub(crate) async fn process(
    req: HttpRequest,
    config: web::Data<AppConfig>,
    template_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let identity = auth::identify(&req)?;
    let conn = db::open(&config).map_err(ErrorInternalServerError)?;
    let template =
        db::templates::get(&conn, &template_id).map_err(ErrorInternalServerError)?;

    let template = match template {
        None => return Ok(HttpResponse::NotFound().body("Template not found")),
        Some(template) if template.owner_id != identity.0 => {
            return Ok(HttpResponse::Forbidden().body("Access denied"))
        }
        Some(template) => template,
    };

    // The record goes regardless of what happens to the file; a template
    // whose backing file already vanished must still be deletable.
    if let Err(e) = fs::remove_file(&template.file_path) {
        if e.kind() != ErrorKind::NotFound {
            warn!(
                "Could not delete template file {}: {}",
                template.file_path, e
            );
        }
    }
    db::templates::delete(&conn, &template.id).map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Template deleted" })))
}
