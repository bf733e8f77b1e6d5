use crate::auth;
use crate::config::AppConfig;
use crate::db;
use actix_web::error::ErrorInternalServerError;
use actix_web::{web, Error, HttpRequest, HttpResponse};

pub(crate) async fn process(
    req: HttpRequest,
    config: web::Data<AppConfig>,
    template_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let identity = auth::identify(&req)?;
    let conn = db::open(&config).map_err(ErrorInternalServerError)?;
    let template =
        db::templates::get(&conn, &template_id).map_err(ErrorInternalServerError)?;

    Ok(match template {
        None => HttpResponse::NotFound().body("Template not found"),
        Some(template) if template.owner_id != identity.0 => {
            HttpResponse::Forbidden().body("Access denied")
        }
        Some(template) => HttpResponse::Ok().json(template),
    })
}
