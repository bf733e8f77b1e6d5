use crate::auth;
use crate::config::AppConfig;
use crate::db;
use actix_web::error::ErrorInternalServerError;
use actix_web::{web, Error, HttpRequest, HttpResponse};

pub(crate) async fn process(
    req: HttpRequest,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, Error> {
    let identity = auth::identify(&req)?;
    let conn = db::open(&config).map_err(ErrorInternalServerError)?;
    let templates =
        db::templates::list_for_owner(&conn, &identity.0).map_err(ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(templates))
}
