//! Per-certificate retrieval: stream one generated PDF either inline
//! (`/view`) or as an attachment (`/download`).

mod fetch;

use actix_web::{web, Scope};

const API_PATH: &str = "/api/certificates";

/// Configures and returns the Actix `Scope` for certificate routes.
pub fn configure_routes() -> Scope {
    web::scope(API_PATH)
        .route("/{certificate_id}/download", web::get().to(fetch::download))
        .route("/{certificate_id}/view", web::get().to(fetch::view))
}
